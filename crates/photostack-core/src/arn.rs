//! Amazon Resource Name construction.
//!
//! Only the handful of ARN shapes PhotoStack resources use are supported.
//! S3 ARNs carry neither region nor account.

use std::fmt;

use crate::types::{AccountId, AwsRegion};

/// A rendered Amazon Resource Name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Arn(String);

impl Arn {
    /// ARN of an S3 bucket (`arn:aws:s3:::<bucket>`).
    #[must_use]
    pub fn s3_bucket(bucket: &str) -> Self {
        Self(format!("arn:aws:s3:::{bucket}"))
    }

    /// ARN pattern covering every object in a bucket (`arn:aws:s3:::<bucket>/*`).
    #[must_use]
    pub fn s3_objects(bucket: &str) -> Self {
        Self(format!("arn:aws:s3:::{bucket}/*"))
    }

    /// ARN of a single S3 object.
    #[must_use]
    pub fn s3_object(bucket: &str, key: &str) -> Self {
        Self(format!("arn:aws:s3:::{bucket}/{key}"))
    }

    /// ARN of an IAM role.
    #[must_use]
    pub fn iam_role(account: &AccountId, name: &str) -> Self {
        Self(format!("arn:aws:iam::{account}:role/{name}"))
    }

    /// ARN of a Lambda function.
    #[must_use]
    pub fn lambda_function(region: &AwsRegion, account: &AccountId, name: &str) -> Self {
        Self(format!("arn:aws:lambda:{region}:{account}:function:{name}"))
    }

    /// Wrap an already-rendered ARN string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the ARN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `resource` is matched by this ARN, treating a trailing `*` as
    /// a prefix wildcard.
    #[must_use]
    pub fn matches(&self, resource: &str) -> bool {
        match self.0.strip_suffix('*') {
            Some(prefix) => resource.starts_with(prefix),
            None => self.0 == resource,
        }
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_s3_arns() {
        assert_eq!(Arn::s3_bucket("photos").as_str(), "arn:aws:s3:::photos");
        assert_eq!(Arn::s3_objects("photos").as_str(), "arn:aws:s3:::photos/*");
        assert_eq!(
            Arn::s3_object("photos", "a/b.jpg").as_str(),
            "arn:aws:s3:::photos/a/b.jpg"
        );
    }

    #[test]
    fn test_should_render_account_scoped_arns() {
        let account = AccountId::default();
        let region = AwsRegion::default();
        assert_eq!(
            Arn::lambda_function(&region, &account, "fn").as_str(),
            "arn:aws:lambda:us-east-1:000000000000:function:fn"
        );
        assert_eq!(
            Arn::iam_role(&account, "role").as_str(),
            "arn:aws:iam::000000000000:role/role"
        );
    }

    #[test]
    fn test_should_match_wildcard_suffix() {
        let pattern = Arn::s3_objects("photos");
        assert!(pattern.matches("arn:aws:s3:::photos/a.jpg"));
        assert!(!pattern.matches("arn:aws:s3:::photos"));
        assert!(!pattern.matches("arn:aws:s3:::photos-other/a.jpg"));

        let exact = Arn::s3_bucket("photos");
        assert!(exact.matches("arn:aws:s3:::photos"));
        assert!(!exact.matches("arn:aws:s3:::photos/a.jpg"));
    }
}
