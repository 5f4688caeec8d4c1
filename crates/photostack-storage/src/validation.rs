//! Bucket name and object key validation.
//!
//! Follows the
//! [Amazon S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html)
//! so that physical names generated for the local cloud would also be valid
//! against the real service.

use std::net::Ipv4Addr;

use crate::error::StorageError;

const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_BUCKET_NAME_LEN: usize = 63;
const MAX_KEY_BYTES: usize = 1024;

fn invalid(name: &str, reason: &str) -> StorageError {
    StorageError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Validate an S3 bucket name.
///
/// # Errors
///
/// Returns [`StorageError::InvalidBucketName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use photostack_storage::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("photostack-photobucket-1a2b3c4d").is_ok());
/// assert!(validate_bucket_name("PhotoBucket").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), StorageError> {
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(
            name,
            &format!(
                "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
            ),
        ));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            name,
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[len - 1]) {
        return Err(invalid(
            name,
            "Bucket name must start and end with a letter or number",
        ));
    }

    if name.contains("..") {
        return Err(invalid(name, "Bucket name must not contain consecutive dots"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid(
            name,
            "Bucket name must not be formatted as an IP address",
        ));
    }

    if name.starts_with("xn--") || name.starts_with("sthree-") {
        return Err(invalid(name, "Bucket name uses a reserved prefix"));
    }

    if name.ends_with("-s3alias") {
        return Err(invalid(name, "Bucket name uses a reserved suffix"));
    }

    Ok(())
}

/// Validate an object key: 1 to 1024 bytes.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] if the key is empty or too long.
pub fn validate_object_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidArgument {
            message: "Object key must not be empty".to_owned(),
        });
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(StorageError::InvalidArgument {
            message: format!("Object key exceeds {MAX_KEY_BYTES} bytes"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_accept_generated_bucket_names() {
        assert!(validate_bucket_name("photostack-websitebucket-0f1e2d3c").is_ok());
        assert!(validate_bucket_name("abc").is_ok());
        assert!(validate_bucket_name("my.bucket.name").is_ok());
    }

    #[test]
    fn test_should_reject_invalid_bucket_names() {
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name("Upper").is_err());
        assert!(validate_bucket_name("-leading").is_err());
        assert!(validate_bucket_name("trailing-").is_err());
        assert!(validate_bucket_name("a..b").is_err());
        assert!(validate_bucket_name("192.168.0.1").is_err());
        assert!(validate_bucket_name("xn--bucket").is_err());
        assert!(validate_bucket_name("bucket-s3alias").is_err());
    }

    #[test]
    fn test_should_validate_object_key_length() {
        assert!(validate_object_key("photos/a.jpg").is_ok());
        assert!(validate_object_key("").is_err());
        assert!(validate_object_key(&"k".repeat(1025)).is_err());
    }
}
