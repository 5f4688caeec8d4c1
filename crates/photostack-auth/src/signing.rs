//! Signature Version 4 key derivation and signing.

use std::fmt;

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::canonical::CanonicalRequest;
use crate::error::AuthError;

/// The only algorithm presigned URLs may use.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

const TERMINATOR: &str = "aws4_request";

type HmacSha256 = Hmac<Sha256>;

/// `date/region/service/aws4_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// `YYYYMMDD`.
    pub date: String,
    /// Signing region.
    pub region: String,
    /// Signing service.
    pub service: String,
}

impl CredentialScope {
    /// Split an `X-Amz-Credential` value into its access key and scope.
    pub fn parse_credential(credential: &str) -> Result<(&str, Self), AuthError> {
        let parts: Vec<&str> = credential.split('/').collect();
        match parts.as_slice() {
            [access_key, date, region, service, TERMINATOR]
                if !access_key.is_empty() && date.len() == 8 =>
            {
                Ok((
                    *access_key,
                    Self {
                        date: (*date).to_owned(),
                        region: (*region).to_owned(),
                        service: (*service).to_owned(),
                    },
                ))
            }
            _ => Err(AuthError::MalformedQuery(format!(
                "X-Amz-Credential {credential:?}"
            ))),
        }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{TERMINATOR}", self.date, self.region, self.service)
    }
}

/// The key derived from a secret for one credential scope.
pub struct SigningKey(Vec<u8>);

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

impl SigningKey {
    /// `HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`.
    #[must_use]
    pub fn derive(secret: &str, scope: &CredentialScope) -> Self {
        let key = hmac(format!("AWS4{secret}").as_bytes(), scope.date.as_bytes());
        let key = hmac(&key, scope.region.as_bytes());
        let key = hmac(&key, scope.service.as_bytes());
        Self(hmac(&key, TERMINATOR.as_bytes()))
    }

    /// Hex signature of `request` made at `timestamp` within `scope`.
    #[must_use]
    pub fn sign(&self, timestamp: &str, scope: &CredentialScope, request: &CanonicalRequest) -> String {
        let string_to_sign = format!("{ALGORITHM}\n{timestamp}\n{scope}\n{}", request.digest());
        hex::encode(hmac(&self.0, string_to_sign.as_bytes()))
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(date: &str) -> CredentialScope {
        CredentialScope {
            date: date.to_owned(),
            region: "us-east-1".to_owned(),
            service: "s3".to_owned(),
        }
    }

    #[test]
    fn test_should_parse_credential() {
        let (key, parsed) =
            CredentialScope::parse_credential("AKID/20240101/eu-west-1/s3/aws4_request").unwrap();
        assert_eq!(key, "AKID");
        assert_eq!(parsed.region, "eu-west-1");
        assert_eq!(parsed.to_string(), "20240101/eu-west-1/s3/aws4_request");
    }

    #[test]
    fn test_should_reject_malformed_credential() {
        for credential in [
            "AKID/20240101/us-east-1/s3",
            "AKID/20240101/us-east-1/s3/aws5_request",
            "/20240101/us-east-1/s3/aws4_request",
            "AKID/2024/us-east-1/s3/aws4_request",
        ] {
            assert!(
                CredentialScope::parse_credential(credential).is_err(),
                "{credential}"
            );
        }
    }

    #[test]
    fn test_should_sign_differently_per_day() {
        let request = CanonicalRequest::new("GET", "/a", [], "localhost");
        let a = SigningKey::derive("secret", &scope("20240101"));
        let b = SigningKey::derive("secret", &scope("20240102"));
        let sig_a = a.sign("20240101T000000Z", &scope("20240101"), &request);
        let sig_b = b.sign("20240101T000000Z", &scope("20240101"), &request);
        assert_eq!(sig_a.len(), 64);
        assert_ne!(sig_a, sig_b);
    }
}
