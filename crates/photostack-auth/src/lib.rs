//! Presigned photo URLs.
//!
//! The listing function hands out presigned `GET` URLs so that the browser can
//! fetch photos from a bucket that is not publicly readable. [`Presigner`]
//! produces them (AWS Signature Version 4, query-string authentication) and
//! [`verify_presigned`] checks them against a [`Keyring`] when they come back.
//!
//! ```rust
//! use photostack_auth::{Keyring, Presigner, verify_presigned};
//!
//! let presigner = Presigner::new("AKID", "secret", "us-east-1", 300);
//! let url = presigner
//!     .presign_get("http://127.0.0.1:4566", "/s3/photos/a.jpg")
//!     .unwrap();
//!
//! let (parts, ()) = http::Request::builder()
//!     .uri(&url)
//!     .header("host", "127.0.0.1:4566")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//! let keyring = Keyring::new().with_key("AKID", "secret");
//! assert!(verify_presigned(&parts, &keyring).is_ok());
//! ```

pub mod canonical;
pub mod error;
pub mod keyring;
pub mod presigned;
pub mod signing;

pub use error::AuthError;
pub use keyring::Keyring;
pub use presigned::{PresignedQuery, Presigner, VerifiedRequest, verify_presigned};
