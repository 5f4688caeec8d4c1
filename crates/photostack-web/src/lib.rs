//! Presentation layer for PhotoStack.
//!
//! The page fetches the photo list once from the configured API and shows it
//! as a carousel that advances every [`SiteConfig::interval`]. A failed fetch
//! leaves the carousel empty and logs a warning.

pub mod bundle;
pub mod carousel;
pub mod config;
pub mod error;
pub mod feed;

pub use bundle::{SiteBundle, render_index};
pub use carousel::{Carousel, Slide};
pub use config::SiteConfig;
pub use error::WebError;
pub use feed::{HttpPhotoFeed, PhotoFeed};
