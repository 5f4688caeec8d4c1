//! The carousel model.

use std::time::Duration;

use askama::Template;
use photostack_core::PhotoRecord;
use tracing::{info, warn};

use crate::config::DEFAULT_INTERVAL;
use crate::error::WebError;
use crate::feed::PhotoFeed;

/// One slide: an image and its caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Image source.
    pub image_url: String,
    /// Caption, the photo's file name.
    pub caption: String,
}

impl From<PhotoRecord> for Slide {
    fn from(record: PhotoRecord) -> Self {
        Self {
            image_url: record.url,
            caption: record.filename,
        }
    }
}

/// An auto-advancing carousel over a fixed slide list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    slides: Vec<Slide>,
    interval: Duration,
}

impl Default for Carousel {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_INTERVAL)
    }
}

impl Carousel {
    /// Build from slides.
    #[must_use]
    pub fn new(slides: Vec<Slide>, interval: Duration) -> Self {
        Self { slides, interval }
    }

    /// One slide per record, in record order.
    #[must_use]
    pub fn from_records(records: Vec<PhotoRecord>, interval: Duration) -> Self {
        Self::new(records.into_iter().map(Slide::from).collect(), interval)
    }

    /// Fetch once from `feed`. A failed fetch yields an empty carousel.
    pub async fn load(feed: &dyn PhotoFeed, interval: Duration) -> Self {
        match feed.fetch().await {
            Ok(records) => {
                if records.is_empty() {
                    warn!("photo feed returned no photos");
                } else {
                    info!(count = records.len(), "loaded photos");
                }
                Self::from_records(records, interval)
            }
            Err(e) => {
                warn!(error = %e, "failed to load photos");
                Self::new(Vec::new(), interval)
            }
        }
    }

    /// The slides.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Time each slide stays up.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The slide showing `elapsed` after load, wrapping around.
    #[must_use]
    pub fn slide_at(&self, elapsed: Duration) -> Option<&Slide> {
        if self.slides.is_empty() {
            return None;
        }
        let interval = self.interval.as_millis().max(1);
        let step = elapsed.as_millis() / interval;
        let index = usize::try_from(step % self.slides.len() as u128).unwrap_or(0);
        self.slides.get(index)
    }

    /// Render the carousel markup. The first slide starts active.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if rendering fails.
    pub fn render_html(&self) -> Result<String, WebError> {
        let markup = CarouselTemplate {
            slides: &self.slides,
            interval_ms: self.interval.as_millis(),
        };
        Ok(markup.render()?)
    }
}

#[derive(Template)]
#[template(path = "carousel.html")]
struct CarouselTemplate<'a> {
    slides: &'a [Slide],
    interval_ms: u128,
}
