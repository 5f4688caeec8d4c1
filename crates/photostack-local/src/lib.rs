//! A local cloud for PhotoStack.
//!
//! [`LocalCloud`] implements [`photostack_stack::ProvisioningBackend`]:
//! applying a stack against it creates buckets, roles, functions, HTTP APIs,
//! and CDN distributions in memory. [`LocalGateway`] serves what was created
//! over HTTP so that the site, the photo API, and the presigned photo URLs
//! can be fetched from a browser.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use photostack_core::StackConfig;
//! use photostack_local::{LocalCloud, LocalGateway, serve};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StackConfig::from_env()?;
//! let stack = photostack_stack::photo_stack(&config)?;
//! let cloud = Arc::new(LocalCloud::new(config.clone()));
//! stack.apply(cloud.as_ref()).await?;
//!
//! let listener = tokio::net::TcpListener::bind(&config.gateway_listen).await?;
//! serve(listener, LocalGateway::new(cloud), async {
//!     tokio::signal::ctrl_c().await.ok();
//! })
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod body;
pub mod cdn;
pub mod cloud;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod objects;
pub mod registry;
pub mod scoped;
pub mod server;
pub mod state;

pub use cloud::LocalCloud;
pub use error::{LocalError, LocalResult};
pub use gateway::LocalGateway;
pub use registry::{FunctionHandler, GetPhotosHandler, HandlerRegistry, InvocationContext};
pub use scoped::ScopedPhotoSource;
pub use server::serve;
pub use state::CloudState;
