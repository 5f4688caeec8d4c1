//! End-to-end tests for PhotoStack.
//!
//! Every test deploys the gallery stack into a fresh in-process local cloud,
//! serves it on an ephemeral port, and talks to it over real HTTP, the same
//! way the carousel page does in a browser.
//!
//! Run them with:
//! ```text
//! cargo test -p photostack-integration
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use photostack_core::StackConfig;
use photostack_local::{LocalCloud, LocalGateway, serve};
use photostack_stack::topology::exports;
use photostack_stack::{Deployed, Stack, StackOutputs, photo_stack};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Markup uploaded as the site bundle of every test stack.
pub const SITE_INDEX: &str = "<html><body>gallery</body></html>";

/// A deployed gallery stack served over HTTP.
///
/// The gateway stops when this value is dropped.
#[derive(Debug)]
pub struct TestStack {
    /// The cloud holding the provisioned resources.
    pub cloud: Arc<LocalCloud>,
    /// The declared stack.
    pub stack: Stack,
    /// Physical outputs of the apply.
    pub deployed: Deployed,
    /// Resolved exports.
    pub outputs: StackOutputs,
    /// Address the gateway listens on.
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
    _dir: TempDir,
}

impl TestStack {
    /// Deploy a stack whose photo directory holds `photos` and serve it.
    pub async fn spawn(photos: &[(&str, &[u8])]) -> Result<Self> {
        init_tracing();

        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let photos_dir = dir.path().join("photos");
        let site_dir = dir.path().join("site");
        write_files(&photos_dir, photos)?;
        write_files(&site_dir, &[("index.html", SITE_INDEX.as_bytes())])?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let config = StackConfig::builder()
            .photos_dir(photos_dir)
            .site_dir(site_dir)
            .gateway_listen(addr.to_string())
            .public_endpoint(format!("http://{addr}"))
            .build();

        let cloud = Arc::new(LocalCloud::new(config));
        let stack = photo_stack(cloud.config()).context("invalid stack configuration")?;
        let deployed = stack
            .apply(cloud.as_ref())
            .await
            .context("failed to provision stack")?;
        let outputs = stack.finalize_outputs(&deployed)?;

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, LocalGateway::new(Arc::clone(&cloud)), async {
            rx.await.ok();
        }));
        info!(%addr, "test stack ready");

        Ok(Self {
            cloud,
            stack,
            deployed,
            outputs,
            addr,
            shutdown: Some(tx),
            server: Some(server),
            _dir: dir,
        })
    }

    /// A resolved export.
    pub fn output(&self, name: &str) -> Result<&str> {
        self.outputs
            .get(name)
            .map(String::as_str)
            .with_context(|| format!("stack has no export named {name}"))
    }

    /// Absolute URL of the photo listing route.
    pub fn photos_url(&self) -> Result<String> {
        Ok(format!("{}getAllPhotos", self.output(exports::API_ENDPOINT)?))
    }

    /// Absolute URL of a gateway path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Stop the gateway and wait for in-flight connections to drain.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(server) = self.server.take() {
            server.await.context("gateway task panicked")?;
        }
        Ok(())
    }
}

impl Drop for TestStack {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}

fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (name, data) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// An HTTP client for talking to the gateway.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

mod test_api;
mod test_site;
mod test_sync;
