//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use photostack_core::StackConfig;
use photostack_local::{LocalCloud, LocalGateway, serve};
use photostack_stack::topology::exports;
use photostack_stack::{PlanStep, StackOutputs, photo_stack};
use photostack_web::{Carousel, HttpPhotoFeed, SiteBundle, SiteConfig};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

/// A stack applied to a fresh local cloud.
#[derive(Debug)]
pub struct Deployment {
    /// The cloud holding every provisioned resource.
    pub cloud: Arc<LocalCloud>,
    /// Resolved exports.
    pub outputs: StackOutputs,
}

impl Deployment {
    /// A resolved export.
    pub fn output(&self, name: &str) -> Result<&str> {
        self.outputs
            .get(name)
            .map(String::as_str)
            .with_context(|| format!("stack has no export named {name}"))
    }
}

/// The CloudFormation-style template of the gallery stack.
pub fn synth(config: &StackConfig) -> Result<Value> {
    let stack = photo_stack(config).context("invalid stack configuration")?;
    Ok(stack.synthesize())
}

/// The gallery stack's apply order.
pub fn plan(config: &StackConfig) -> Result<Vec<PlanStep>> {
    let stack = photo_stack(config).context("invalid stack configuration")?;
    Ok(stack.plan())
}

/// Apply the gallery stack to a new local cloud.
///
/// With `rebuild_site`, the site bundle is regenerated in `site_dir` against
/// the provisioned API endpoint and the deployments are re-synchronized.
pub async fn deploy(config: StackConfig, rebuild_site: bool) -> Result<Deployment> {
    let stack = photo_stack(&config).context("invalid stack configuration")?;
    let cloud = Arc::new(LocalCloud::new(config.clone()));
    let deployed = stack
        .apply(cloud.as_ref())
        .await
        .context("failed to provision stack")?;
    let outputs = stack
        .finalize_outputs(&deployed)
        .context("failed to resolve stack outputs")?;
    let deployment = Deployment { cloud, outputs };

    if rebuild_site {
        let site = SiteConfig::new(deployment.output(exports::API_ENDPOINT)?);
        SiteBundle::build(&site, &config.site_dir).context("failed to build site bundle")?;
        let reports = stack
            .deployment_manifest(&deployed)?
            .apply(deployment.cloud.store())
            .context("failed to re-synchronize deployments")?;
        let uploaded: usize = reports.iter().map(|r| r.uploaded.len()).sum();
        info!(uploaded, "site bundle redeployed");
    }

    Ok(deployment)
}

/// Deploy, print the exports, then serve the gateway until Ctrl-C.
pub async fn up(config: StackConfig, rebuild_site: bool) -> Result<()> {
    let listener = TcpListener::bind(&config.gateway_listen)
        .await
        .with_context(|| format!("failed to bind to {}", config.gateway_listen))?;
    let deployment = deploy(config, rebuild_site).await?;

    println!("{}", serde_json::to_string_pretty(&deployment.outputs)?);
    info!(
        addr = %listener.local_addr()?,
        website = deployment.output(exports::WEBSITE_URL)?,
        api = deployment.output(exports::API_ENDPOINT)?,
        "local cloud ready"
    );

    serve(listener, LocalGateway::new(deployment.cloud), async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    })
    .await;
    Ok(())
}

/// Write the static site bundle for `api_url` (or the compile-time default).
pub fn build_site(api_url: Option<&str>, out_dir: &Path, interval: Duration) -> Result<SiteBundle> {
    let site = SiteConfig::from_build_env(api_url)
        .context("no API URL: pass --api-url or set PHOTOSTACK_API_URL at build time")?
        .with_interval(interval);
    SiteBundle::build(&site, out_dir).context("failed to write site bundle")
}

/// Fetch the photo list once and render the carousel markup.
pub async fn preview(api_url: Option<&str>, interval: Duration) -> Result<String> {
    let site = SiteConfig::from_build_env(api_url)
        .context("no API URL: pass --api-url or set PHOTOSTACK_API_URL at build time")?
        .with_interval(interval);
    let feed = HttpPhotoFeed::new(site.photos_url());
    let carousel = Carousel::load(&feed, site.interval).await;
    info!(slides = carousel.len(), url = feed.url(), "rendered carousel");
    carousel.render_html().context("failed to render carousel")
}
