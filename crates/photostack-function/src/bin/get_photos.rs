//! Lambda entry point for `getPhotos`.

use std::time::Duration;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use photostack_function::{ApiGatewayResponse, FunctionEnv, S3PhotoSource, handle};
use tracing_subscriber::EnvFilter;

/// Validity of the presigned photo URLs.
const URL_EXPIRY: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();

    let source = S3PhotoSource::from_env(URL_EXPIRY).await;
    let source = &source;
    lambda_runtime::run(service_fn(
        move |_event: LambdaEvent<serde_json::Value>| async move {
            Ok::<ApiGatewayResponse, Error>(handle(FunctionEnv::from_env(), source).await)
        },
    ))
    .await
}
