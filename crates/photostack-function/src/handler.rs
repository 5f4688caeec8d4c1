//! The `getPhotos` handler.

use http::StatusCode;
use photostack_core::PhotoRecord;
use tracing::{info, warn};

use crate::env::FunctionEnv;
use crate::error::FunctionError;
use crate::response::ApiGatewayResponse;
use crate::source::PhotoSource;

/// List every photo in `bucket` with a fetchable URL, in listing order.
///
/// Folder placeholder keys (ending in `/`) are not photos and are skipped.
/// Any key whose URL cannot be produced fails the whole listing.
pub async fn get_photos(
    bucket: &str,
    source: &dyn PhotoSource,
) -> Result<Vec<PhotoRecord>, FunctionError> {
    let keys = source.list_keys(bucket).await?;
    let mut records = Vec::with_capacity(keys.len());
    for key in keys.iter().filter(|k| !k.ends_with('/')) {
        let url = source.object_url(bucket, key).await?;
        records.push(PhotoRecord::from_key(key, url));
    }
    info!(bucket, count = records.len(), "listed photos");
    Ok(records)
}

/// Run one invocation end to end and shape the proxy response.
pub async fn handle(
    env: Result<FunctionEnv, FunctionError>,
    source: &dyn PhotoSource,
) -> ApiGatewayResponse {
    let result = match env {
        Ok(env) => get_photos(&env.bucket, source).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(records) => ApiGatewayResponse::json(StatusCode::OK, &records),
        Err(e) => {
            warn!(error = %e, "getPhotos failed");
            ApiGatewayResponse::from_error(&e)
        }
    }
}
