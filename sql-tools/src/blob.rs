//! Signed blob URL resolution.

use serde_json::Value;

use common::errors::{AppError, AppResult};
use common::models::{BlobUrlRequest, BlobUrlResponse};

use crate::transport::JsonEndpoint;

/// Plugin endpoint that signs blob URLs.
pub const BLOB_URL_ENDPOINT: &str = "get_blob_url";

/// Resolves a blob prefix to a signed, time-limited download URL.
pub async fn resolve_blob_url(endpoint: &dyn JsonEndpoint, blob_name: &str) -> AppResult<String> {
    let blob_name = blob_name.trim();
    if blob_name.is_empty() {
        return Err(AppError::MissingArgument("blobName".into()));
    }
    tracing::info!(blob = blob_name, "Resolving blob URL");

    let body = serde_json::to_value(BlobUrlRequest {
        blob_name: blob_name.to_string(),
    })?;
    let response = endpoint.post_json(BLOB_URL_ENDPOINT, body).await?;
    parse_blob_url(response)
}

fn parse_blob_url(response: Value) -> AppResult<String> {
    serde_json::from_value::<BlobUrlResponse>(response)
        .map(|r| r.blob_url)
        .map_err(|e| AppError::MalformedResponse(format!("blob_url missing from response: {e}")))
}
