//! JSON envelope of the management endpoints.
//!
//! Tool listings, tool and command calls, settings and errors all answer
//! `{ success, data | error, meta }`. The plugin query endpoint is the one
//! exception: it answers with the bare row array the transports decode.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Envelope around every management response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    /// Payload of a successful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Failure description; `data` is absent when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    pub meta: ResponseMeta,
}

/// Error half of the envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Stable code, see `AppError::code`.
    pub code: String,
    pub message: String,
}

/// Bookkeeping attached to every envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Value of the `x-request-id` header the call ran under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Wall time spent in the handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            service: None,
            request_id: None,
            duration_ms: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::now(),
        }
    }

    /// Successful envelope tagged with the answering service.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        Self::ok(data).with_service(service)
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.meta.service = Some(service.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.meta.request_id = Some(request_id.into());
        self
    }

    /// Records the time elapsed since `started`.
    pub fn timed(mut self, started: Instant) -> Self {
        self.meta.duration_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        self
    }
}

impl ApiResponse<()> {
    /// Failure envelope.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            meta: ResponseMeta::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::err("TOOL_NOT_FOUND", "nope")).unwrap();
        assert_eq!(body["success"], false);
        assert!(body.get("data").is_none());
        assert_eq!(body["error"]["code"], "TOOL_NOT_FOUND");
    }

    #[test]
    fn test_meta_carries_service_request_and_timing() {
        let resp = ApiResponse::ok_with_service(1, "gateway")
            .with_request_id("req-1")
            .timed(Instant::now());
        let body = serde_json::to_value(&resp).unwrap();

        assert_eq!(body["data"], 1);
        assert_eq!(body["meta"]["service"], "gateway");
        assert_eq!(body["meta"]["request_id"], "req-1");
        assert!(body["meta"]["duration_ms"].is_u64());
    }
}
