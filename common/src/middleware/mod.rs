//! Axum middleware shared by the tool host and the query back-end.

pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
