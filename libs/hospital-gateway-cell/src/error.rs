use thiserror::Error;

use shared_http::HttpClientError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Hospital API request failed: {0}")]
    Http(#[from] HttpClientError),

    #[error("Hospital API call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Hospital API rejected the request: {0}")]
    Rejected(String),
}
