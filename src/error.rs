use thiserror::Error;

/// Failures talking to the Pixometer API.
#[derive(Debug, Error)]
pub enum PixometerError {
    /// Connection failure or non-success status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered without a body.
    #[error("Empty response from {endpoint}")]
    EmptyBody { endpoint: &'static str },

    /// The body was not the JSON we expected.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}
