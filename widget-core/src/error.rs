//! Errors returned by the OpenWeather client.
//!
//! HTTP status is not an error here: whatever JSON the service answers with is
//! handed back to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure reported by the transport.
    #[error("OpenWeather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse OpenWeather JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the failure happened before a body could be read.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_is_not_network() {
        let parse_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = ApiError::from(parse_err);

        assert!(!err.is_network());
        assert!(err.to_string().contains("Failed to parse OpenWeather JSON"));
    }
}
