//! HTTP client construction shared by the speech and generation backends.

use std::time::Duration;

use parla_core::{ParlaError, Result};

/// Build a client with a per-request timeout of at least one second.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| ParlaError::Config(format!("failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(30).is_ok());
        // Zero is clamped rather than producing a client that times out instantly.
        assert!(build_client(0).is_ok());
    }
}
