//! Shared HTTP client factory.

use reqwest::Client;
use std::time::Duration;

/// Default timeout for a single upstream completion attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection establishment timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a new HTTP client with a custom request timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .user_agent(concat!("freegate/", env!("CARGO_PKG_VERSION")))
        .build()
}
