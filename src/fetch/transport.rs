//! Network access behind a trait so tests can count requests.

use std::io::Read;
use std::time::Duration;

use super::FetchError;

/// Maximum body size accepted for a markdown document.
const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// Something that can GET a URL and return its body as text.
pub trait Transport: Send + Sync {
    /// Fetch `url`.
    ///
    /// # Errors
    /// Returns a [`FetchError`] for any failure; implementations must not panic.
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTPS transport.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("docview/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => FetchError::Status(code),
            ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
        })?;

        read_body(response.into_reader(), MAX_BODY_BYTES)
    }
}

/// Read at most `limit` bytes of UTF-8; a longer body is an error, not a truncation.
fn read_body(reader: impl Read, limit: u64) -> Result<String, FetchError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| FetchError::Body(err.to_string()))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit {
        return Err(FetchError::Body(format!("body exceeds {limit} bytes")));
    }
    String::from_utf8(bytes).map_err(|err| FetchError::Body(err.to_string()))
}
