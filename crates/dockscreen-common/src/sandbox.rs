use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::ScreenError;

/// Default request timeout for outbound calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A sandbox-capped HTTP client that only allows requests to approved domains.
/// Every request carries the client-wide timeout so a stalled service cannot hang a caller.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
    timeout: Duration,
}

impl SandboxClient {
    /// Creates a new SandboxClient with the default allowlist and a 30 second timeout.
    pub fn new() -> Result<Self, ScreenError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a SandboxClient with an explicit request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ScreenError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "admetlab3.scbdd.com",     // ADMETlab 3.0
            "admetmesh.scbdd.com",     // ADMETlab 2.0
            "localhost",               // Local prediction service
            "127.0.0.1",               // Localhost alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ScreenError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist, timeout })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Allows the host of the given URL, e.g. a configured service endpoint.
    pub fn allow_url(&mut self, url: &str) -> Result<(), ScreenError> {
        let parsed = Url::parse(url)
            .map_err(|e| ScreenError::Config(format!("Invalid URL {}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ScreenError::Config(format!("URL has no host: {}", url)))?;
        self.allow_domain(host);
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder for POST requests.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, ScreenError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), ScreenError> {
        if !self.is_allowed(url) {
            return Err(ScreenError::SecurityError(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://admetlab3.scbdd.com/api/admet"));
        assert!(client.is_allowed("http://localhost:8000/predict"));
        assert!(!client.is_allowed("https://example.org/predict"));
        assert!(!client.is_allowed("not a url"));
    }

    #[test]
    fn test_allow_url_adds_host() {
        let mut client = SandboxClient::new().unwrap();
        assert!(!client.is_allowed("https://admet.internal.lab/v1/predict"));
        client.allow_url("https://admet.internal.lab/v1/predict").unwrap();
        assert!(client.is_allowed("https://admet.internal.lab/other"));
        assert!(client.is_allowed("https://eu.admet.internal.lab/other"));
    }

    #[test]
    fn test_blocked_post_is_security_error() {
        let client = SandboxClient::new().unwrap();
        let err = client.post("https://example.org/predict").unwrap_err();
        assert!(matches!(err, ScreenError::SecurityError(_)));
    }

    #[test]
    fn test_timeout_is_recorded() {
        let client = SandboxClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
