//! Fetching remote bytes.

use crate::error::{ReleaseError, Result};
use std::{collections::HashMap, io, sync::Mutex};

/// Capability to fetch the body behind a URL.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch `url` and return the full response body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher with an optional proxy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client; `proxy` routes both http and https traffic.
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(proxy) = proxy {
            log::debug!("Routing downloads through proxy {}", proxy);
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Downloading {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }
}

/// In-memory fetcher serving canned bodies; records every request.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Empty fetcher; every request fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.bodies.get(url).cloned().ok_or_else(|| {
            ReleaseError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no response for {}", url),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_fetcher_records_requests() {
        let fetcher = StaticFetcher::new().with("https://a/x", b"hello".to_vec());
        assert_eq!(fetcher.fetch("https://a/x").await.unwrap(), b"hello");
        assert!(fetcher.fetch("https://a/missing").await.is_err());
        assert_eq!(fetcher.requests(), vec!["https://a/x", "https://a/missing"]);
    }

    #[test]
    fn http_fetcher_builds_with_and_without_proxy() {
        assert!(HttpFetcher::new(Some("http://127.0.0.1:3128")).is_ok());
        assert!(HttpFetcher::new(None).is_ok());
    }
}
