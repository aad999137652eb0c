//! Fetch DDS, DAS and data responses and run them through the parsers.
//!
//! Fetching itself sits behind [`Fetch`]. The pipeline only needs full response
//! bodies, so a fetcher may block, cache, or read from disk as it sees fit.

use crate::ast::DapVar;
use crate::das::parse_das;
use crate::error::{Error, Result};
use crate::frame::{decode_data_response, DecodedData};
use crate::parser::parse_dds;
use std::path::Path;
use tracing::debug;

/// Source of raw response bodies.
pub trait Fetch {
    /// Complete body of the response for `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// When set, requests go to `proxy?url=<percent-encoded url>`.
    pub proxy: Option<String>,
}

impl ClientConfig {
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// URL actually requested for `url` + `suffix`, routed through `proxy` if given.
pub fn request_url(url: &str, suffix: &str, proxy: Option<&str>) -> String {
    let target = format!("{}{}", url, suffix);
    match proxy {
        Some(proxy) => format!("{}?url={}", proxy, urlencoding::encode(&target)),
        None => target,
    }
}

#[derive(Debug)]
pub struct Client<F> {
    fetcher: F,
    config: ClientConfig,
}

impl<F: Fetch> Client<F> {
    pub fn new(fetcher: F, config: ClientConfig) -> Self {
        Client { fetcher, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch and parse `url.dds`, then fetch `url.das` and attach its attributes.
    pub fn load_dataset(&self, url: &str) -> Result<DapVar> {
        let dds = self.fetch_text(url, ".dds")?;
        let mut dataset = parse_dds(&dds)?;
        let das = self.fetch_text(url, ".das")?;
        parse_das(&das, &mut dataset)?;
        Ok(dataset)
    }

    /// Fetch `url` as a data response (no suffix) and decode it.
    pub fn load_data(&self, url: &str) -> Result<DecodedData> {
        let bytes = self.fetch(url, "")?;
        decode_data_response(&bytes)
    }

    fn fetch(&self, url: &str, suffix: &str) -> Result<Vec<u8>> {
        let target = request_url(url, suffix, self.config.proxy.as_deref());
        debug!(url = %target, "fetching");
        let body = self.fetcher.fetch(&target)?;
        debug!(url = %target, bytes = body.len(), "fetched");
        Ok(body)
    }

    /// Text responses are UTF-8 when valid, otherwise one char per byte.
    fn fetch_text(&self, url: &str, suffix: &str) -> Result<String> {
        let body = self.fetch(url, suffix)?;
        Ok(match String::from_utf8(body) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
        })
    }
}

/// Reads responses from local files; `file://` prefixes are stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        std::fs::read(path).map_err(|e| Error::Transport(format!("{}: {}", path.display(), e)))
    }
}

/// Blocking HTTP(S) fetcher.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        use std::io::Read;

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| Error::Transport(format!("{}: {}", url, e)))?;
        Ok(body)
    }
}
