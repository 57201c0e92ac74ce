//! Google Patents direct fetch.
//!
//! Fetches `https://patents.google.com/patent/<token>` with a browser-like
//! User-Agent and scans the HTML for the first link into the PDF asset host
//! (`https://patentimages.storage.googleapis.com/...pdf`). No page rendering;
//! if the link is not in the served HTML the patent counts as not found.

use async_trait::async_trait;
use patentfetch_common::{AllowlistClient, PatentFetchError};
use patentfetch_config::RetrievalConfig;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::error::RetrievalError;
use super::PatentSource;

pub struct GooglePatentsClient {
    client: AllowlistClient,
    detail_base_url: String,
    pdf_link: Regex,
}

impl GooglePatentsClient {
    /// Build a client for the detail site and asset host named in `cfg`.
    /// Only those hosts (plus `extra_allowed_hosts`) are reachable.
    pub fn new(cfg: &RetrievalConfig) -> Result<Self, PatentFetchError> {
        let mut client = AllowlistClient::new(&cfg.user_agent, cfg.http_timeout())?;
        client.allow_url_host(&cfg.detail_base_url)?;
        client.allow_url_host(&cfg.asset_host)?;
        for host in &cfg.extra_allowed_hosts {
            client.allow_domain(host);
        }

        Ok(Self {
            client,
            detail_base_url: cfg.detail_base_url.clone(),
            pdf_link: pdf_link_pattern(&cfg.asset_host)?,
        })
    }

    /// First asset link in document order, if any.
    pub fn first_pdf_link<'a>(&self, html: &'a str) -> Option<&'a str> {
        self.pdf_link.find(html).map(|m| m.as_str())
    }

    /// The underlying client, shared with the downloader so both use the same
    /// allowlist and identification.
    pub fn http(&self) -> &AllowlistClient {
        &self.client
    }
}

/// `<asset_host>/` followed by a run of URL characters ending in `.pdf`.
fn pdf_link_pattern(asset_host: &str) -> Result<Regex, PatentFetchError> {
    let host = regex::escape(asset_host.trim_end_matches('/'));
    Regex::new(&format!(r#"{host}/[^\s"'<>]+?\.pdf"#))
        .map_err(|e| PatentFetchError::Client(format!("Invalid asset host pattern: {e}")))
}

#[async_trait]
impl PatentSource for GooglePatentsClient {
    fn detail_url(&self, token: &str) -> String {
        format!("{}{}", self.detail_base_url, token)
    }

    #[instrument(skip(self))]
    async fn resolve_pdf_url(&self, token: &str) -> Result<String, RetrievalError> {
        let url = self.detail_url(token);
        info!("Fetching detail page {}", url);

        let resp = self.client
            .get(&url)
            .map_err(|e| RetrievalError::not_found(&url, e))?
            .send()
            .await
            .map_err(|e| RetrievalError::not_found(&url, describe(&e)))?;

        if !resp.status().is_success() {
            warn!("Detail page returned status {} for {}", resp.status(), token);
            return Err(RetrievalError::not_found(&url, format!("HTTP {}", resp.status())));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| RetrievalError::not_found(&url, describe(&e)))?;

        let Some(pdf_url) = self.first_pdf_link(&html) else {
            debug!("No PDF link on detail page for {}", token);
            return Err(RetrievalError::not_found(&url, "no PDF link on detail page"));
        };

        debug!(pdf_url = %pdf_url, "Found PDF link");
        Ok(pdf_url.to_string())
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}
