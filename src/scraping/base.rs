use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::ElementRef;

/// Anything that can turn a listing URL into raw HTML.
pub trait PageFetcher {
    fn fetch_html(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, verify_tls: bool) -> Result<Self> {
        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled for listing fetches");
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .context("unable to build listing http client")?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed for {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("non-success status for {url}"))?;
        response
            .text()
            .with_context(|| format!("unable to read response body for {url}"))
    }
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of a node, text runs joined with single spaces.
pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Site-relative hrefs get the origin prepended; everything else is kept
/// verbatim, including protocol-relative and page-relative links.
pub fn absolute_url(origin: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
