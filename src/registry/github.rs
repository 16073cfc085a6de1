//! GitHub-hosted centers, read through the contents API.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::transport::{RawManifest, RegistryTransport, is_manifest_name};
use crate::error::{CapError, Result};

pub const GH_API: &str = "https://api.github.com";
const USER_AGENT: &str = "capkit-cli";

/// Blocking HTTP getter with a size cap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CapError::RemoteFetch(format!("build http client: {err}")))?;
        Ok(Self { client, max_bytes })
    }

    pub fn get(&self, url: &str, token: Option<&str>) -> Result<Vec<u8>> {
        debug!(url, authenticated = token.is_some(), "http get");
        let mut request = self.client.get(url).header("User-Agent", USER_AGENT);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|err| CapError::RemoteFetch(format!("GET {url}: {err}")))?;
        if !response.status().is_success() {
            return Err(CapError::RemoteFetch(format!(
                "GET {url}: HTTP {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(CapError::RemoteFetch(format!(
                    "GET {url}: response too large ({length} bytes, max {})",
                    self.max_bytes
                )));
            }
        }

        let mut bytes = Vec::new();
        response
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| CapError::RemoteFetch(format!("GET {url}: read body: {err}")))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(CapError::RemoteFetch(format!(
                "GET {url}: response exceeded {} bytes",
                self.max_bytes
            )));
        }
        Ok(bytes)
    }
}

/// `https://github.com/<owner>/<repo>[/tree/<ref>/<path>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubLocation {
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
    pub path: String,
}

impl GithubLocation {
    pub fn parse(address: &str) -> Result<Self> {
        let rest = address
            .strip_prefix("https://github.com/")
            .or_else(|| address.strip_prefix("http://github.com/"))
            .or_else(|| address.strip_prefix("github.com/"))
            .ok_or_else(|| {
                CapError::Config(format!("not a GitHub repository address: {address}"))
            })?;
        let parts: Vec<&str> = rest
            .trim_end_matches('/')
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();

        match parts.as_slice() {
            [owner, repo] => Ok(Self {
                owner: (*owner).to_string(),
                repo: repo.trim_end_matches(".git").to_string(),
                git_ref: None,
                path: String::new(),
            }),
            [owner, repo, "tree", git_ref, path @ ..] => Ok(Self {
                owner: (*owner).to_string(),
                repo: (*repo).to_string(),
                git_ref: Some((*git_ref).to_string()),
                path: path.join("/"),
            }),
            _ => Err(CapError::Config(format!(
                "invalid GitHub repository address: {address}"
            ))),
        }
    }

    fn contents_url(&self, api_base: &str) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents/{}",
            api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path
        );
        if let Some(git_ref) = &self.git_ref {
            url.push_str("?ref=");
            url.push_str(&urlencoding::encode(git_ref));
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GithubTransport {
    http: HttpFetcher,
    api_base: String,
}

impl GithubTransport {
    pub fn new(http: HttpFetcher, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    /// Tokens only go to GitHub hosts or the configured API base.
    fn token_for<'a>(&self, url: &str, token: Option<&'a str>) -> Option<&'a str> {
        let lower = url.to_lowercase();
        let trusted = lower.starts_with(&self.api_base.to_lowercase())
            || lower.starts_with("https://api.github.com/")
            || lower.starts_with("https://raw.githubusercontent.com/")
            || lower.starts_with("https://github.com/");
        token.filter(|_| trusted)
    }
}

impl RegistryTransport for GithubTransport {
    fn fetch_manifests(
        &self,
        address: &str,
        token: Option<&str>,
    ) -> Result<Vec<Result<RawManifest>>> {
        let location = GithubLocation::parse(address)?;
        let listing_url = location.contents_url(&self.api_base);
        let listing = self.http.get(&listing_url, self.token_for(&listing_url, token))?;
        let entries: Vec<ContentEntry> = serde_json::from_slice(&listing).map_err(|err| {
            CapError::RemoteFetch(format!("parse contents listing {listing_url}: {err}"))
        })?;

        let mut manifests = Vec::new();
        for entry in entries {
            if entry.entry_type != "file" || !is_manifest_name(&entry.name) {
                continue;
            }
            let Some(download_url) = entry.download_url else {
                continue;
            };
            let download = self
                .http
                .get(&download_url, self.token_for(&download_url, token))
                .map(|bytes| RawManifest {
                    source: entry.name.clone(),
                    bytes,
                });
            manifests.push(download);
        }
        Ok(manifests)
    }

    fn fetch_body(&self, uri: &str) -> Result<Vec<u8>> {
        self.http.get(uri, None)
    }
}
