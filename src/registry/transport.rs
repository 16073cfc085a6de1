//! How manifests and template bodies reach the registry client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::config::CenterConfig;
use super::github::{GithubTransport, HttpFetcher};
use crate::error::{CapError, Result};
use crate::utils::fs::list_files_with_ext;

/// One manifest file as fetched, before parsing.
#[derive(Debug, Clone)]
pub struct RawManifest {
    /// File name or URL the bytes came from, for error messages.
    pub source: String,
    pub bytes: Vec<u8>,
}

pub trait RegistryTransport {
    /// List and download every manifest of a center.
    ///
    /// The outer error means the center could not be listed at all. An inner
    /// error is one manifest that could not be downloaded.
    fn fetch_manifests(
        &self,
        address: &str,
        token: Option<&str>,
    ) -> Result<Vec<Result<RawManifest>>>;

    fn fetch_body(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Picks a transport for a center address.
pub trait TransportFactory {
    fn transport_for(&self, center: &CenterConfig) -> Result<Box<dyn RegistryTransport>>;
}

pub(crate) fn is_manifest_name(name: &str) -> bool {
    name.ends_with(".yaml") || name.ends_with(".yml")
}

/// A center that is a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalDirTransport {
    root: PathBuf,
    http: HttpFetcher,
}

impl LocalDirTransport {
    pub fn new(root: impl Into<PathBuf>, http: HttpFetcher) -> Self {
        Self {
            root: root.into(),
            http,
        }
    }
}

fn local_path(address: &str) -> &Path {
    Path::new(address.strip_prefix("file://").unwrap_or(address))
}

impl RegistryTransport for LocalDirTransport {
    fn fetch_manifests(
        &self,
        address: &str,
        _token: Option<&str>,
    ) -> Result<Vec<Result<RawManifest>>> {
        let dir = local_path(address);
        if !dir.is_dir() {
            return Err(CapError::RemoteFetch(format!(
                "center directory {} does not exist",
                dir.display()
            )));
        }
        let manifests = list_files_with_ext(dir, &["yaml", "yml"])?
            .into_iter()
            .map(|path| {
                let source = path.display().to_string();
                std::fs::read(&path)
                    .map(|bytes| RawManifest {
                        source: source.clone(),
                        bytes,
                    })
                    .map_err(|err| CapError::RemoteFetch(format!("{source}: {err}")))
            })
            .collect();
        Ok(manifests)
    }

    fn fetch_body(&self, uri: &str) -> Result<Vec<u8>> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.http.get(uri, None);
        }
        let path = local_path(uri);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::read(&path)
            .map_err(|err| CapError::RemoteFetch(format!("read {}: {err}", path.display())))
    }
}

/// GitHub for `github.com` addresses, the local filesystem for paths.
#[derive(Debug, Clone)]
pub struct DefaultTransports {
    pub github_api: String,
    pub timeout: Duration,
    pub max_download_bytes: u64,
}

impl TransportFactory for DefaultTransports {
    fn transport_for(&self, center: &CenterConfig) -> Result<Box<dyn RegistryTransport>> {
        let http = HttpFetcher::new(self.timeout, self.max_download_bytes)?;
        let address = center.address.as_str();
        if address.contains("github.com/") {
            return Ok(Box::new(GithubTransport::new(http, self.github_api.clone())));
        }
        if address.starts_with("http://") || address.starts_with("https://") {
            return Err(CapError::Config(format!(
                "unsupported center address {address}: use a github.com repository or a local directory"
            )));
        }
        Ok(Box::new(LocalDirTransport::new(local_path(address), http)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn http() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap()
    }

    #[test]
    fn local_dir_lists_yaml_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("route.yaml"), "a").unwrap();
        std::fs::write(temp.path().join("README.md"), "b").unwrap();

        let transport = LocalDirTransport::new(temp.path(), http());
        let manifests = transport
            .fetch_manifests(&temp.path().display().to_string(), None)
            .unwrap();
        assert_eq!(manifests.len(), 1);
        assert!(manifests[0].as_ref().unwrap().source.ends_with("route.yaml"));
    }

    #[test]
    fn local_body_resolves_relative_to_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("route.cue"), "parameter: {}").unwrap();
        let transport = LocalDirTransport::new(temp.path(), http());
        assert_eq!(transport.fetch_body("route.cue").unwrap(), b"parameter: {}");
        assert!(transport.fetch_body("missing.cue").is_err());
    }

    #[test]
    fn missing_directory_is_remote_fetch_error() {
        let transport = LocalDirTransport::new("/nonexistent", http());
        let err = transport.fetch_manifests("/nonexistent/center", None).unwrap_err();
        assert!(matches!(err, CapError::RemoteFetch(_)));
    }

    #[test]
    fn factory_rejects_plain_http_addresses() {
        let factory = DefaultTransports {
            github_api: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(5),
            max_download_bytes: 1024,
        };
        assert!(factory
            .transport_for(&CenterConfig::new("x", "https://example.dev/repo"))
            .is_err());
        assert!(factory
            .transport_for(&CenterConfig::new("core", "https://github.com/a/b"))
            .is_ok());
        assert!(factory
            .transport_for(&CenterConfig::new("local", "/srv/caps"))
            .is_ok());
    }
}
