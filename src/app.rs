//! Wiring shared by every command: configuration, the local store and the
//! cluster collaborators.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::appfile::{AppWorkflow, AppfileRepo};
use crate::cli::{Cli, OutputFormat};
use crate::cluster::{HelmProvisioner, KubectlClient};
use crate::config::Config;
use crate::error::Result;
use crate::installer::Installer;
use crate::registry::github::HttpFetcher;
use crate::registry::{CenterService, DefaultTransports, LocalDirTransport};
use crate::store::FsStore;

pub struct AppContext {
    pub config: Config,
    pub home: PathBuf,
    pub format: OutputFormat,
    pub store: FsStore,
    pub kubectl: KubectlClient,
    pub helm: HelmProvisioner,
    pub transports: DefaultTransports,
    pub appfiles: AppfileRepo,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &cwd.join(".capkit"))?;
        Self::from_config(config, OutputFormat::from_args(cli.json, cli.output_format))
    }

    pub fn from_config(config: Config, format: OutputFormat) -> Result<Self> {
        let home = config.home()?;
        debug!(home = %home.display(), namespace = %config.cluster.namespace, "opening capkit home");

        let store = FsStore::open(&home, config.registry.template_ext.clone())?;
        let kubectl = KubectlClient::with_binary(&config.cluster.kubectl)
            .with_context(config.cluster.context.clone());
        let chart_namespace = config
            .chart
            .namespace
            .clone()
            .unwrap_or_else(|| config.cluster.namespace.clone());
        let helm = HelmProvisioner::new(&config.chart.helm, chart_namespace);
        let transports = DefaultTransports {
            github_api: config.registry.github_api.clone(),
            timeout: config.registry.timeout(),
            max_download_bytes: config.registry.max_download_bytes,
        };
        let appfiles = AppfileRepo::new(&home);

        Ok(Self {
            config,
            home,
            format,
            store,
            kubectl,
            helm,
            transports,
            appfiles,
        })
    }

    #[must_use]
    pub const fn json(&self) -> bool {
        self.format.is_machine_readable()
    }

    #[must_use]
    pub fn center_registry_path(&self) -> PathBuf {
        self.store.centers_dir().join("config.toml")
    }

    #[must_use]
    pub fn centers(&self) -> CenterService<'_> {
        CenterService::new(
            self.center_registry_path(),
            &self.store,
            &self.kubectl,
            &self.transports,
        )
    }

    #[must_use]
    pub fn installer(&self) -> Installer<'_> {
        Installer::new(
            &self.store,
            &self.kubectl,
            &self.kubectl,
            &self.helm,
            self.config.cluster.namespace.clone(),
        )
    }

    /// Transport used to dereference template URIs of definitions read
    /// from the cluster. Relative URIs resolve against `base`.
    pub fn body_transport(&self, base: &Path) -> Result<LocalDirTransport> {
        let http = HttpFetcher::new(
            self.config.registry.timeout(),
            self.config.registry.max_download_bytes,
        )?;
        Ok(LocalDirTransport::new(base, http))
    }

    #[must_use]
    pub fn workflow(&self, env: &str) -> AppWorkflow<'_> {
        AppWorkflow::new(&self.appfiles, &self.store, env)
    }
}
