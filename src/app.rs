//! Application context shared by CLI commands

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::{Result, VibeError};
use crate::search::{SearchExecutor, ServiceContext};

/// Everything a command needs: resolved paths, config, and lazily built services.
#[derive(Debug)]
pub struct AppContext {
    /// Data directory (`VIBE_ROOT`, else the platform data dir + `vibe`).
    pub vibe_root: PathBuf,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub catalog_path: PathBuf,
    pub robot_mode: bool,
    pub output_format: OutputFormat,
    pub services: ServiceContext,
    pub executor: SearchExecutor,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let vibe_root = resolve_vibe_root()?;
        let config = Config::load(cli.config.as_deref(), &vibe_root)?;
        let catalog_path = config.catalog.resolve_db_path(&vibe_root);

        tracing::debug!(
            root = %vibe_root.display(),
            catalog = %catalog_path.display(),
            backend = %config.embedding.backend,
            "app context ready"
        );

        let services = ServiceContext::new(&config.embedding, &config.catalog, catalog_path.clone());
        let executor = SearchExecutor::new(&config.search);

        Ok(Self {
            vibe_root,
            config_path: cli.config.clone(),
            catalog_path,
            robot_mode: cli.robot,
            output_format: cli.output_format(),
            services,
            executor,
            config,
        })
    }
}

fn resolve_vibe_root() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os("VIBE_ROOT").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    dirs::data_dir()
        .map(|dir| dir.join("vibe"))
        .ok_or_else(|| VibeError::MissingConfig("root".to_string()))
}
