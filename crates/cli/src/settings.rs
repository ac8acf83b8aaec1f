//! Configuration shared by all commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DatasetConfig};
use tracing::debug;

use crate::cli::Cli;

/// Effective configuration of one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: DatasetConfig,
    /// `--data-folder`; beats `config.data_folder` for this invocation only
    pub data_folder: Option<PathBuf>,
}

impl Settings {
    /// `--config` when given, defaults otherwise
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => DatasetConfig::default(),
        };
        debug!(
            config = ?cli.config,
            data_folder = ?cli.data_folder,
            "settings resolved"
        );
        Ok(Self {
            config,
            data_folder: cli.data_folder.clone(),
        })
    }

    pub fn data_folder(&self) -> Option<&Path> {
        self.data_folder.as_deref()
    }
}
