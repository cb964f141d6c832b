//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_core::RegenConfig;
use edge_store::{FsBackend, FsStore};

use crate::output::Output;

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 3] = ["edge.toml", ".edge.toml", "edge.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Loaded configuration.
    pub config: RegenConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let config = RegenConfig::load(path)
                    .with_context(|| format!("Failed to load config file: {}", path))?;
                (config, Some(PathBuf::from(path)))
            }
            None => match Self::find_config(&cwd)? {
                Some((path, config)) => (config, Some(path)),
                None => (RegenConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Result<Option<(PathBuf, RegenConfig)>> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let config = RegenConfig::load(&path)
                        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
                    return Ok(Some((path, config)));
                }
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Root directory of the filesystem store.
    pub fn store_root(&self) -> PathBuf {
        self.resolve_path(&self.config.store.root)
    }

    /// Deployment backend for the configured store.
    pub fn backend(&self) -> FsBackend {
        FsBackend::new(self.config.store.bucket.clone(), self.store_root())
    }

    /// The configured store.
    pub fn store(&self) -> Arc<FsStore> {
        Arc::new(FsStore::new(self.config.store.bucket.clone(), self.store_root()))
    }
}
