//! Builder for creating and configuring Guide instances.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use tokio::task;

use super::Guide;
use crate::{
    config::EngineConfig,
    db::Database,
    engine::PredicateRegistry,
    error::{GuideError, JoinResultExt, Result},
};

/// Builder for creating and configuring [`Guide`] instances.
#[derive(Debug, Clone)]
pub struct GuideBuilder {
    database_path: Option<PathBuf>,
    config: Option<EngineConfig>,
    config_path: Option<PathBuf>,
    max_retries: Option<u32>,
    predicates: PredicateRegistry,
    rng_seed: Option<u64>,
}

impl GuideBuilder {
    /// Creates a new builder with default settings and the builtin
    /// predicates registered.
    pub fn new() -> Self {
        Self {
            database_path: None,
            config: None,
            config_path: None,
            max_retries: None,
            predicates: PredicateRegistry::with_builtins(),
            rng_seed: None,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/stepwise/stepwise.db` or
    /// `~/.local/share/stepwise/stepwise.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Uses this configuration instead of reading one from disk.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads the configuration from this JSON file instead of the XDG
    /// default location.
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.config_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Overrides `max_retries` from whichever configuration is loaded.
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        if max_retries.is_some() {
            self.max_retries = max_retries;
        }
        self
    }

    /// Registers additional predicates for custom rules and conditions.
    /// Entries replace builtins of the same name.
    pub fn with_predicates(mut self, predicates: PredicateRegistry) -> Self {
        self.predicates.extend(predicates);
        self
    }

    /// Seeds the random source used for weighted routing, making
    /// probabilistic transitions reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Builds the configured guide.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::FileSystem` if the database directory or config
    /// file cannot be accessed
    /// Returns `GuideError::Configuration` if the config file is malformed
    /// Returns `GuideError::Database` if database initialization fails
    pub async fn build(self) -> Result<Guide> {
        let config = self.resolve_config()?;
        debug!("Engine configuration: {config:?}");

        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GuideError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), GuideError>(())
        })
        .await
        .join_context()?;

        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Guide {
            db_path,
            config,
            predicates: Arc::new(self.predicates),
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    /// Explicit config, then the given file, then the XDG default file,
    /// then defaults. `max_retries` overrides whichever wins.
    fn resolve_config(&self) -> Result<EngineConfig> {
        let mut config = match (&self.config, &self.config_path) {
            (Some(config), _) => config.clone(),
            (None, Some(path)) => EngineConfig::load(path)?,
            (None, None) => match EngineConfig::default_path() {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::default(),
            },
        };
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        Ok(config)
    }

    /// Returns the default database path following the XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("stepwise")
            .place_data_file("stepwise.db")
            .map_err(|e| GuideError::XdgDirectory(e.to_string()))
    }
}

impl Default for GuideBuilder {
    fn default() -> Self {
        Self::new()
    }
}
