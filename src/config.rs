//! Configuration manager for turkguide.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PAGE_SIZE: i64 = 500;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of the application.
    pub url: String,
    /// HTTP port.
    pub port: u16,
    #[serde(skip_deserializing)]
    pub version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Where the client state snapshot is persisted.
    #[serde(skip_serializing)]
    pub state_path: Option<PathBuf>,
    /// Related to the backend PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to handle rename propagation.
    #[serde(skip_serializing)]
    pub rename: Rename,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: "TurkGuide".into(),
            url: String::default(),
            port: DEFAULT_PORT,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            state_path: None,
            postgres: None,
            rename: Rename::default(),
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Rename propagation configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rename {
    /// Rows fetched per collection when loading data or rewriting
    /// embedded handles.
    pub page_size: i64,
    /// Maximum aliases kept, unbounded if missing.
    pub alias_capacity: Option<usize>,
    /// Drop aliases pointing to no live handle on start-up.
    pub compact_aliases: bool,
}

impl Default for Rename {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            alias_capacity: None,
            compact_aliases: false,
        }
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &default_path
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            tracing::error!(path = %file_path.display(), error = %err, "invalid configuration file, using defaults");
                            return Ok(Arc::new(Self::default()));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                if !config.url.is_empty() {
                    config.url = self.normalize_url(&config.url)?;
                }

                Ok(Arc::new(config))
            },
            Err(err) => {
                tracing::error!(path = %file_path.display(), error = %err, "cannot open configuration file, using defaults");
                Ok(Arc::new(Self::default()))
            },
        }
    }
}
