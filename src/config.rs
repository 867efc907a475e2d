//! Runtime configuration shared by the registry, the factories and the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::item::Recursion;

/// Environment variable holding the extension descriptor search path, in the
/// platform's path-list syntax (`:` on Unix, `;` on Windows).
pub const EXTENSION_PATH_ENV: &str = "RESFIND_EXTENSION_PATH";

/// Environment variable overriding [`ResourceConfig::pool_capacity`].
pub const POOL_CAPACITY_ENV: &str = "RESFIND_POOL_CAPACITY";

#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Recursion mode applied by loaders built from this configuration.
    pub recursion: Recursion,
    /// Number of recently used archive caches the pool keeps open even when
    /// no path item references them.
    pub pool_capacity: usize,
    pub http: HttpConfig,
    pub sftp: SftpConfig,
    /// Directories or archives scanned for `.extension` descriptors.
    pub extension_path: Vec<PathBuf>,
    /// Activate the extensions compiled into this crate (TAR, and SFTP when
    /// the `sftp` feature is enabled).
    pub load_bundled_extensions: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            recursion: Recursion::NonRecursive,
            pool_capacity: 16,
            http: HttpConfig::default(),
            sftp: SftpConfig::default(),
            extension_path: Vec::new(),
            load_bundled_extensions: true,
        }
    }
}

impl ResourceConfig {
    /// Defaults overlaid with [`EXTENSION_PATH_ENV`] and [`POOL_CAPACITY_ENV`].
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(paths) = std::env::var_os(EXTENSION_PATH_ENV) {
            config.extension_path = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        if let Ok(capacity) = std::env::var(POOL_CAPACITY_ENV) {
            match capacity.parse() {
                Ok(capacity) => config.pool_capacity = capacity,
                Err(_) => tracing::warn!(
                    value = %capacity,
                    "ignoring invalid {}",
                    POOL_CAPACITY_ENV
                ),
            }
        }

        config
    }
}

/// Settings for archives fetched with HTTP Range requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retry: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retry: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SftpConfig {
    /// Applied to the TCP connect and to every blocking session call, so an
    /// unreachable host fails the call instead of hanging it.
    pub connect_timeout: Duration,
    pub default_port: u16,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            default_port: 22,
        }
    }
}
