//! Path resolution for the rota data directory

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "ROTA_HOME";

/// Resolves standard paths for config, roster, ledger and usage files
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// Resolve the data directory: `$ROTA_HOME`, else `~/.rota`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(dir)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::at(home.join(".rota")))
    }

    /// Use an explicit data directory
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Engine configuration (weights, chains, balancer settings)
    pub fn config_file(&self) -> PathBuf {
        self.home.join("rota.json")
    }

    /// Availability snapshot produced by the scheduling side
    pub fn roster_file(&self) -> PathBuf {
        self.home.join("roster.json")
    }

    /// Counter snapshot for crash recovery
    pub fn ledger_file(&self) -> PathBuf {
        self.home.join("ledger.json")
    }

    pub fn usage_log(&self) -> PathBuf {
        self.home.join("usage.jsonl")
    }

    /// Held by processes that read-modify-write the ledger
    pub fn lock_file(&self) -> PathBuf {
        self.home.join(".lock")
    }
}
