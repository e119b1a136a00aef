//! Locating a mongod executable for a requested version.
//!
//! Downloading is not handled here. [`LocalResolver`] looks, in order, at:
//!
//! 1. the explicit `binary_path` from the config (or `MEMONGO_MONGOD_BIN`)
//! 2. `<cache_path>/<version>/mongod` and `<cache_path>/<version>/bin/mongod`
//! 3. `mongod` on `PATH`
//!
//! Callers with their own download logic implement [`BinaryResolver`].

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait BinaryResolver: Send + Sync {
    /// Return the path of an executable mongod for `config.version`.
    async fn resolve(&self, config: &Config) -> Result<PathBuf>;
}

/// Resolver that only looks at the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct LocalResolver;

impl LocalResolver {
    pub fn new() -> Self {
        Self
    }

    fn candidates(config: &Config) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if !config.version.is_empty() {
            let version_dir = config.cache_path.join(&config.version);
            candidates.push(version_dir.join("mongod"));
            candidates.push(version_dir.join("bin").join("mongod"));
        }
        candidates
    }
}

#[async_trait]
impl BinaryResolver for LocalResolver {
    async fn resolve(&self, config: &Config) -> Result<PathBuf> {
        if let Some(ref explicit) = config.binary_path {
            if is_executable(explicit) {
                return Ok(explicit.clone());
            }
            return Err(Error::BinaryNotFound {
                version: config.version.clone(),
                reason: format!("'{}' is not an executable file", explicit.display()),
            });
        }

        for candidate in Self::candidates(config) {
            if is_executable(&candidate) {
                tracing::debug!("Found cached mongod at {}", candidate.display());
                return Ok(candidate);
            }
        }

        if let Some(on_path) = find_on_path("mongod") {
            tracing::debug!("Using mongod from PATH: {}", on_path.display());
            return Ok(on_path);
        }

        Err(Error::BinaryNotFound {
            version: config.version.clone(),
            reason: format!(
                "not in cache directory '{}' and not on PATH",
                config.cache_path.display()
            ),
        })
    }
}

/// Search `PATH` for an executable called `program`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
