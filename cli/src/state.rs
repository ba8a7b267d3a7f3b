//! JSON state file holding the simulated pool between invocations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use reserve_pool::{AccountId, InMemoryPool};

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("No pool state at {0}. Create one with: pool init")]
    Missing(PathBuf),

    #[error("Pool state already exists at {0}. Pass --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error("Unsupported state version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub pool: InMemoryPool,
}

impl StateFile {
    pub fn new(pool_account: AccountId) -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            pool: InMemoryPool::in_memory(pool_account),
        }
    }

    /// Write a fresh empty pool to `path`
    pub fn init(path: &Path, pool_account: AccountId, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(StateError::AlreadyExists(path.to_path_buf()).into());
        }
        let mut state = Self::new(pool_account);
        state.save(path)?;
        Ok(state)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StateError::Missing(path.to_path_buf()).into());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: StateFile = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse state JSON: {}", path.display()))?;

        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                expected: STATE_VERSION,
            }
            .into());
        }

        debug!("Loaded pool state from {} ({})", path.display(), state.updated_at);
        Ok(state)
    }

    /// Stamp and write the state; the file is replaced in a single rename
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Utc::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize pool state")?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("Failed to write state file: {}", staging.display()))?;
        fs::rename(&staging, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        debug!("Saved pool state to {}", path.display());
        Ok(())
    }
}
