//! Operator configuration and caller resolution

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use reserve_pool::AccountId;

const DEFAULT_STATE_PATH: &str = "~/.config/reserve-pool/state.json";
const DEFAULT_POOL_ACCOUNT: &str = "pool";

/// On-disk shape of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    state_path: Option<String>,
    pool_account: Option<String>,
    default_caller: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub config_path: Option<PathBuf>,
    pub state_path: PathBuf,
    pub pool_account: AccountId,
    pub caller: Option<AccountId>,
}

impl PoolConfig {
    /// Resolve configuration from file, then apply command line overrides
    ///
    /// An explicit `config_path` must exist. Without one the default location
    /// is read if present and skipped otherwise.
    pub fn new(
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        caller: Option<String>,
    ) -> Result<Self> {
        let (file, config_path) = match config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                (load_config_file(&path)?, Some(path))
            }
            None => match default_config_path() {
                Some(path) if path.exists() => (load_config_file(&path)?, Some(path)),
                _ => (ConfigFile::default(), None),
            },
        };

        let state_path = match state_path {
            Some(path) => path,
            None => expand_path(file.state_path.as_deref().unwrap_or(DEFAULT_STATE_PATH))?,
        };

        let pool_account = file
            .pool_account
            .unwrap_or_else(|| DEFAULT_POOL_ACCOUNT.to_string());
        if pool_account.is_empty() {
            anyhow::bail!("pool_account must not be empty");
        }

        Ok(Self {
            config_path,
            state_path,
            pool_account: AccountId::new(pool_account),
            caller: caller.or(file.default_caller).map(AccountId::new),
        })
    }

    /// Account acting in the current invocation
    pub fn caller(&self) -> Result<AccountId> {
        match &self.caller {
            Some(caller) => Ok(caller.clone()),
            None => anyhow::bail!("No caller set. Pass --caller or set default_caller in config.toml"),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/reserve-pool/config.toml"))
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&data)
        .with_context(|| format!("Failed to parse config TOML: {}", path.display()))
}

/// Expand `~` and environment variables in a configured path
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
