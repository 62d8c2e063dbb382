//! CLI configuration: `.env` file, then process environment, then defaults.

use std::path::PathBuf;

use claw_core::{ClawError, Result};

const DEFAULT_REGISTRY_PATH: &str = ".claw/registry.claw";
const DEFAULT_KEYS_PATH: &str = ".claw/keys.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    /// Registry file (`CLAW_REGISTRY_PATH`)
    pub registry_path: PathBuf,
    /// Identity file (`CLAW_KEYS_PATH`)
    pub keys_path: PathBuf,
    /// Save the registry every N inserts; 0 disables auto-save, leaving the
    /// explicit flush after each command (`CLAW_AUTO_SAVE`)
    pub auto_save: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            registry_path: DEFAULT_REGISTRY_PATH.into(),
            keys_path: DEFAULT_KEYS_PATH.into(),
            auto_save: 0,
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let auto_save = match lookup("CLAW_AUTO_SAVE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ClawError::ConfigError(format!(
                    "CLAW_AUTO_SAVE must be a non-negative integer, got {:?}",
                    raw
                ))
            })?,
            None => defaults.auto_save,
        };

        Ok(Self {
            registry_path: lookup("CLAW_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),
            keys_path: lookup("CLAW_KEYS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.keys_path),
            auto_save,
        })
    }
}
