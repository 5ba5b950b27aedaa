//! Attach configuration via TOML
//!
//! An [`AttachConfig`] carries the four attach parameters so applications
//! can keep them in a config file instead of code.

use serde::{Deserialize, Serialize};
use std::path::Path;

use wgbind_core::{AttachMode, Error, Result};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "wgbind.toml";

/// Parameters for [`Database::attach_with_config`](super::Database::attach_with_config)
///
/// # Example
///
/// ```toml
/// # Store name (required)
/// name = "inventory"
///
/// # Size in bytes; 0 lets the engine choose
/// size = 0
///
/// # "default", "logged", "local" or "existing"
/// mode = "logged"
///
/// # Permission bits for a newly created store; 0 keeps engine defaults
/// permission = 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachConfig {
    /// Store name
    pub name: String,
    /// Store size in bytes, 0 for the engine default
    #[serde(default)]
    pub size: u64,
    /// Attach mode
    #[serde(default)]
    pub mode: AttachMode,
    /// Permission bits used when the store is created
    #[serde(default)]
    pub permission: u32,
}

impl AttachConfig {
    /// Config for `name` with every other parameter defaulted
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mode: AttachMode::default(),
            permission: 0,
        }
    }

    /// Set the size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: AttachMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the permission
    pub fn with_permission(mut self, permission: u32) -> Self {
        self.permission = permission;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// `Configuration` for malformed TOML, an unknown mode, or an empty name.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AttachConfig = toml::from_str(text)
            .map_err(|e| Error::config(format!("invalid attach config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("cannot serialize attach config: {}", e)))
    }

    /// Check the parameters attach relies on
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("database name must not be empty"));
        }
        Ok(())
    }
}
