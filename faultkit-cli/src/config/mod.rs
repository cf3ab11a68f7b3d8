//! Configuration module

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use faultkit_core::{kind, CoreError, FaultKindRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use crate::scenarios::INSUFFICIENT_FUNDS;

/// CLI configuration structure
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct CliConfig {
    /// Fault kind configuration
    #[serde(default)]
    pub kinds: KindsConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Application fault kinds registered before any scenario runs
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct KindsConfig {
    /// Extra kind names, registered after the built-ins in this order
    #[serde(default)]
    pub custom: Vec<String>,
}

/// Output-related configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub default_format: String,

    /// Pretty print JSON output
    pub pretty_json: bool,

    /// Print fault context entries in text output
    pub show_context: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            pretty_json: true,
            show_context: false,
        }
    }
}

impl CliConfig {
    /// Read a TOML configuration file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&text).map_err(|e| CliError::ConfigError(e.to_string()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

impl OutputConfig {
    /// The configured default format
    pub fn format(&self) -> CliResult<OutputFormat> {
        OutputFormat::from_str(&self.default_format, true).map_err(|_| {
            CliError::ConfigError(format!(
                "unknown output format '{}' (expected text, json or markdown)",
                self.default_format
            ))
            .into()
        })
    }
}

impl KindsConfig {
    /// Names to register: the scenario kind followed by the configured ones
    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(INSUFFICIENT_FUNDS).chain(self.custom.iter().map(String::as_str))
    }

    /// Build a registry holding the built-ins and the configured kinds
    ///
    /// Custom names must be new: a built-in name or a repeated entry is a
    /// configuration error. Listing the scenario kind again is tolerated.
    pub fn registry(&self) -> CliResult<FaultKindRegistry> {
        let mut registry = FaultKindRegistry::new();
        registry
            .register(INSUFFICIENT_FUNDS)
            .map_err(|e| CliError::RegistryError(e.to_string()))?;
        for name in &self.custom {
            if name.trim() == INSUFFICIENT_FUNDS {
                log::debug!("Fault kind '{}' is registered by default", INSUFFICIENT_FUNDS);
                continue;
            }
            registry
                .register(name)
                .map_err(|e| CliError::ConfigError(e.to_string()))?;
        }
        Ok(registry)
    }

    /// Register the configured kinds and install the process-wide registry
    ///
    /// A registry installed earlier is accepted if it already knows every
    /// configured name.
    pub fn install(&self) -> CliResult<&'static FaultKindRegistry> {
        let registry = self.registry()?;
        if kind::is_installed() {
            return self.check_installed();
        }

        match registry.install() {
            Ok(installed) => {
                log::info!("Installed {} fault kinds", installed.len());
                Ok(installed)
            }
            Err(CoreError::RegistryInstalled) => self.check_installed(),
            Err(e) => Err(CliError::RegistryError(e.to_string()).into()),
        }
    }

    fn check_installed(&self) -> CliResult<&'static FaultKindRegistry> {
        let installed = kind::global();
        match self
            .names()
            .find(|name| installed.lookup(name.trim()).is_none())
        {
            Some(missing) => Err(CliError::RegistryError(format!(
                "registry already installed without '{}'",
                missing.trim()
            ))
            .into()),
            None => Ok(installed),
        }
    }
}
