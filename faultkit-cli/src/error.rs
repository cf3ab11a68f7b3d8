//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// No scenario with this name exists
    UnknownScenario(String),
    /// Nothing was selected to run
    NoScenarios,
    /// Configuration error
    ConfigError(String),
    /// Fault kind registry could not be prepared
    RegistryError(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::UnknownScenario(name) => write!(f, "Unknown scenario: {name}"),
            CliError::NoScenarios => write!(f, "No scenarios selected (name one or pass --all)"),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::RegistryError(msg) => write!(f, "Fault kind registry error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scenario_display() {
        let error = CliError::UnknownScenario("stack-overflow".to_string());
        assert_eq!(error.to_string(), "Unknown scenario: stack-overflow");
    }

    #[test]
    fn test_no_scenarios_display() {
        assert_eq!(
            CliError::NoScenarios.to_string(),
            "No scenarios selected (name one or pass --all)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = CliError::ConfigError("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_registry_error_display() {
        let error = CliError::RegistryError("fault kind 'Timeout' is already registered".to_string());
        assert!(error.to_string().starts_with("Fault kind registry error:"));
    }

    #[test]
    fn test_cli_result_type_alias() {
        let failure: CliResult<()> = Err(CliError::NoScenarios.into());
        let message = failure.unwrap_err().to_string();
        assert!(message.contains("No scenarios selected"));
    }
}
