use miette::Diagnostic;
use thiserror::Error;

use crate::{UserId, db::DatabaseError};

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Database operation failed")]
    #[diagnostic(
        code(portrait_core::database),
        help("Check that the database path is writable and not opened by another process")
    )]
    Database(#[from] DatabaseError),

    #[error("Configuration error")]
    #[diagnostic(
        code(portrait_core::configuration_error),
        help("Check configuration file at {config_path}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("Missing required setting '{field}'")]
    #[diagnostic(
        code(portrait_core::missing_setting),
        help("Set `{field}` in the config file or export {env_var}")
    )]
    MissingSetting { field: String, env_var: String },

    #[error("User {user_id} is not registered")]
    #[diagnostic(
        code(portrait_core::user_not_found),
        help("The user has to send /start to the bot first")
    )]
    UserNotFound { user_id: UserId },
}

/// Underlying causes of configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn missing_setting(field: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingSetting {
            field: field.into(),
            env_var: env_var.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn missing_setting_names_the_env_var() {
        let report = Report::new(CoreError::missing_setting("telegram.token", "TELEGRAM_TOKEN"));
        let output = format!("{:?}", report);
        assert!(output.contains("missing_setting"));
        assert!(output.contains("TELEGRAM_TOKEN"));
    }
}
