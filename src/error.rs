//! Error taxonomy shared by the loader, the forecaster and the CLI.
//!
//! Every variant is terminal for the current request. The binary maps each
//! one to a process exit code via [`AppError::exit_code`]:
//!
//! - `2`: input, schema, configuration or I/O problems
//! - `3`: no usable data
//! - `4`: model or numerical failures

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No snapshot files found in '{}'", dir.display())]
    NoDataFound { dir: PathBuf },

    #[error("Malformed date in {context}: '{value}' (expected {expected})")]
    MalformedDate {
        context: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid series: {message}")]
    InvalidSeries { message: String },

    #[error("Model fitting failed: {message}")]
    FitFailed { message: String },

    #[error("Schema error in '{}': {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NoDataFound { .. } => 3,
            AppError::InvalidSeries { .. } | AppError::FitFailed { .. } => 4,
            AppError::MalformedDate { .. }
            | AppError::Schema { .. }
            | AppError::UnknownService(_)
            | AppError::Config { .. }
            | AppError::Io { .. }
            | AppError::Csv(_)
            | AppError::Json(_) => 2,
        }
    }

    pub fn invalid_series(message: impl Into<String>) -> Self {
        AppError::InvalidSeries {
            message: message.into(),
        }
    }

    pub fn fit_failed(message: impl Into<String>) -> Self {
        AppError::FitFailed {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let no_data = AppError::NoDataFound {
            dir: PathBuf::from("data"),
        };
        assert_eq!(no_data.exit_code(), 3);
        assert_eq!(AppError::fit_failed("singular").exit_code(), 4);
        assert_eq!(AppError::invalid_series("zero").exit_code(), 4);
        assert_eq!(AppError::config("bad toml").exit_code(), 2);
    }

    #[test]
    fn fit_failed_carries_solver_message() {
        let err = AppError::fit_failed("simplex did not converge");
        assert!(err.to_string().contains("simplex did not converge"));
    }
}
