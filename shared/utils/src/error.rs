use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PartPalError {
    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication error: {distributor} - {message}")]
    Authentication { distributor: String, message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },
}

impl PartPalError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn authentication(distributor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            distributor: distributor.into(),
            message: message.into(),
        }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Input { .. } => "INPUT_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
        }
    }
}

pub type PartPalResult<T> = Result<T, PartPalError>;

// Conversion from common error types
impl From<std::io::Error> for PartPalError {
    fn from(error: std::io::Error) -> Self {
        Self::input(error.to_string())
    }
}

impl From<csv::Error> for PartPalError {
    fn from(error: csv::Error) -> Self {
        Self::input(error.to_string())
    }
}

impl From<config::ConfigError> for PartPalError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<reqwest::Error> for PartPalError {
    fn from(error: reqwest::Error) -> Self {
        Self::external_service("HTTP Client", error.to_string())
    }
}

impl From<serde_json::Error> for PartPalError {
    fn from(error: serde_json::Error) -> Self {
        Self::external_service("JSON", error.to_string())
    }
}
