//! Service error types.

use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} job did not finish within {timeout_secs}s")]
    Timeout {
        service: &'static str,
        timeout_secs: u64,
    },

    #[error("Malformed output from {service}: {message}")]
    MalformedOutput {
        service: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ServiceError {
    pub fn api(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            service,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
