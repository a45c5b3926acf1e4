//! Error types and handling for the `OneWeather` engine

use thiserror::Error;

/// Main error type for the `OneWeather` engine
#[derive(Error, Debug)]
pub enum OneWeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl OneWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            OneWeatherError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            OneWeatherError::Validation { message } => {
                format!("Invalid input: {message}")
            }
        }
    }
}
