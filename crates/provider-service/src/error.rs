// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Error types for the service lifecycle: configuration, adapter construction,
//! signal handling and background task supervision.

use provider_api::ProviderError;
use thiserror::Error;

/// Error types for service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Adapter construction or manager errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Signal handler registration errors
    #[error("Signal handling error: {source}")]
    Signal {
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ServiceError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
