// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by every provider adapter and the provider manager

use std::fmt;

use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures below the provider's own response envelope
///
/// These are potentially retryable: the request may never have reached the
/// provider, or its answer could not be read.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum TransportError {
    /// Request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was interrupted
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Non-success HTTP status with a body that is not a provider envelope
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("malformed response: {message}")]
    Decode { message: String },
}

/// Kind of entity a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Provider-local product identifier
    Sku,
    /// Registered provider name
    Provider,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Sku => write!(f, "sku"),
            Resource::Provider => write!(f, "provider"),
        }
    }
}

/// Errors surfaced by provider adapters and the provider manager
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    /// Network, timeout or malformed payload
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The provider answered with an explicit failure envelope
    #[error("provider API error: {message}")]
    Api { message: String },

    /// Unknown sku or provider name
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    /// Selection exhausted every candidate
    #[error("no available provider for sku: {sku}")]
    NoProviderAvailable { sku: String },

    /// Inbound callback failed token or signature verification
    #[error("webhook authentication failed: {reason}")]
    WebhookAuth { reason: String },

    /// Adapter could not be constructed from the supplied settings
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ProviderError {
    /// Create a provider API error
    pub fn api<T: ToString>(message: T) -> Self {
        Self::Api {
            message: message.to_string(),
        }
    }

    /// Create a not-found error for an unknown sku
    pub fn sku_not_found<T: ToString>(sku: T) -> Self {
        Self::NotFound {
            resource: Resource::Sku,
            id: sku.to_string(),
        }
    }

    /// Create a not-found error for an unregistered provider
    pub fn provider_not_found<T: ToString>(name: T) -> Self {
        Self::NotFound {
            resource: Resource::Provider,
            id: name.to_string(),
        }
    }

    /// Create a webhook authentication error
    pub fn webhook_auth<T: ToString>(reason: T) -> Self {
        Self::WebhookAuth {
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create a decode error for a payload that could not be interpreted
    pub fn decode<T: ToString>(message: T) -> Self {
        Self::Transport(TransportError::Decode {
            message: message.to_string(),
        })
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Decode {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Transport(error.into())
    }
}
