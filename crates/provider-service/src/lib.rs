// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider Service Implementation
//!
//! This crate hosts the provider manager as a long-running daemon: it loads
//! layered configuration, registers every enabled fulfillment adapter, keeps
//! the health monitor running and shuts down cleanly on SIGINT/SIGTERM.
//!
//! # Module Structure
//!
//! - [`config`]: Service configuration and environment management with hierarchical loading
//! - [`error`]: Error types for configuration, adapter construction and lifecycle
//! - [`service`]: Adapter registration, monitor lifecycle and coordinated shutdown
//!
//! # Key Features
//!
//! - **Layered Configuration**: defaults, `config.json`, `config.{env}.json`, then `FULFILLMENT__*` variables
//! - **Validated Settings**: timeouts and intervals are rejected at load time when out of range
//! - **Graceful Shutdown**: coordinated termination using `CancellationToken`
//! - **Production Safety**: Digiflazz orders run in testing mode outside production

pub mod config;
pub mod error;
pub mod service;

pub use config::{Environment, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use service::Service;
