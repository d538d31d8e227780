// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Fulfillment provider adapters and orchestration
//!
//! This crate implements the [`provider_api::Provider`] trait for each supported
//! digital-goods backend and manages them as one pool through
//! [`ProviderManager`].
//!
//! # Architecture
//!
//! - **Adapters**: [`digiflazz`], [`bangjeff`], [`vipreseller`] - one per external API
//! - **Transport**: [`transport::JsonTransport`] - signed JSON `POST`s with raw capture
//! - **Registry**: [`registry::ProviderRegistry`] - name-keyed `Arc<dyn Provider>` set
//! - **Health**: [`monitor::HealthMonitor`] - periodic concurrent probes into a [`HealthTable`]
//! - **Manager**: [`manager::ProviderManager`] - selection, fan-out and monitor lifecycle
//! - **Credentials**: [`credential::Credential`] - non-blank, log-safe secrets
//!
//! # Features
//!
//! - **Price-based selection**: preferred provider first, then the cheapest healthy one
//! - **Concurrent health checks**: one task per probe, bounded by a timeout
//! - **Cancellable fan-outs**: partial results when the caller's token fires
//! - **Metrics**: Prometheus series for requests, probes and selections

pub mod bangjeff;
pub mod credential;
pub mod digiflazz;
pub mod manager;
pub mod metrics;
pub mod monitor;
pub mod registry;
pub mod transport;
pub mod vipreseller;

pub use bangjeff::{BANGJEFF, BangJeffClient, BangJeffConfig};
pub use credential::Credential;
pub use digiflazz::{DIGIFLAZZ, DigiflazzClient, DigiflazzConfig};
pub use manager::{CatalogSweep, FanOutError, ProviderManager, Selection};
pub use monitor::{HealthMonitor, HealthTable, RoundSummary};
pub use registry::ProviderRegistry;
pub use transport::{Exchange, JsonTransport};
pub use vipreseller::{VIP_RESELLER, VipResellerClient, VipResellerConfig};
