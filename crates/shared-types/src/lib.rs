// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the fulfillment workspace
//!
//! This crate provides the canonical state vocabularies that every provider
//! adapter and the provider manager agree on, avoiding circular dependencies
//! between the contract crate and its implementations.

pub mod health_state;
pub mod order_state;

pub use health_state::HealthState;
pub use order_state::{OrderState, ParseOrderStateError};
