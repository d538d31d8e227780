// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Uniform adapter contract for digital-goods fulfillment providers
//!
//! This crate provides the abstractions every provider integration implements so
//! that order flows never contain provider-specific logic.
//!
//! # Core Abstractions
//!
//! - **`Provider` Trait**: catalog, pricing, ordering, status polling, balance, health and
//!   webhook validation against one external backend
//! - **Error Handling**: [`ProviderError`] separates transport failures (retryable) from
//!   explicit backend rejections (not retryable)
//! - **Signing**: [`SignatureScheme`] and [`WebhookGuard`] reproduce the per-provider digest
//!   recipes for outbound requests and inbound callbacks
//! - **Status Normalization**: [`StatusVocabulary`] maps provider status strings onto the
//!   canonical [`OrderState`]

use std::fmt;

use async_trait::async_trait;
pub use shared_types::{HealthState, OrderState};

pub mod error;
pub mod health;
pub mod signature;
pub mod types;
pub mod vocabulary;
pub mod webhook;

pub use error::*;
pub use health::*;
pub use signature::SignatureScheme;
pub use types::*;
pub use vocabulary::StatusVocabulary;
pub use webhook::WebhookGuard;

/// Contract implemented by every fulfillment backend integration
///
/// Adapters are immutable after construction apart from their HTTP client, so a
/// single instance can be shared behind an `Arc` across every caller. Each async
/// operation performs one outbound call (`check_price` may fall back to a full
/// catalog fetch) and can be abandoned by dropping the returned future.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// Registry key of this provider
    fn name(&self) -> &str;

    /// Fetch the live catalog
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] or [`ProviderError::Api`] if the fetch fails
    async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>>;

    /// Quote the current price of one provider-local sku
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the provider does not know `sku`
    async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote>;

    /// Submit an order
    ///
    /// The caller's reference id is forwarded verbatim; it is the only
    /// idempotency key the provider sees.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered or was rejected
    async fn create_order(&self, request: &OrderRequest) -> ProviderResult<OrderResult>;

    /// Poll the status of a previously submitted order
    ///
    /// # Errors
    ///
    /// Returns an error if the status could not be fetched
    async fn check_status(&self, reference_id: &str) -> ProviderResult<OrderStatus>;

    /// Fetch the live deposit balance held with this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the balance could not be fetched
    async fn balance(&self) -> ProviderResult<Balance>;

    /// Probe the provider; `Ok(())` means healthy
    ///
    /// # Errors
    ///
    /// Returns the failure that made the provider unhealthy
    async fn health_check(&self) -> ProviderResult<()>;

    /// Map a provider status string onto the canonical state
    fn normalize_status(&self, raw: &str) -> OrderState;

    /// Authenticate and decode an inbound status callback
    ///
    /// `credential` is the provider-supplied token or signature header, if any.
    /// Authentication happens before the payload is decoded.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::WebhookAuth`] if the callback cannot be authenticated,
    /// or [`ProviderError::Transport`] if the authenticated payload is malformed
    fn validate_webhook(&self, body: &[u8], credential: Option<&str>) -> ProviderResult<OrderStatus> {
        let _ = (body, credential);
        Err(ProviderError::webhook_auth(format!(
            "{} does not deliver webhook callbacks",
            self.name()
        )))
    }
}
