// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Shared test fixtures
//!
//! Stub adapters with scripted prices and health, plus wiremock helpers for the
//! adapter conformance tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use provider_api::{
    Balance, CatalogItem, OrderRequest, OrderResult, OrderState, OrderStatus, PriceQuote, Provider,
    ProviderError, ProviderResult, SignatureScheme, UNLIMITED_STOCK,
};
use rust_decimal::Decimal;
use serde_json::Value;
use wiremock::{Match, Request};

/// Scripted health check behaviour
#[derive(Debug, Clone)]
pub enum HealthBehaviour {
    Healthy,
    Failing(&'static str),
    Hanging,
    Panicking,
    /// Healthy, after the given delay
    Delayed(Duration),
}

/// In-memory adapter with scripted answers
#[derive(Debug)]
pub struct StubProvider {
    name: &'static str,
    quotes: HashMap<String, (Decimal, bool)>,
    health: HealthBehaviour,
    catalog_delay: Option<Duration>,
    catalog_error: bool,
    balance: Option<Decimal>,
    pub health_checks: AtomicUsize,
    pub price_checks: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            quotes: HashMap::new(),
            health: HealthBehaviour::Healthy,
            catalog_delay: None,
            catalog_error: false,
            balance: None,
            health_checks: AtomicUsize::new(0),
            price_checks: AtomicUsize::new(0),
        }
    }

    pub fn with_quote(mut self, sku: &str, price: i64, available: bool) -> Self {
        self.quotes
            .insert(sku.to_string(), (Decimal::from(price), available));
        self
    }

    pub fn with_health(mut self, health: HealthBehaviour) -> Self {
        self.health = health;
        self
    }

    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = Some(delay);
        self
    }

    pub fn with_failing_catalog(mut self) -> Self {
        self.catalog_error = true;
        self
    }

    pub fn with_balance(mut self, amount: i64) -> Self {
        self.balance = Some(Decimal::from(amount));
        self
    }

    pub fn health_check_count(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn price_check_count(&self) -> usize {
        self.price_checks.load(Ordering::SeqCst)
    }

    fn catalog(&self) -> Vec<CatalogItem> {
        let mut items: Vec<_> = self
            .quotes
            .iter()
            .map(|(sku, (price, available))| CatalogItem {
                sku: sku.clone(),
                name: sku.clone(),
                description: String::new(),
                category: "Games".to_string(),
                brand: "TEST".to_string(),
                product_type: "Umum".to_string(),
                cost_price: *price,
                sell_price: *price,
                active: *available,
                available: *available,
                stock: UNLIMITED_STOCK,
                multi_unit: false,
                cutoff: None,
            })
            .collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        items
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>> {
        if let Some(delay) = self.catalog_delay {
            tokio::time::sleep(delay).await;
        }
        if self.catalog_error {
            return Err(ProviderError::api(format!("{} catalog unavailable", self.name)));
        }
        Ok(self.catalog())
    }

    async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote> {
        self.price_checks.fetch_add(1, Ordering::SeqCst);
        let (price, available) = self
            .quotes
            .get(sku)
            .ok_or_else(|| ProviderError::sku_not_found(sku))?;
        Ok(PriceQuote {
            sku: sku.to_string(),
            price: *price,
            cost_price: *price,
            available: *available,
            stock: UNLIMITED_STOCK,
        })
    }

    async fn create_order(&self, request: &OrderRequest) -> ProviderResult<OrderResult> {
        let (price, _) = self
            .quotes
            .get(&request.sku)
            .ok_or_else(|| ProviderError::sku_not_found(&request.sku))?;
        Ok(OrderResult {
            reference_id: request.reference_id.clone(),
            provider_reference_id: format!("{}-{}", self.name, request.reference_id),
            sku: request.sku.clone(),
            destination: request.destination.clone(),
            cost_price: *price,
            sell_price: *price,
            state: OrderState::Pending,
            message: "accepted".to_string(),
            serial: String::new(),
            created_at: Utc::now(),
            raw: None,
        })
    }

    async fn check_status(&self, reference_id: &str) -> ProviderResult<OrderStatus> {
        Ok(OrderStatus {
            reference_id: reference_id.to_string(),
            provider_reference_id: format!("{}-{reference_id}", self.name),
            state: OrderState::Success,
            message: "done".to_string(),
            serial: "SN-1".to_string(),
            updated_at: Utc::now(),
        })
    }

    async fn balance(&self) -> ProviderResult<Balance> {
        let amount = self
            .balance
            .ok_or_else(|| ProviderError::api("balance unavailable"))?;
        Ok(Balance {
            amount,
            currency: "IDR".to_string(),
            observed_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        match &self.health {
            HealthBehaviour::Healthy => Ok(()),
            HealthBehaviour::Failing(reason) => Err(ProviderError::api(*reason)),
            HealthBehaviour::Hanging => std::future::pending().await,
            HealthBehaviour::Panicking => panic!("health check exploded"),
            HealthBehaviour::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }

    fn normalize_status(&self, _raw: &str) -> OrderState {
        OrderState::Processing
    }
}

/// Matches BangJeff requests whose signature is valid for their own timestamp
#[derive(Debug)]
pub struct BangJeffSignature {
    pub member_id: &'static str,
    pub secret: &'static str,
    pub fields: Vec<&'static str>,
}

impl Match for BangJeffSignature {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        let Some(timestamp) = body["timestamp"].as_i64() else {
            return false;
        };
        let Ok(scheme) = SignatureScheme::hmac_sha256(self.secret) else {
            return false;
        };

        let timestamp = timestamp.to_string();
        let mut parts = vec![self.member_id];
        parts.extend(self.fields.iter().copied());
        parts.push(&timestamp);

        body["member_id"].as_str() == Some(self.member_id)
            && body["signature"].as_str() == Some(scheme.sign(&parts).as_str())
    }
}
