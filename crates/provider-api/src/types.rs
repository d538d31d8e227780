// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider-neutral data model for catalogs, quotes, orders and balances

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::OrderState;

use crate::{ProviderError, ProviderResult};

/// Stock sentinel meaning the provider does not limit quantity
pub const UNLIMITED_STOCK: i64 = -1;

/// Daily window during which a product cannot be ordered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffWindow {
    /// Start of the window, provider-formatted local time (e.g. `23:45`)
    pub start: String,
    /// End of the window
    pub end: String,
}

impl CutoffWindow {
    /// Build a window from raw provider fields
    ///
    /// Returns `None` when both ends are blank or identical, which providers use
    /// to mean "no cutoff".
    pub fn from_bounds(start: &str, end: &str) -> Option<Self> {
        let (start, end) = (start.trim(), end.trim());
        if (start.is_empty() && end.is_empty()) || start == end {
            return None;
        }
        Some(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// One product as listed live by a provider
///
/// The sku is local to the provider that listed it and is never merged with
/// skus from other providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub product_type: String,
    /// What the provider charges us
    pub cost_price: Decimal,
    /// Price the provider advertises for resale
    pub sell_price: Decimal,
    pub active: bool,
    pub available: bool,
    /// Units left, or [`UNLIMITED_STOCK`]
    pub stock: i64,
    pub multi_unit: bool,
    pub cutoff: Option<CutoffWindow>,
}

impl CatalogItem {
    /// Check if the provider does not limit quantity for this item
    pub fn is_unlimited(&self) -> bool {
        self.stock == UNLIMITED_STOCK
    }

    /// Derive a price quote from this catalog entry
    pub fn quote(&self) -> PriceQuote {
        PriceQuote {
            sku: self.sku.clone(),
            price: self.sell_price,
            cost_price: self.cost_price,
            available: self.available,
            stock: self.stock,
        }
    }
}

/// Current price of one sku at one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub sku: String,
    /// Price compared during provider selection
    pub price: Decimal,
    pub cost_price: Decimal,
    pub available: bool,
    pub stock: i64,
}

/// Look up `sku` in a freshly fetched catalog
///
/// Used by providers that have no dedicated price endpoint.
///
/// # Errors
///
/// Returns [`ProviderError::NotFound`] if the catalog does not list `sku`
pub fn quote_from_catalog(catalog: &[CatalogItem], sku: &str) -> ProviderResult<PriceQuote> {
    catalog
        .iter()
        .find(|item| item.sku == sku)
        .map(CatalogItem::quote)
        .ok_or_else(|| ProviderError::sku_not_found(sku))
}

/// Order submitted by the caller
///
/// `reference_id` is unique per caller and doubles as the correlation key for
/// status polling and webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub reference_id: String,
    pub sku: String,
    /// Account, phone number or game id receiving the goods
    pub destination: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub customer_data: HashMap<String, String>,
}

impl OrderRequest {
    /// Create an order request without extra customer data
    pub fn new(
        reference_id: impl Into<String>,
        sku: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            sku: sku.into(),
            destination: destination.into(),
            customer_data: HashMap::new(),
        }
    }
}

/// Raw wire exchange kept for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExchange {
    pub request: String,
    pub response: String,
}

/// Provider answer to an order submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub reference_id: String,
    pub provider_reference_id: String,
    pub sku: String,
    pub destination: String,
    pub cost_price: Decimal,
    pub sell_price: Decimal,
    pub state: OrderState,
    pub message: String,
    /// Serial or voucher code, empty until fulfilled
    pub serial: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawExchange>,
}

/// Latest known status of a submitted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub reference_id: String,
    pub provider_reference_id: String,
    pub state: OrderState,
    pub message: String,
    pub serial: String,
    pub updated_at: DateTime<Utc>,
}

/// Live deposit balance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Decimal,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, price: i64, available: bool) -> CatalogItem {
        CatalogItem {
            sku: sku.to_string(),
            name: format!("{sku} product"),
            description: String::new(),
            category: "Games".to_string(),
            brand: "MOBILE LEGENDS".to_string(),
            product_type: "Umum".to_string(),
            cost_price: Decimal::from(price),
            sell_price: Decimal::from(price),
            active: available,
            available,
            stock: UNLIMITED_STOCK,
            multi_unit: false,
            cutoff: None,
        }
    }

    #[test]
    fn cutoff_window_bounds() {
        assert!(CutoffWindow::from_bounds("", "").is_none());
        assert!(CutoffWindow::from_bounds("0:0", "0:0").is_none());

        let window = CutoffWindow::from_bounds("23:45", "00:15").unwrap();
        assert_eq!(window.start, "23:45");
        assert_eq!(window.end, "00:15");
    }

    #[test]
    fn quote_from_catalog_finds_sku() {
        let catalog = vec![item("ML5", 1500, true), item("ML10", 2900, false)];

        let quote = quote_from_catalog(&catalog, "ML10").unwrap();
        assert_eq!(quote.sku, "ML10");
        assert_eq!(quote.price, Decimal::from(2900));
        assert!(!quote.available);
        assert_eq!(quote.stock, UNLIMITED_STOCK);
    }

    #[test]
    fn quote_from_catalog_unknown_sku() {
        let catalog = vec![item("ML5", 1500, true)];
        let result = quote_from_catalog(&catalog, "FF100");
        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
    }

    #[test]
    fn unlimited_stock_sentinel() {
        let mut entry = item("ML5", 1500, true);
        assert!(entry.is_unlimited());
        entry.stock = 12;
        assert!(!entry.is_unlimited());
    }
}
