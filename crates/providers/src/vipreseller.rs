// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! VIP Reseller game feature API integration
//!
//! Requests are authenticated by `key` (the API id) and a static
//! `sign = md5(api_id + api_key)`. The `/game-feature` endpoint multiplexes
//! catalog, order and status calls on the `type` field. Responses use a
//! `{result, message, data}` envelope. The API reports no stock and delivers no
//! signed callbacks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use provider_api::{
    Balance, CatalogItem, OrderRequest, OrderResult, OrderState, OrderStatus, PriceQuote, Provider,
    ProviderError, ProviderResult, SignatureScheme, StatusVocabulary, UNLIMITED_STOCK,
    quote_from_catalog,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    credential::Credential,
    transport::{Exchange, JsonTransport},
};

/// Registered provider name
pub const VIP_RESELLER: &str = "vipreseller";

const DEFAULT_VIP_RESELLER_BASE_URL: &str = "https://vip-reseller.co.id/api";
const DEFAULT_VIP_RESELLER_TIMEOUT_SECONDS: u64 = 30;
const VIP_RESELLER_CURRENCY: &str = "IDR";

/// VIP Reseller transaction statuses
pub const VIP_RESELLER_STATUSES: StatusVocabulary = StatusVocabulary::new(&[
    ("success", OrderState::Success),
    ("completed", OrderState::Success),
    ("failed", OrderState::Failed),
    ("error", OrderState::Failed),
    ("pending", OrderState::Pending),
    ("processing", OrderState::Processing),
]);

/// Configuration for the VIP Reseller API client
#[derive(Debug, Clone)]
pub struct VipResellerConfig {
    /// Base URL for the VIP Reseller API
    pub base_url: String,
    /// API id, sent as `key`
    pub api_id: Credential,
    /// API key, only used inside the signature
    pub api_key: Credential,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl VipResellerConfig {
    /// Configuration with default endpoint and timeout
    pub fn new(api_id: Credential, api_key: Credential) -> Self {
        Self {
            base_url: DEFAULT_VIP_RESELLER_BASE_URL.to_string(),
            api_id,
            api_key,
            timeout_seconds: DEFAULT_VIP_RESELLER_TIMEOUT_SECONDS,
        }
    }
}

/// VIP Reseller API client implementation
#[derive(Debug)]
pub struct VipResellerClient {
    transport: JsonTransport,
    api_id: Credential,
    sign: String,
}

#[derive(Debug, Serialize)]
struct VipRequest<'a> {
    key: &'a str,
    sign: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trx_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct VipEnvelope {
    result: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// Service entry from the catalog
#[derive(Debug, Deserialize)]
pub struct VipService {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub description: String,
}

/// Transaction as returned by order submission and status polling
#[derive(Debug, Deserialize)]
pub struct VipTransaction {
    pub trx_id: String,
    #[serde(default)]
    pub ref_id: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sn: String,
    #[serde(default)]
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct VipProfile {
    balance: Decimal,
}

impl From<VipService> for CatalogItem {
    fn from(service: VipService) -> Self {
        let listed = matches!(service.status.as_str(), "available" | "active");
        CatalogItem {
            sku: service.code,
            name: service.name,
            description: service.description,
            category: service.category,
            brand: service.brand,
            product_type: service.product_type,
            cost_price: service.price,
            sell_price: service.price,
            active: listed,
            available: listed,
            stock: UNLIMITED_STOCK,
            multi_unit: false,
            cutoff: None,
        }
    }
}

impl VipResellerClient {
    /// Create a new VIP Reseller API client
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the timeout is zero, the base
    /// URL is invalid or the HTTP client cannot be created
    pub fn new(config: VipResellerConfig) -> ProviderResult<Self> {
        if config.timeout_seconds == 0 {
            return Err(ProviderError::config("timeout_seconds must be positive"));
        }

        let transport = JsonTransport::new(
            VIP_RESELLER,
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )?;
        let sign = SignatureScheme::Md5.sign(&[config.api_id.expose(), config.api_key.expose()]);

        Ok(Self {
            transport,
            api_id: config.api_id,
            sign,
        })
    }

    fn request<'a>(&'a self, kind: &'a str) -> VipRequest<'a> {
        VipRequest {
            key: self.api_id.expose(),
            sign: &self.sign,
            kind,
            service: None,
            data: None,
            trx_id: None,
        }
    }
}

/// Extract `data`, turning `result: false` into [`ProviderError::Api`]
fn unwrap_data<T: DeserializeOwned>(exchange: &Exchange) -> ProviderResult<T> {
    let envelope: VipEnvelope = exchange.decode()?;
    if !envelope.result {
        return Err(ProviderError::api(envelope.message));
    }
    Ok(serde_json::from_value(envelope.data)?)
}

#[async_trait]
impl Provider for VipResellerClient {
    fn name(&self) -> &str {
        VIP_RESELLER
    }

    async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>> {
        let body = self.request("services");
        let exchange = self.transport.post("list_catalog", "/game-feature", &body).await?;
        let services: Vec<VipService> = unwrap_data(&exchange)?;
        debug!(provider = VIP_RESELLER, count = services.len(), "fetched services");

        Ok(services.into_iter().map(CatalogItem::from).collect())
    }

    async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote> {
        let catalog = self.list_catalog().await?;
        quote_from_catalog(&catalog, sku)
    }

    async fn create_order(&self, request: &OrderRequest) -> ProviderResult<OrderResult> {
        let mut body = self.request("order");
        body.service = Some(request.sku.as_str());
        body.data = Some(request.destination.as_str());

        info!(
            provider = VIP_RESELLER,
            reference_id = %request.reference_id,
            sku = %request.sku,
            "submitting order"
        );
        let exchange = self.transport.post("create_order", "/game-feature", &body).await?;
        let transaction: VipTransaction = unwrap_data(&exchange)?;
        let state = self.normalize_status(&transaction.status);
        info!(
            provider = VIP_RESELLER,
            reference_id = %request.reference_id,
            trx_id = %transaction.trx_id,
            %state,
            "order accepted"
        );

        Ok(OrderResult {
            reference_id: request.reference_id.clone(),
            provider_reference_id: transaction.trx_id,
            sku: transaction.service,
            destination: transaction.data,
            cost_price: transaction.price,
            sell_price: transaction.price,
            state,
            message: transaction.message,
            serial: transaction.sn,
            created_at: Utc::now(),
            raw: Some(exchange.raw()),
        })
    }

    /// Poll by VIP Reseller's own `trx_id`; the API has no caller reference lookup
    async fn check_status(&self, reference_id: &str) -> ProviderResult<OrderStatus> {
        let mut body = self.request("status");
        body.trx_id = Some(reference_id);

        let exchange = self.transport.post("check_status", "/game-feature", &body).await?;
        let transaction: VipTransaction = unwrap_data(&exchange)?;
        Ok(OrderStatus {
            state: self.normalize_status(&transaction.status),
            reference_id: transaction.ref_id,
            provider_reference_id: transaction.trx_id,
            message: transaction.message,
            serial: transaction.sn,
            updated_at: Utc::now(),
        })
    }

    async fn balance(&self) -> ProviderResult<Balance> {
        let body = self.request("profile");
        let exchange = self.transport.post("balance", "/profile", &body).await?;
        let profile: VipProfile = unwrap_data(&exchange)?;
        Ok(Balance {
            amount: profile.balance,
            currency: VIP_RESELLER_CURRENCY.to_string(),
            observed_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.balance().await.map(|_| ())
    }

    fn normalize_status(&self, raw: &str) -> OrderState {
        VIP_RESELLER_STATUSES.normalize(raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_client() -> VipResellerClient {
        VipResellerClient::new(VipResellerConfig::new(
            Credential::new("api-id").unwrap(),
            Credential::new("api-key").unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn static_signature() {
        let client = test_client();
        assert_eq!(client.sign, SignatureScheme::Md5.sign(&["api-idapi-key"]));
        assert_eq!(client.sign.len(), 32);
    }

    #[test]
    fn service_mapping_has_no_stock() {
        let service: VipService = serde_json::from_value(json!({
            "code": "ML86",
            "name": "MLBB 86 Diamonds",
            "price": 19500,
            "status": "available",
            "category": "Games",
            "brand": "MOBILE LEGENDS",
            "type": "Umum"
        }))
        .unwrap();

        let item = CatalogItem::from(service);
        assert_eq!(item.sku, "ML86");
        assert!(item.available);
        assert!(item.is_unlimited());
        assert_eq!(item.sell_price, Decimal::from(19500));
    }

    #[test]
    fn status_vocabulary() {
        let client = test_client();
        assert_eq!(client.normalize_status("success"), OrderState::Success);
        assert_eq!(client.normalize_status("completed"), OrderState::Success);
        assert_eq!(client.normalize_status("error"), OrderState::Failed);
        assert_eq!(client.normalize_status("pending"), OrderState::Pending);
        assert_eq!(client.normalize_status("waiting"), OrderState::Processing);
    }

    #[test]
    fn webhooks_fail_closed() {
        let client = test_client();
        let body = br#"{"data":{"trx_id":"VIP-1","status":"success"}}"#;
        assert!(matches!(
            client.validate_webhook(body, Some("anything")),
            Err(ProviderError::WebhookAuth { .. })
        ));
    }
}
