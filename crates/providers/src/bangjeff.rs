// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! BangJeff game top-up API integration
//!
//! Requests carry `member_id`, a unix `timestamp` and a hex HMAC-SHA256
//! `signature` keyed with the secret over `member_id + fields + timestamp`.
//! Responses use a `{success, code, message, data}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use provider_api::{
    Balance, CatalogItem, OrderRequest, OrderResult, OrderState, OrderStatus, PriceQuote, Provider,
    ProviderError, ProviderResult, SignatureScheme, StatusVocabulary, WebhookGuard,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    credential::Credential,
    transport::{Exchange, JsonTransport},
};

/// Registered provider name
pub const BANGJEFF: &str = "bangjeff";

const DEFAULT_BANGJEFF_BASE_URL: &str = "https://api.bangjeff.id/v1";
const DEFAULT_BANGJEFF_TIMEOUT_SECONDS: u64 = 30;
const BANGJEFF_CURRENCY: &str = "IDR";
const BANGJEFF_NOT_FOUND_CODE: i64 = 404;

/// BangJeff transaction statuses
pub const BANGJEFF_STATUSES: StatusVocabulary = StatusVocabulary::new(&[
    ("success", OrderState::Success),
    ("completed", OrderState::Success),
    ("sukses", OrderState::Success),
    ("failed", OrderState::Failed),
    ("error", OrderState::Failed),
    ("gagal", OrderState::Failed),
    ("pending", OrderState::Pending),
    ("processing", OrderState::Processing),
    ("proses", OrderState::Processing),
]);

/// Configuration for the BangJeff API client
#[derive(Debug, Clone)]
pub struct BangJeffConfig {
    /// Base URL for the BangJeff API
    pub base_url: String,
    /// Reseller member id
    pub member_id: Credential,
    /// HMAC key for request signatures
    pub secret_key: Credential,
    /// Token echoed by status callbacks; callbacks are rejected without it
    pub webhook_token: Option<Credential>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl BangJeffConfig {
    /// Configuration with default endpoint and timeout
    pub fn new(member_id: Credential, secret_key: Credential) -> Self {
        Self {
            base_url: DEFAULT_BANGJEFF_BASE_URL.to_string(),
            member_id,
            secret_key,
            webhook_token: None,
            timeout_seconds: DEFAULT_BANGJEFF_TIMEOUT_SECONDS,
        }
    }
}

/// BangJeff API client implementation
#[derive(Debug)]
pub struct BangJeffClient {
    transport: JsonTransport,
    member_id: Credential,
    signer: SignatureScheme,
    guard: WebhookGuard,
}

#[derive(Debug, Serialize)]
struct BangJeffRequest<'a> {
    member_id: &'a str,
    signature: String,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_no: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BangJeffEnvelope {
    success: bool,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// Product entry from the catalog and price endpoints
#[derive(Debug, Deserialize)]
pub struct BangJeffProduct {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    pub price: Decimal,
    #[serde(default)]
    pub seller_price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stock: i64,
}

impl BangJeffProduct {
    fn is_listed(&self) -> bool {
        matches!(self.status.as_str(), "active" | "available")
    }
}

/// Transaction as returned by order submission, status polling and callbacks
#[derive(Debug, Deserialize)]
pub struct BangJeffTransaction {
    #[serde(default)]
    pub transaction_id: String,
    pub ref_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub customer_no: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub selling_price: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sn: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
struct BangJeffBalance {
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct BangJeffCallback {
    data: BangJeffTransaction,
}

impl From<BangJeffProduct> for CatalogItem {
    fn from(product: BangJeffProduct) -> Self {
        let listed = product.is_listed();
        CatalogItem {
            sku: product.product_id,
            name: product.name,
            description: product.description,
            category: product.category,
            brand: product.brand,
            product_type: product.product_type,
            cost_price: product.seller_price,
            sell_price: product.price,
            active: listed,
            available: listed,
            stock: product.stock,
            multi_unit: false,
            cutoff: None,
        }
    }
}

impl BangJeffClient {
    /// Create a new BangJeff API client
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the timeout is zero, the base
    /// URL is invalid or the HTTP client cannot be created
    pub fn new(config: BangJeffConfig) -> ProviderResult<Self> {
        if config.timeout_seconds == 0 {
            return Err(ProviderError::config("timeout_seconds must be positive"));
        }

        let transport = JsonTransport::new(
            BANGJEFF,
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )?;
        let signer = SignatureScheme::hmac_sha256(config.secret_key.expose())?;
        let guard = config
            .webhook_token
            .as_ref()
            .map_or(WebhookGuard::Disabled, |token| {
                WebhookGuard::shared_token(token.expose())
            });

        Ok(Self {
            transport,
            member_id: config.member_id,
            signer,
            guard,
        })
    }

    /// Signature over `member_id + fields + timestamp`
    pub fn sign(&self, fields: &[&str], timestamp: i64) -> String {
        let timestamp = timestamp.to_string();
        let mut parts = Vec::with_capacity(fields.len() + 2);
        parts.push(self.member_id.expose());
        parts.extend_from_slice(fields);
        parts.push(&timestamp);
        self.signer.sign(&parts)
    }

    fn request<'a>(&'a self, fields: &[&str]) -> BangJeffRequest<'a> {
        let timestamp = Utc::now().timestamp();
        BangJeffRequest {
            member_id: self.member_id.expose(),
            signature: self.sign(fields, timestamp),
            timestamp,
            product_id: None,
            ref_id: None,
            customer_no: None,
        }
    }

    fn to_status(&self, transaction: BangJeffTransaction) -> OrderStatus {
        OrderStatus {
            state: self.normalize_status(&transaction.status),
            reference_id: transaction.ref_id,
            provider_reference_id: transaction.transaction_id,
            message: transaction.message,
            serial: transaction.sn,
            updated_at: Utc::now(),
        }
    }
}

/// Extract `data`, turning `success: false` into [`ProviderError::Api`]
fn unwrap_data<T: DeserializeOwned>(exchange: &Exchange) -> ProviderResult<T> {
    let envelope: BangJeffEnvelope = exchange.decode()?;
    if !envelope.success {
        debug!(provider = BANGJEFF, code = envelope.code, "request rejected");
        return Err(ProviderError::api(envelope.message));
    }
    Ok(serde_json::from_value(envelope.data)?)
}

/// Decode a price lookup, reporting an unlisted product as not found
///
/// The price endpoint signals an unknown product with HTTP 404, envelope code
/// 404, or a successful envelope without data.
fn unwrap_product(exchange: &Exchange, sku: &str) -> ProviderResult<BangJeffProduct> {
    if exchange.status == StatusCode::NOT_FOUND {
        return Err(ProviderError::sku_not_found(sku));
    }
    let envelope: BangJeffEnvelope = exchange.decode()?;
    if envelope.code == BANGJEFF_NOT_FOUND_CODE {
        return Err(ProviderError::sku_not_found(sku));
    }
    if !envelope.success {
        debug!(provider = BANGJEFF, code = envelope.code, "price lookup rejected");
        return Err(ProviderError::api(envelope.message));
    }
    let empty = match &envelope.data {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ProviderError::sku_not_found(sku));
    }
    Ok(serde_json::from_value(envelope.data)?)
}

#[async_trait]
impl Provider for BangJeffClient {
    fn name(&self) -> &str {
        BANGJEFF
    }

    async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>> {
        let body = self.request(&[]);
        let exchange = self.transport.post("list_catalog", "/products", &body).await?;
        let products: Vec<BangJeffProduct> = unwrap_data(&exchange)?;
        debug!(provider = BANGJEFF, count = products.len(), "fetched products");

        Ok(products.into_iter().map(CatalogItem::from).collect())
    }

    async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote> {
        let mut body = self.request(&[sku]);
        body.product_id = Some(sku);

        let exchange = self.transport.post("check_price", "/products/price", &body).await?;
        let product = unwrap_product(&exchange, sku)?;
        Ok(CatalogItem::from(product).quote())
    }

    async fn create_order(&self, request: &OrderRequest) -> ProviderResult<OrderResult> {
        let mut body = self.request(&[
            request.reference_id.as_str(),
            request.sku.as_str(),
            request.destination.as_str(),
        ]);
        body.ref_id = Some(request.reference_id.as_str());
        body.product_id = Some(request.sku.as_str());
        body.customer_no = Some(request.destination.as_str());

        info!(
            provider = BANGJEFF,
            reference_id = %request.reference_id,
            sku = %request.sku,
            "submitting order"
        );
        let exchange = self.transport.post("create_order", "/transaction", &body).await?;
        let transaction: BangJeffTransaction = unwrap_data(&exchange)?;
        let state = self.normalize_status(&transaction.status);
        info!(
            provider = BANGJEFF,
            reference_id = %request.reference_id,
            transaction_id = %transaction.transaction_id,
            %state,
            "order accepted"
        );

        Ok(OrderResult {
            reference_id: transaction.ref_id,
            provider_reference_id: transaction.transaction_id,
            sku: transaction.product_id,
            destination: transaction.customer_no,
            cost_price: transaction.price,
            sell_price: transaction.selling_price,
            state,
            message: transaction.message,
            serial: transaction.sn,
            created_at: Utc::now(),
            raw: Some(exchange.raw()),
        })
    }

    async fn check_status(&self, reference_id: &str) -> ProviderResult<OrderStatus> {
        let mut body = self.request(&[reference_id]);
        body.ref_id = Some(reference_id);

        let exchange = self
            .transport
            .post("check_status", "/transaction/status", &body)
            .await?;
        let transaction: BangJeffTransaction = unwrap_data(&exchange)?;
        Ok(self.to_status(transaction))
    }

    async fn balance(&self) -> ProviderResult<Balance> {
        let body = self.request(&[]);
        let exchange = self.transport.post("balance", "/balance", &body).await?;
        let balance: BangJeffBalance = unwrap_data(&exchange)?;
        Ok(Balance {
            amount: balance.balance,
            currency: BANGJEFF_CURRENCY.to_string(),
            observed_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.balance().await.map(|_| ())
    }

    fn normalize_status(&self, raw: &str) -> OrderState {
        BANGJEFF_STATUSES.normalize(raw)
    }

    fn validate_webhook(&self, body: &[u8], credential: Option<&str>) -> ProviderResult<OrderStatus> {
        if let Err(error) = self.guard.authorize(body, credential) {
            warn!(provider = BANGJEFF, %error, "rejected callback");
            return Err(error);
        }
        let callback: BangJeffCallback = serde_json::from_slice(body)?;
        Ok(self.to_status(callback.data))
    }
}
