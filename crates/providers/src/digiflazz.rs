// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Digiflazz prepaid product API integration
//!
//! Every call is a JSON `POST` signed with `md5(username + api_key + X)`, where
//! `X` is the order reference for transactions, `pricelist` for the catalog and
//! `depo` for the balance. Responses wrap their payload in `{"data": ...}`; a
//! rejected request carries an `rc` response code in `data` but no `status`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use provider_api::{
    Balance, CatalogItem, CutoffWindow, OrderRequest, OrderResult, OrderState, OrderStatus,
    PriceQuote, Provider, ProviderError, ProviderResult, SignatureScheme, StatusVocabulary,
    UNLIMITED_STOCK, WebhookGuard, quote_from_catalog,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    credential::Credential,
    transport::{Exchange, JsonTransport},
};

/// Registered provider name
pub const DIGIFLAZZ: &str = "digiflazz";

const DEFAULT_DIGIFLAZZ_BASE_URL: &str = "https://api.digiflazz.com/v1";
const DEFAULT_DIGIFLAZZ_TIMEOUT_SECONDS: u64 = 30;
const DIGIFLAZZ_CURRENCY: &str = "IDR";

const PRICELIST_SIGN_SUFFIX: &str = "pricelist";
const DEPOSIT_SIGN_SUFFIX: &str = "depo";

/// Digiflazz transaction statuses
pub const DIGIFLAZZ_STATUSES: StatusVocabulary = StatusVocabulary::new(&[
    ("Sukses", OrderState::Success),
    ("Gagal", OrderState::Failed),
    ("Pending", OrderState::Pending),
]);

/// Configuration for the Digiflazz API client
#[derive(Debug, Clone)]
pub struct DigiflazzConfig {
    /// Base URL for the Digiflazz API
    pub base_url: String,
    /// Account username
    pub username: Credential,
    /// Production or development API key
    pub api_key: Credential,
    /// Secret for callback signatures; callbacks are rejected without it
    pub webhook_secret: Option<Credential>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Submit real transactions; otherwise orders carry `testing: true`
    pub production: bool,
}

impl DigiflazzConfig {
    /// Configuration with default endpoint and timeout, in testing mode
    pub fn new(username: Credential, api_key: Credential) -> Self {
        Self {
            base_url: DEFAULT_DIGIFLAZZ_BASE_URL.to_string(),
            username,
            api_key,
            webhook_secret: None,
            timeout_seconds: DEFAULT_DIGIFLAZZ_TIMEOUT_SECONDS,
            production: false,
        }
    }
}

/// Digiflazz API client implementation
#[derive(Debug)]
pub struct DigiflazzClient {
    transport: JsonTransport,
    username: Credential,
    api_key: Credential,
    guard: WebhookGuard,
    production: bool,
}

#[derive(Debug, Serialize)]
struct DigiflazzRequest<'a> {
    username: &'a str,
    sign: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer_sku_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_no: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cmd: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    testing: bool,
}

#[derive(Debug, Deserialize)]
struct DigiflazzEnvelope {
    #[serde(default)]
    data: Value,
}

/// Product entry from the price list
#[derive(Debug, Deserialize)]
pub struct DigiflazzProduct {
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub seller_name: String,
    pub price: Decimal,
    pub buyer_sku_code: String,
    #[serde(default)]
    pub buyer_product_status: bool,
    #[serde(default)]
    pub seller_product_status: bool,
    #[serde(default)]
    pub unlimited_stock: bool,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub start_cut_off: String,
    #[serde(default)]
    pub end_cut_off: String,
    #[serde(rename = "desc", default)]
    pub description: String,
}

/// Transaction as returned by order submission, status polling and callbacks
#[derive(Debug, Deserialize)]
pub struct DigiflazzTransaction {
    pub ref_id: String,
    #[serde(default)]
    pub customer_no: String,
    #[serde(default)]
    pub buyer_sku_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub rc: String,
    #[serde(default)]
    pub sn: String,
    #[serde(default)]
    pub buyer_last_saldo: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub selling_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct DigiflazzDeposit {
    deposit: Decimal,
}

#[derive(Debug, Deserialize)]
struct DigiflazzCallback {
    data: DigiflazzTransaction,
}

impl From<DigiflazzProduct> for CatalogItem {
    fn from(product: DigiflazzProduct) -> Self {
        let listed = product.buyer_product_status && product.seller_product_status;
        CatalogItem {
            cutoff: CutoffWindow::from_bounds(&product.start_cut_off, &product.end_cut_off),
            stock: if product.unlimited_stock {
                UNLIMITED_STOCK
            } else {
                product.stock
            },
            sku: product.buyer_sku_code,
            name: product.product_name,
            description: product.description,
            category: product.category,
            brand: product.brand,
            product_type: product.product_type,
            cost_price: product.price,
            sell_price: product.price,
            active: listed,
            available: listed,
            multi_unit: product.multi,
        }
    }
}

impl DigiflazzClient {
    /// Create a new Digiflazz API client
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the timeout is zero, the base
    /// URL is invalid or the HTTP client cannot be created
    pub fn new(config: DigiflazzConfig) -> ProviderResult<Self> {
        if config.timeout_seconds == 0 {
            return Err(ProviderError::config("timeout_seconds must be positive"));
        }

        let transport = JsonTransport::new(
            DIGIFLAZZ,
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )?;
        let guard = match &config.webhook_secret {
            Some(secret) => WebhookGuard::hmac_sha1(secret.expose())?,
            None => WebhookGuard::Disabled,
        };

        Ok(Self {
            transport,
            username: config.username,
            api_key: config.api_key,
            guard,
            production: config.production,
        })
    }

    /// Whether orders are submitted as real transactions
    pub fn is_production(&self) -> bool {
        self.production
    }

    fn sign(&self, suffix: &str) -> String {
        SignatureScheme::Md5.sign(&[self.username.expose(), self.api_key.expose(), suffix])
    }

    fn request(&self, suffix: &str) -> DigiflazzRequest<'_> {
        DigiflazzRequest {
            username: self.username.expose(),
            sign: self.sign(suffix),
            ref_id: None,
            buyer_sku_code: None,
            customer_no: None,
            cmd: None,
            testing: false,
        }
    }

    fn to_status(&self, transaction: DigiflazzTransaction) -> OrderStatus {
        OrderStatus {
            state: self.normalize_status(&transaction.status),
            provider_reference_id: transaction.ref_id.clone(),
            reference_id: transaction.ref_id,
            message: transaction.message,
            serial: transaction.sn,
            updated_at: Utc::now(),
        }
    }
}

/// Extract `data`, turning a rejection envelope into [`ProviderError::Api`]
fn unwrap_data<T: DeserializeOwned>(exchange: &Exchange) -> ProviderResult<T> {
    let envelope: DigiflazzEnvelope = exchange.decode()?;
    if let Some(message) = rejection(&envelope.data) {
        return Err(ProviderError::api(message));
    }
    Ok(serde_json::from_value(envelope.data)?)
}

/// `data` objects with a response code but no transaction status are rejections
fn rejection(data: &Value) -> Option<String> {
    let object = data.as_object()?;
    if object.contains_key("status") || !object.contains_key("rc") {
        return None;
    }
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("request rejected");
    let rc = object.get("rc").and_then(Value::as_str).unwrap_or_default();
    Some(format!("{message} (RC: {rc})"))
}

#[async_trait]
impl Provider for DigiflazzClient {
    fn name(&self) -> &str {
        DIGIFLAZZ
    }

    async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>> {
        let mut body = self.request(PRICELIST_SIGN_SUFFIX);
        body.cmd = Some("pricelist");

        let exchange = self.transport.post("list_catalog", "/price-list", &body).await?;
        let products: Vec<DigiflazzProduct> = unwrap_data(&exchange)?;
        debug!(provider = DIGIFLAZZ, count = products.len(), "fetched price list");

        Ok(products.into_iter().map(CatalogItem::from).collect())
    }

    async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote> {
        let catalog = self.list_catalog().await?;
        quote_from_catalog(&catalog, sku)
    }

    async fn create_order(&self, request: &OrderRequest) -> ProviderResult<OrderResult> {
        let mut body = self.request(&request.reference_id);
        body.ref_id = Some(request.reference_id.as_str());
        body.buyer_sku_code = Some(request.sku.as_str());
        body.customer_no = Some(request.destination.as_str());
        body.testing = !self.production;

        info!(
            provider = DIGIFLAZZ,
            reference_id = %request.reference_id,
            sku = %request.sku,
            testing = body.testing,
            "submitting order"
        );
        let exchange = self.transport.post("create_order", "/transaction", &body).await?;
        info!(
            provider = DIGIFLAZZ,
            reference_id = %request.reference_id,
            status = exchange.status.as_u16(),
            response = %exchange.response,
            "order response received"
        );

        let transaction: DigiflazzTransaction = unwrap_data(&exchange)?;
        let state = self.normalize_status(&transaction.status);
        let reference_id = if transaction.ref_id.is_empty() {
            request.reference_id.clone()
        } else {
            transaction.ref_id
        };

        Ok(OrderResult {
            provider_reference_id: reference_id.clone(),
            reference_id,
            sku: transaction.buyer_sku_code,
            destination: transaction.customer_no,
            cost_price: transaction.price,
            sell_price: transaction.selling_price,
            state,
            message: format!("{} (RC: {})", transaction.message, transaction.rc),
            serial: transaction.sn,
            created_at: Utc::now(),
            raw: Some(exchange.raw()),
        })
    }

    async fn check_status(&self, reference_id: &str) -> ProviderResult<OrderStatus> {
        let mut body = self.request(reference_id);
        body.ref_id = Some(reference_id);

        let exchange = self.transport.post("check_status", "/transaction", &body).await?;
        let transaction: DigiflazzTransaction = unwrap_data(&exchange)?;
        Ok(self.to_status(transaction))
    }

    async fn balance(&self) -> ProviderResult<Balance> {
        let mut body = self.request(DEPOSIT_SIGN_SUFFIX);
        body.cmd = Some("deposit");

        let exchange = self.transport.post("balance", "/cek-saldo", &body).await?;
        let deposit: DigiflazzDeposit = unwrap_data(&exchange)?;
        Ok(Balance {
            amount: deposit.deposit,
            currency: DIGIFLAZZ_CURRENCY.to_string(),
            observed_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.balance().await.map(|_| ())
    }

    fn normalize_status(&self, raw: &str) -> OrderState {
        DIGIFLAZZ_STATUSES.normalize(raw)
    }

    fn validate_webhook(&self, body: &[u8], credential: Option<&str>) -> ProviderResult<OrderStatus> {
        if let Err(error) = self.guard.authorize(body, credential) {
            warn!(provider = DIGIFLAZZ, %error, "rejected callback");
            return Err(error);
        }
        let callback: DigiflazzCallback = serde_json::from_slice(body)?;
        Ok(self.to_status(callback.data))
    }
}
