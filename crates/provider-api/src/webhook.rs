// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Inbound callback authentication
//!
//! A [`WebhookGuard`] decides whether a raw callback may be decoded at all.
//! Every failure path returns [`ProviderError::WebhookAuth`] so the callback is
//! rejected before any status is produced.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{ProviderError, ProviderResult, signature::constant_time_eq};

type HmacSha1 = Hmac<Sha1>;

const SHA1_SIGNATURE_PREFIX: &str = "sha1=";

/// Authentication recipe for a provider's status callbacks
#[derive(Clone)]
pub enum WebhookGuard {
    /// Provider echoes a static shared token
    SharedToken(String),
    /// Provider signs the raw body with HMAC-SHA1, sent as `sha1=<hex>`
    HmacSha1Body(HmacSha1),
    /// No secret configured; every callback is rejected
    Disabled,
}

impl fmt::Debug for WebhookGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookGuard::SharedToken(_) => f.write_str("WebhookGuard::SharedToken(<redacted>)"),
            WebhookGuard::HmacSha1Body(_) => f.write_str("WebhookGuard::HmacSha1Body(<redacted>)"),
            WebhookGuard::Disabled => f.write_str("WebhookGuard::Disabled"),
        }
    }
}

impl WebhookGuard {
    /// Static token guard; a blank token disables callbacks
    pub fn shared_token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            WebhookGuard::Disabled
        } else {
            WebhookGuard::SharedToken(token)
        }
    }

    /// Body signature guard; a blank secret disables callbacks
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the key is rejected
    pub fn hmac_sha1(secret: impl AsRef<[u8]>) -> ProviderResult<Self> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Ok(WebhookGuard::Disabled);
        }
        let mac = HmacSha1::new_from_slice(secret)
            .map_err(|e| ProviderError::config(format!("invalid webhook secret: {e}")))?;
        Ok(WebhookGuard::HmacSha1Body(mac))
    }

    /// Signature header a legitimate sender would attach to `body`
    ///
    /// `None` for guards that do not sign bodies.
    pub fn expected_signature(&self, body: &[u8]) -> Option<String> {
        match self {
            WebhookGuard::HmacSha1Body(prototype) => {
                let mut mac = prototype.clone();
                mac.update(body);
                Some(format!(
                    "{SHA1_SIGNATURE_PREFIX}{}",
                    hex::encode(mac.finalize().into_bytes())
                ))
            }
            WebhookGuard::SharedToken(_) | WebhookGuard::Disabled => None,
        }
    }

    /// Authenticate a raw callback
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::WebhookAuth`] when the credential is missing,
    /// does not match, or callbacks are disabled
    pub fn authorize(&self, body: &[u8], credential: Option<&str>) -> ProviderResult<()> {
        match self {
            WebhookGuard::Disabled => Err(ProviderError::webhook_auth(
                "webhook secret not configured",
            )),
            WebhookGuard::SharedToken(token) => {
                let presented = credential.ok_or_else(|| ProviderError::webhook_auth("missing token"))?;
                if constant_time_eq(token.as_bytes(), presented.trim().as_bytes()) {
                    Ok(())
                } else {
                    Err(ProviderError::webhook_auth("invalid token"))
                }
            }
            WebhookGuard::HmacSha1Body(prototype) => {
                let presented =
                    credential.ok_or_else(|| ProviderError::webhook_auth("missing signature"))?;
                let digest = presented
                    .trim()
                    .strip_prefix(SHA1_SIGNATURE_PREFIX)
                    .and_then(|hex_digest| hex::decode(hex_digest).ok())
                    .ok_or_else(|| ProviderError::webhook_auth("malformed signature"))?;

                let mut mac = prototype.clone();
                mac.update(body);
                mac.verify_slice(&digest)
                    .map_err(|_| ProviderError::webhook_auth("invalid signature"))
            }
        }
    }
}
