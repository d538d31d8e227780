// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request signing recipes
//!
//! Providers authenticate requests with a digest over a fixed concatenation of
//! credential and request fields. Field order and algorithm are dictated by each
//! provider's API; adapters pass the fields in the exact order their backend
//! expects and this module only concatenates and digests them.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{ProviderError, ProviderResult};

type HmacSha256 = Hmac<Sha256>;

/// Digest algorithm used to sign outbound requests
#[derive(Clone)]
pub enum SignatureScheme {
    /// Unkeyed legacy digest; the shared secret is one of the concatenated fields
    Md5,
    /// Keyed digest with the shared secret as HMAC key
    HmacSha256(HmacSha256),
}

impl fmt::Debug for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureScheme::Md5 => f.write_str("SignatureScheme::Md5"),
            SignatureScheme::HmacSha256(_) => f.write_str("SignatureScheme::HmacSha256(<redacted>)"),
        }
    }
}

impl SignatureScheme {
    /// Keyed HMAC-SHA256 scheme
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the key is rejected
    pub fn hmac_sha256(key: impl AsRef<[u8]>) -> ProviderResult<Self> {
        let mac = HmacSha256::new_from_slice(key.as_ref())
            .map_err(|e| ProviderError::config(format!("invalid HMAC key: {e}")))?;
        Ok(SignatureScheme::HmacSha256(mac))
    }

    /// Lowercase hex digest over the concatenation of `fields`
    pub fn sign(&self, fields: &[&str]) -> String {
        let message = fields.concat();
        match self {
            SignatureScheme::Md5 => format!("{:x}", md5::compute(message.as_bytes())),
            SignatureScheme::HmacSha256(prototype) => {
                let mut mac = prototype.clone();
                mac.update(message.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Check a hex signature produced by the counterpart over the same fields
    pub fn verify(&self, fields: &[&str], signature: &str) -> bool {
        match self {
            SignatureScheme::Md5 => {
                let expected = self.sign(fields);
                constant_time_eq(
                    expected.as_bytes(),
                    signature.trim().to_ascii_lowercase().as_bytes(),
                )
            }
            SignatureScheme::HmacSha256(prototype) => {
                let Ok(candidate) = hex::decode(signature.trim()) else {
                    return false;
                };
                let mut mac = prototype.clone();
                mac.update(fields.concat().as_bytes());
                mac.verify_slice(&candidate).is_ok()
            }
        }
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
