// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Validated provider credentials
//!
//! [`Credential`] guarantees a credential is not blank by construction, so an
//! adapter can never sign requests with an empty username or key. The value is
//! never printed through `Debug` or `Display`, which keeps secrets out of logs
//! when adapter configurations are traced.
//!
//! ```rust
//! use providers::Credential;
//!
//! let key = Credential::new("dev-7f3a").unwrap();
//! assert_eq!(key.expose(), "dev-7f3a");
//! assert_eq!(format!("{key:?}"), "Credential(<redacted>)");
//!
//! assert!(Credential::new("   ").is_err());
//! ```

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

/// A non-blank secret or identifier
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Box<str>);

impl Credential {
    /// Create a credential from any string-like input
    ///
    /// Surrounding whitespace is removed; a value that is empty afterwards is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns a descriptive message if the value is empty or whitespace-only
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err("credential cannot be empty or whitespace-only".to_string())
        } else {
            Ok(Credential(trimmed.into()))
        }
    }

    /// Build an optional credential, mapping blank input to `None`
    pub fn optional(s: impl Into<String>) -> Option<Self> {
        Self::new(s).ok()
    }

    /// Access the raw value for signing or request bodies
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl FromStr for Credential {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(de::Error::custom)
    }
}
