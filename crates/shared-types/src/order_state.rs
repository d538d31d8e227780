// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical order lifecycle states

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized order lifecycle state
///
/// Every provider-specific status string resolves to exactly one of these.
/// Only [`OrderState::Success`] and [`OrderState::Failed`] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderState {
    /// Accepted by the provider but not yet being worked on
    Pending,
    /// In flight at the provider, outcome not yet known
    Processing,
    /// Fulfilled; a serial or voucher code may be attached
    Success,
    /// Rejected or failed at the provider
    Failed,
}

/// Error returned when a string is not one of the canonical state names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order state: {0}")]
pub struct ParseOrderStateError(pub String);

impl OrderState {
    /// All canonical states
    pub const ALL: [OrderState; 4] = [
        OrderState::Pending,
        OrderState::Processing,
        OrderState::Success,
        OrderState::Failed,
    ];

    /// Check if the order has reached a final outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Success | OrderState::Failed)
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "PENDING",
            OrderState::Processing => "PROCESSING",
            OrderState::Success => "SUCCESS",
            OrderState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = ParseOrderStateError;

    /// Parses canonical names only. Provider vocabularies go through a
    /// `StatusVocabulary`, which never fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ParseOrderStateError(s.to_string()))
    }
}
