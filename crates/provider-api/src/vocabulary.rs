// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Status normalization tables

use shared_types::OrderState;

/// Provider status vocabulary
///
/// Matching is exact apart from surrounding whitespace, so `SUKSES` is not
/// `Sukses`. Anything outside the table maps to [`OrderState::Processing`] so
/// an order is never closed on a status we do not understand.
#[derive(Debug, Clone, Copy)]
pub struct StatusVocabulary {
    entries: &'static [(&'static str, OrderState)],
}

impl StatusVocabulary {
    /// Build a vocabulary from `(provider status, canonical state)` pairs
    pub const fn new(entries: &'static [(&'static str, OrderState)]) -> Self {
        Self { entries }
    }

    /// Map a provider status onto the canonical state
    pub fn normalize(&self, raw: &str) -> OrderState {
        self.lookup(raw).unwrap_or(OrderState::Processing)
    }

    /// Check if `raw` is part of this vocabulary
    pub fn recognizes(&self, raw: &str) -> bool {
        self.lookup(raw).is_some()
    }

    fn lookup(&self, raw: &str) -> Option<OrderState> {
        let raw = raw.trim();
        self.entries
            .iter()
            .find(|(status, _)| *status == raw)
            .map(|(_, state)| *state)
    }
}
