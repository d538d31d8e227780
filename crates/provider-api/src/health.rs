// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health record types and monitor settings

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::HealthState;

// Health check constants
const DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS: u64 = 300;
const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 30;

/// Most recent probe outcome for one provider
///
/// Overwritten on every probe; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Outcome of the last probe
    pub state: HealthState,
    /// When the last probe finished, `None` before the first probe
    pub last_check: Option<DateTime<Utc>>,
    /// Failure description for unhealthy providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self::unknown()
    }
}

impl HealthRecord {
    /// Record for a provider that has not been probed yet
    pub fn unknown() -> Self {
        Self {
            state: HealthState::Unknown,
            last_check: None,
            message: None,
        }
    }

    /// Record for a successful probe
    pub fn healthy(checked_at: DateTime<Utc>) -> Self {
        Self {
            state: HealthState::Healthy,
            last_check: Some(checked_at),
            message: None,
        }
    }

    /// Record for a failed probe
    pub fn unhealthy(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            state: HealthState::Unhealthy,
            last_check: Some(checked_at),
            message: Some(message.into()),
        }
    }

    /// Check if the provider is eligible for selection
    pub fn is_healthy(&self) -> bool {
        self.state.is_healthy()
    }
}

/// Health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Interval between probe rounds
    pub interval: Duration,
    /// Upper bound for a single probe; a probe exceeding it counts as failed
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_HEALTH_CHECK_INTERVAL_SECONDS),
            timeout: Duration::from_secs(DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS),
        }
    }
}
