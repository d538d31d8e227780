// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Periodic concurrent health probing
//!
//! [`HealthMonitor`] runs one round immediately, then one round per interval
//! until its cancellation token fires. Every registered adapter is probed
//! concurrently and each outcome is written to the [`HealthTable`] as soon as
//! that probe finishes, so one stuck adapter never delays the others' records.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use futures::{StreamExt, stream::FuturesUnordered};
use provider_api::{HealthCheckConfig, HealthRecord, Provider};
use shared_types::HealthState;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{metrics, registry::ProviderRegistry};

/// Latest health record per adapter name
#[derive(Debug, Default)]
pub struct HealthTable {
    records: DashMap<String, HealthRecord>,
}

impl HealthTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset `name` to [`HealthState::Unknown`]
    pub fn reset(&self, name: &str) {
        self.record(name, HealthRecord::unknown());
    }

    /// Overwrite the record for `name`
    pub fn record(&self, name: &str, record: HealthRecord) {
        metrics::record_health(name, record.state);
        self.records.insert(name.to_string(), record);
    }

    /// Overwrite the record for `name` only if `current` still holds
    ///
    /// `current` runs while the entry is locked, so it cannot interleave with
    /// [`HealthTable::reset_with`] on the same name. Returns whether the
    /// record was written.
    pub fn record_if(
        &self,
        name: &str,
        record: HealthRecord,
        current: impl FnOnce() -> bool,
    ) -> bool {
        match self.records.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if !current() {
                    return false;
                }
                metrics::record_health(name, record.state);
                entry.insert(record);
            }
            Entry::Vacant(entry) => {
                if !current() {
                    return false;
                }
                metrics::record_health(name, record.state);
                entry.insert(record);
            }
        }
        true
    }

    /// Run `swap` and reset `name` to [`HealthState::Unknown`] as one step
    ///
    /// Used when an adapter is replaced, so an outcome recorded through
    /// [`HealthTable::record_if`] for the old adapter cannot land after the
    /// reset.
    pub fn reset_with<R>(&self, name: &str, swap: impl FnOnce() -> R) -> R {
        let mut entry = self.records.entry(name.to_string()).or_default();
        let result = swap();
        *entry = HealthRecord::unknown();
        metrics::record_health(name, HealthState::Unknown);
        result
    }

    /// Current record for `name`, if the adapter was ever registered
    pub fn get(&self, name: &str) -> Option<HealthRecord> {
        self.records.get(name).map(|entry| entry.value().clone())
    }

    /// Current state for `name`, [`HealthState::Unknown`] if absent
    pub fn state(&self, name: &str) -> HealthState {
        self.records
            .get(name)
            .map_or(HealthState::Unknown, |entry| entry.state)
    }

    /// Copy of every record
    pub fn snapshot(&self) -> HashMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

/// Outcome counts for one probe round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub healthy: usize,
    pub unhealthy: usize,
    /// Probes still running when the round was cancelled
    pub abandoned: usize,
}

/// Background prober feeding a [`HealthTable`]
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<ProviderRegistry>,
    table: Arc<HealthTable>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    /// Create a monitor over `registry` writing into `table`
    pub fn new(
        registry: Arc<ProviderRegistry>,
        table: Arc<HealthTable>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            registry,
            table,
            config,
        }
    }

    /// Probe every registered adapter once, concurrently
    ///
    /// Each probe runs on its own task and is bounded by the configured probe
    /// timeout. A probe that errors, times out or panics marks only its own
    /// adapter unhealthy. If `cancel` fires, probes still running are abandoned
    /// and their records left untouched.
    pub async fn run_round(&self, cancel: &CancellationToken) -> RoundSummary {
        let probe_timeout = self.config.timeout;
        let mut pending: FuturesUnordered<_> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|provider| {
                let handle = tokio::spawn(probe(Arc::clone(&provider), probe_timeout));
                async move { (provider, handle.await) }
            })
            .collect();

        let mut summary = RoundSummary::default();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    summary.abandoned = pending.len();
                    debug!(abandoned = summary.abandoned, "health round cancelled");
                    break;
                }
                next = pending.next() => {
                    let Some((provider, outcome)) = next else {
                        break;
                    };
                    let name = provider.name();
                    let record = outcome.unwrap_or_else(|error| {
                        HealthRecord::unhealthy(Utc::now(), format!("health probe aborted: {error}"))
                    });
                    match record.state {
                        HealthState::Healthy => summary.healthy += 1,
                        _ => {
                            summary.unhealthy += 1;
                            warn!(
                                provider = %name,
                                reason = record.message.as_deref().unwrap_or_default(),
                                "provider unhealthy"
                            );
                        }
                    }
                    let written = self
                        .table
                        .record_if(name, record, || self.registry.is_current(&provider));
                    if !written {
                        debug!(provider = %name, "adapter replaced during health check, outcome dropped");
                    }
                }
            }
        }

        debug!(
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            "health round finished"
        );
        summary
    }

    /// Run rounds until `cancel` fires
    ///
    /// The first round starts immediately; the interval is measured from the
    /// end of one round to the start of the next.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.config.interval.as_secs(),
                timeout_secs = self.config.timeout.as_secs(),
                "health monitor started"
            );
            loop {
                self.run_round(&cancel).await;
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.config.interval) => {}
                }
            }
            info!("health monitor stopped");
        })
    }
}

async fn probe(provider: Arc<dyn Provider>, probe_timeout: Duration) -> HealthRecord {
    match tokio::time::timeout(probe_timeout, provider.health_check()).await {
        Ok(Ok(())) => HealthRecord::healthy(Utc::now()),
        Ok(Err(error)) => HealthRecord::unhealthy(Utc::now(), error.to_string()),
        Err(_) => HealthRecord::unhealthy(
            Utc::now(),
            format!("health check timed out after {probe_timeout:?}"),
        ),
    }
}
