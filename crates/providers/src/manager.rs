// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider manager
//!
//! Owns the adapter registry, the health table and the background health
//! monitor, and implements price-based provider selection plus the admin
//! fan-outs over every registered adapter.
//!
//! # Selection
//!
//! 1. A non-empty preferred name that is registered, healthy and quotes the sku
//!    as available wins immediately, even over cheaper alternatives.
//! 2. Otherwise adapters are scanned one by one in name order. Unhealthy
//!    adapters, failed quotes and unavailable quotes are skipped; the strictly
//!    lowest price wins and the first adapter seen keeps a tie.
//! 3. If nothing qualifies the result is [`ProviderError::NoProviderAvailable`].

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::{StreamExt, stream::FuturesUnordered};
use provider_api::{
    Balance, CatalogItem, HealthCheckConfig, HealthRecord, PriceQuote, Provider, ProviderError,
    ProviderResult,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    metrics,
    monitor::{HealthMonitor, HealthTable, RoundSummary},
    registry::ProviderRegistry,
};

/// Adapter chosen to fulfill an order, with the quote it was chosen on
#[derive(Debug, Clone)]
pub struct Selection {
    pub provider: Arc<dyn Provider>,
    pub quote: PriceQuote,
}

impl Selection {
    /// Name of the selected adapter
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Failure of one adapter during a fan-out
#[derive(Debug, Error)]
#[error("{provider}: {source}")]
pub struct FanOutError {
    /// Adapter that failed
    pub provider: String,
    /// What went wrong
    #[source]
    pub source: ProviderError,
}

/// Aggregated catalogs keyed by adapter name
#[derive(Debug, Default)]
pub struct CatalogSweep {
    /// Catalogs of every adapter that answered
    pub catalogs: HashMap<String, Vec<CatalogItem>>,
    /// First failure to complete, if any adapter failed
    pub first_error: Option<FanOutError>,
}

#[derive(Debug)]
struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry, health table and selection over a fixed set of adapters
#[derive(Debug, Default)]
pub struct ProviderManager {
    registry: Arc<ProviderRegistry>,
    health: Arc<HealthTable>,
    monitor: Mutex<Option<MonitorTask>>,
}

impl ProviderManager {
    /// Create a manager with no adapters and no running monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any adapter with the same name
    ///
    /// The adapter's health is reset to unknown until the next probe.
    pub fn register<P: Provider + 'static>(&self, provider: P) {
        self.register_shared(Arc::new(provider));
    }

    /// Register an already shared adapter
    pub fn register_shared(&self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        self.health
            .reset_with(&name, || self.registry.register(provider));
    }

    /// Look up an adapter by name
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if no adapter has that name
    pub fn get(&self, name: &str) -> ProviderResult<Arc<dyn Provider>> {
        self.registry.get(name)
    }

    /// Snapshot of every registered adapter
    pub fn list_all(&self) -> Vec<Arc<dyn Provider>> {
        self.registry.snapshot()
    }

    /// Names of the registered adapters, sorted
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Latest health record of one adapter
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if no adapter has that name
    pub fn health_status(&self, name: &str) -> ProviderResult<HealthRecord> {
        if !self.registry.contains(name) {
            return Err(ProviderError::provider_not_found(name));
        }
        Ok(self.health.get(name).unwrap_or_default())
    }

    /// Latest health record of every registered adapter
    pub fn all_health_status(&self) -> HashMap<String, HealthRecord> {
        let mut records = self.health.snapshot();
        records.retain(|name, _| self.registry.contains(name));
        records
    }

    /// Start the background health monitor
    ///
    /// The first round runs immediately. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the interval or probe
    /// timeout is zero, or a monitor is already running
    pub fn start_health_monitor(&self, config: HealthCheckConfig) -> ProviderResult<()> {
        if config.interval.is_zero() || config.timeout.is_zero() {
            return Err(ProviderError::config(
                "health check interval and timeout must be positive",
            ));
        }

        let mut slot = self.lock_monitor();
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return Err(ProviderError::config("health monitor already running"));
        }

        let cancel = CancellationToken::new();
        let handle = HealthMonitor::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.health),
            config,
        )
        .spawn(cancel.clone());
        *slot = Some(MonitorTask { cancel, handle });
        Ok(())
    }

    /// Check if the background monitor is running
    pub fn is_monitoring(&self) -> bool {
        self.lock_monitor()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Run one probe round now, independent of the background monitor
    pub async fn run_health_round(
        &self,
        probe_timeout: Duration,
        cancel: &CancellationToken,
    ) -> RoundSummary {
        let config = HealthCheckConfig {
            timeout: probe_timeout,
            ..HealthCheckConfig::default()
        };
        HealthMonitor::new(Arc::clone(&self.registry), Arc::clone(&self.health), config)
            .run_round(cancel)
            .await
    }

    /// Stop the background monitor and wait for it to exit
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let task = self.lock_monitor().take();
        let Some(MonitorTask { cancel, handle }) = task else {
            return;
        };

        cancel.cancel();
        if let Err(error) = handle.await {
            warn!(%error, "health monitor exited abnormally");
        }
        info!("provider manager shut down");
    }

    /// Choose an adapter for `sku`
    ///
    /// An empty or whitespace-only preferred name counts as no preference.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoProviderAvailable`] if no healthy adapter
    /// quotes the sku as available
    pub async fn select_provider(
        &self,
        sku: &str,
        preferred: Option<&str>,
    ) -> ProviderResult<Selection> {
        if let Some(name) = preferred.map(str::trim).filter(|name| !name.is_empty()) {
            if let Some(selection) = self.try_preferred(name, sku).await {
                metrics::record_selection("preferred");
                info!(
                    provider = name,
                    sku,
                    price = %selection.quote.price,
                    "selected preferred provider"
                );
                return Ok(selection);
            }
        }

        let mut best: Option<Selection> = None;
        for provider in self.registry.snapshot() {
            let name = provider.name().to_string();
            if !self.health.state(&name).is_healthy() {
                debug!(provider = %name, sku, "skipping provider that is not healthy");
                continue;
            }

            let quote = match provider.check_price(sku).await {
                Ok(quote) if quote.available => quote,
                Ok(_) => {
                    debug!(provider = %name, sku, "skipping unavailable quote");
                    continue;
                }
                Err(error) => {
                    debug!(provider = %name, sku, %error, "skipping failed quote");
                    continue;
                }
            };

            if best
                .as_ref()
                .is_none_or(|current| quote.price < current.quote.price)
            {
                best = Some(Selection { provider, quote });
            }
        }

        match best {
            Some(selection) => {
                metrics::record_selection("cheapest");
                info!(
                    provider = selection.provider_name(),
                    sku,
                    price = %selection.quote.price,
                    "selected cheapest provider"
                );
                Ok(selection)
            }
            None => {
                metrics::record_selection("none");
                warn!(sku, "no provider available");
                Err(ProviderError::NoProviderAvailable {
                    sku: sku.to_string(),
                })
            }
        }
    }

    /// Fetch every adapter's catalog concurrently
    ///
    /// Failed adapters are left out of the mapping; the first failure to
    /// complete is reported alongside. If `cancel` fires, calls still in flight
    /// are abandoned and the catalogs gathered so far are returned.
    pub async fn catalog_for_all(&self, cancel: &CancellationToken) -> CatalogSweep {
        let mut sweep = CatalogSweep::default();
        let results = self
            .fan_out(cancel, "list_catalog", |provider| async move {
                provider.list_catalog().await
            })
            .await;

        for (name, result) in results {
            match result {
                Ok(items) => {
                    sweep.catalogs.insert(name, items);
                }
                Err(source) => {
                    warn!(provider = %name, error = %source, "catalog fetch failed");
                    if sweep.first_error.is_none() {
                        sweep.first_error = Some(FanOutError {
                            provider: name,
                            source,
                        });
                    }
                }
            }
        }
        sweep
    }

    /// Fetch every adapter's balance concurrently, omitting failures
    pub async fn balance_for_all(&self, cancel: &CancellationToken) -> HashMap<String, Balance> {
        self.fan_out(cancel, "balance", |provider| async move {
            provider.balance().await
        })
        .await
        .into_iter()
        .filter_map(|(name, result)| match result {
            Ok(balance) => Some((name, balance)),
            Err(error) => {
                debug!(provider = %name, %error, "omitting balance");
                None
            }
        })
        .collect()
    }

    async fn try_preferred(&self, name: &str, sku: &str) -> Option<Selection> {
        let provider = match self.registry.get(name) {
            Ok(provider) => provider,
            Err(error) => {
                debug!(%error, "preferred provider not registered");
                return None;
            }
        };
        if !self.health.state(name).is_healthy() {
            debug!(provider = name, "preferred provider not healthy");
            return None;
        }

        match provider.check_price(sku).await {
            Ok(quote) if quote.available => Some(Selection { provider, quote }),
            Ok(_) => {
                debug!(provider = name, sku, "preferred provider quote unavailable");
                None
            }
            Err(error) => {
                debug!(provider = name, sku, %error, "preferred provider quote failed");
                None
            }
        }
    }

    /// Run `call` against every adapter concurrently, in completion order
    async fn fan_out<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        call: F,
    ) -> Vec<(String, ProviderResult<T>)>
    where
        F: Fn(Arc<dyn Provider>) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut pending: FuturesUnordered<_> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|provider| {
                let name = provider.name().to_string();
                let request = call(provider);
                async move { (name, request.await) }
            })
            .collect();

        let mut completed = Vec::with_capacity(pending.len());
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(operation, abandoned = pending.len(), "fan-out cancelled");
                    break;
                }
                next = pending.next() => match next {
                    Some(outcome) => completed.push(outcome),
                    None => break,
                },
            }
        }
        completed
    }

    fn lock_monitor(&self) -> MutexGuard<'_, Option<MonitorTask>> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProviderManager {
    fn drop(&mut self) {
        let slot = self.monitor.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.cancel.cancel();
        }
    }
}
