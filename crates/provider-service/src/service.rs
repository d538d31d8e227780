// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Service implementation module
//!
//! Builds the provider manager from configuration and drives its lifecycle:
//! monitor start, a diagnostic balance snapshot, then coordinated shutdown on
//! SIGINT/SIGTERM using `CancellationToken`.

use std::sync::Arc;

use providers::{
    BANGJEFF, BangJeffClient, DIGIFLAZZ, DigiflazzClient, ProviderManager, VIP_RESELLER,
    VipResellerClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::ServiceConfig,
    error::{ServiceError, ServiceResult},
};

/// Main service struct
#[derive(Debug)]
pub struct Service {
    /// Service configuration
    config: ServiceConfig,
    /// Adapter registry, health table and selection
    manager: Arc<ProviderManager>,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
}

impl Service {
    /// Create a service and register every enabled adapter
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if an enabled adapter lacks credentials,
    /// or `ServiceError::Provider` if an adapter rejects its configuration.
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let manager = Self::create_manager_from_config(&config)?;
        Ok(Self::with_manager(config, Arc::new(manager)))
    }

    /// Create service with a pre-built manager for dependency injection
    pub fn with_manager(config: ServiceConfig, manager: Arc<ProviderManager>) -> Self {
        Self {
            config,
            manager,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Build the manager and register enabled adapters
    fn create_manager_from_config(config: &ServiceConfig) -> ServiceResult<ProviderManager> {
        let manager = ProviderManager::new();
        let providers = &config.providers;

        if let Some(client_config) = providers.digiflazz.client_config(config.environment)? {
            let base_url = client_config.base_url.clone();
            let production = client_config.production;
            manager.register(DigiflazzClient::new(client_config)?);
            info!(provider = DIGIFLAZZ, %base_url, production, "registered provider adapter");
        }

        if let Some(client_config) = providers.bangjeff.client_config()? {
            let base_url = client_config.base_url.clone();
            manager.register(BangJeffClient::new(client_config)?);
            info!(provider = BANGJEFF, %base_url, "registered provider adapter");
        }

        if let Some(client_config) = providers.vipreseller.client_config()? {
            let base_url = client_config.base_url.clone();
            manager.register(VipResellerClient::new(client_config)?);
            info!(provider = VIP_RESELLER, %base_url, "registered provider adapter");
        }

        if manager.provider_names().is_empty() {
            warn!("no provider adapters enabled; every selection will fail");
        }

        Ok(manager)
    }

    /// Run the service until a shutdown signal or programmatic shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Provider` if the health monitor cannot start,
    /// `ServiceError::Signal` if signal handlers cannot be installed, or
    /// `ServiceError::TaskJoin` if the signal task panics.
    pub async fn run(self) -> ServiceResult<()> {
        info!(
            environment = %self.config.environment,
            providers = ?self.manager.provider_names(),
            interval = ?self.config.health_check.interval_seconds.value(),
            "provider service starting",
        );

        self.manager
            .start_health_monitor(self.config.health_check.monitor_config())?;

        let shutdown_token = self.cancellation_token.clone();
        let signals = tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            let result = Self::shutdown_signal_handler(shutdown_token.clone()).await;
            if let Err(error) = &result {
                error!(%error, "signal handling failed, shutting down");
                shutdown_token.cancel();
            }
            result
        });

        self.log_balance_snapshot().await;

        self.cancellation_token.cancelled().await;
        self.manager.shutdown().await;
        info!("provider service shut down gracefully");

        signals
            .await
            .map_err(|source| ServiceError::TaskJoin { source })?
    }

    /// Log the live balance of every adapter that answers
    async fn log_balance_snapshot(&self) {
        let balances = self
            .manager
            .balance_for_all(&self.cancellation_token)
            .await;
        for name in self.manager.provider_names() {
            match balances.get(&name) {
                Some(balance) => info!(
                    provider = %name,
                    amount = %balance.amount,
                    currency = %balance.currency,
                    "provider balance",
                ),
                None => warn!(provider = %name, "provider balance unavailable"),
            }
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// Listens for SIGINT (Ctrl+C) and SIGTERM and cancels `cancellation_token`
    /// when either arrives.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) -> ServiceResult<()> {
        #[cfg(unix)]
        let signal_received = {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).map_err(|source| ServiceError::Signal { source })?;
            let mut sigint =
                signal(SignalKind::interrupt()).map_err(|source| ServiceError::Signal { source })?;

            async move {
                tokio::select! {
                    _ = sigterm.recv() => {
                        warn!("Received SIGTERM signal, initiating coordinated shutdown");
                        "SIGTERM"
                    },
                    _ = sigint.recv() => {
                        warn!("Received SIGINT signal, initiating coordinated shutdown");
                        "SIGINT"
                    },
                }
            }
        };

        #[cfg(not(unix))]
        let signal_received = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                error!(%error, "failed to listen for CTRL+C");
            }
            warn!("Received CTRL+C signal, initiating coordinated shutdown");
            "CTRL+C"
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!("Shutdown signal {} received, cancelling all operations...", signal_name);
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                info!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
        Ok(())
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the service's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Shared provider manager
    pub fn manager(&self) -> Arc<ProviderManager> {
        Arc::clone(&self.manager)
    }

    /// Get service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
