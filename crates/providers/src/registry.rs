// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider registry
//!
//! Adapters are registered under their own name and shared as
//! `Arc<dyn Provider>`, so callers keep using an adapter even if it is replaced
//! while their call is in flight.

use std::sync::Arc;

use dashmap::DashMap;
use provider_api::{Provider, ProviderError, ProviderResult};
use tracing::info;

/// Name-keyed set of registered adapters
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its name, replacing any previous entry
    ///
    /// Returns the replaced adapter, if any.
    pub fn register(&self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let name = provider.name().to_string();
        let previous = self.providers.insert(name.clone(), provider);
        info!(
            provider = %name,
            replaced = previous.is_some(),
            "registered provider"
        );
        previous
    }

    /// Look up an adapter by name
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if no adapter has that name
    pub fn get(&self, name: &str) -> ProviderResult<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ProviderError::provider_not_found(name))
    }

    /// Check if an adapter is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Check if `provider` is the instance currently registered under its name
    pub fn is_current(&self, provider: &Arc<dyn Provider>) -> bool {
        self.providers
            .get(provider.name())
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), provider))
    }

    /// Snapshot of every registered adapter, sorted by name
    ///
    /// Selection scans candidates in this order, so ties on price resolve the
    /// same way on every call.
    pub fn snapshot(&self) -> Vec<Arc<dyn Provider>> {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        providers.sort_by(|a, b| a.name().cmp(b.name()));
        providers
    }

    /// Names of the registered adapters, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if no adapter is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use provider_api::{
        Balance, CatalogItem, OrderRequest, OrderResult, OrderState, OrderStatus, PriceQuote,
    };

    use super::*;

    #[derive(Debug)]
    struct Named(&'static str, u8);

    #[async_trait]
    impl Provider for Named {
        fn name(&self) -> &str {
            self.0
        }
        async fn list_catalog(&self) -> ProviderResult<Vec<CatalogItem>> {
            Ok(Vec::new())
        }
        async fn check_price(&self, sku: &str) -> ProviderResult<PriceQuote> {
            Err(ProviderError::sku_not_found(sku))
        }
        async fn create_order(&self, _request: &OrderRequest) -> ProviderResult<OrderResult> {
            Err(ProviderError::api("unsupported"))
        }
        async fn check_status(&self, _reference_id: &str) -> ProviderResult<OrderStatus> {
            Err(ProviderError::api("unsupported"))
        }
        async fn balance(&self) -> ProviderResult<Balance> {
            Err(ProviderError::api("unsupported"))
        }
        async fn health_check(&self) -> ProviderResult<()> {
            Ok(())
        }
        fn normalize_status(&self, _raw: &str) -> OrderState {
            OrderState::Processing
        }
    }

    #[test]
    fn register_and_lookup() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(Named("beta", 1)));
        registry.register(Arc::new(Named("alpha", 1)));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("alpha"));
        assert_eq!(registry.get("beta").unwrap().name(), "beta");
        assert_eq!(registry.names(), vec!["alpha", "beta"]);

        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.get("ghost"),
            Err(ProviderError::NotFound { .. })
        ));
    }

    #[test]
    fn re_registration_replaces() {
        let registry = ProviderRegistry::new();
        assert!(registry.register(Arc::new(Named("alpha", 1))).is_none());
        let previous = registry.register(Arc::new(Named("alpha", 2)));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        assert!(format!("{:?}", registry.get("alpha").unwrap()).contains('2'));
    }

    #[test]
    fn current_instance_tracks_replacement() {
        let registry = ProviderRegistry::new();
        let first: Arc<dyn Provider> = Arc::new(Named("alpha", 1));
        registry.register(Arc::clone(&first));
        assert!(registry.is_current(&first));

        let second: Arc<dyn Provider> = Arc::new(Named("alpha", 2));
        registry.register(Arc::clone(&second));
        assert!(!registry.is_current(&first));
        assert!(registry.is_current(&second));
    }
}
