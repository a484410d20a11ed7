//! Cached view of the backend's service catalog.
//!
//! The catalog changes rarely, so it is fetched through an explicit cache
//! value with a recorded fetch time and a fixed freshness window. Callers
//! check and refresh before reading; when the backend is unavailable the
//! previous snapshot (or the configured fallback names) keeps display
//! lookups working.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::api::{ApiClient, ApiError, ServiceInfo};

pub struct ServiceCatalog {
    services: Vec<ServiceInfo>,
    fetched_at: Option<Instant>,
    ttl: Duration,
    fallback_names: HashMap<String, String>,
}

impl ServiceCatalog {
    pub fn new(ttl: Duration, fallback_names: HashMap<String, String>) -> Self {
        Self {
            services: Vec::new(),
            fetched_at: None,
            ttl,
            fallback_names,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < self.ttl)
    }

    /// Fetch the catalog unconditionally. On failure the previous snapshot
    /// is kept so lookups keep degrading gracefully.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        match client.list_services().await {
            Ok(services) => {
                self.accept(services);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "service catalog refresh failed; keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// Refresh only when the freshness window has lapsed.
    pub async fn refresh_if_stale(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        if self.is_fresh() {
            return Ok(());
        }
        self.refresh(client).await
    }

    fn accept(&mut self, services: Vec<ServiceInfo>) {
        self.services = services;
        self.fetched_at = Some(Instant::now());
    }

    /// Force the next read to refetch.
    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }

    /// The last fetched snapshot, possibly empty if no fetch succeeded yet.
    pub fn services(&self) -> &[ServiceInfo] {
        &self.services
    }

    /// Resolve a service key to a display name: fetched catalog first, then
    /// the configured fallback map, then the raw key.
    pub fn display_name(&self, key: &str) -> String {
        if let Some(service) = self.services.iter().find(|service| service.key == key) {
            return service.display_name.clone();
        }
        self.fallback_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(key: &str, display_name: &str) -> ServiceInfo {
        ServiceInfo {
            key: key.to_string(),
            display_name: display_name.to_string(),
            description: String::new(),
            doc_count: 0,
        }
    }

    fn catalog_with_fallback() -> ServiceCatalog {
        ServiceCatalog::new(
            Duration::from_secs(300),
            HashMap::from([("ai-core".to_string(), "AI Core".to_string())]),
        )
    }

    #[test]
    fn empty_catalog_is_stale() {
        assert!(!catalog_with_fallback().is_fresh());
    }

    #[test]
    fn accepted_snapshot_is_fresh_until_the_window_lapses() {
        let mut catalog = ServiceCatalog::new(Duration::from_secs(300), HashMap::new());
        catalog.accept(vec![service("ai-core", "AI Core (live)")]);
        assert!(catalog.is_fresh());

        let mut short_lived = ServiceCatalog::new(Duration::ZERO, HashMap::new());
        short_lived.accept(vec![service("ai-core", "AI Core (live)")]);
        assert!(!short_lived.is_fresh());
    }

    #[test]
    fn invalidate_forces_a_refetch() {
        let mut catalog = catalog_with_fallback();
        catalog.accept(vec![service("joule", "Joule")]);
        assert!(catalog.is_fresh());
        catalog.invalidate();
        assert!(!catalog.is_fresh());
        // The snapshot itself survives invalidation for degraded lookups.
        assert_eq!(catalog.display_name("joule"), "Joule");
    }

    #[test]
    fn display_name_prefers_fetched_over_fallback_over_key() {
        let mut catalog = catalog_with_fallback();
        assert_eq!(catalog.display_name("ai-core"), "AI Core");
        assert_eq!(catalog.display_name("unknown-svc"), "unknown-svc");

        catalog.accept(vec![service("ai-core", "AI Core (live)")]);
        assert_eq!(catalog.display_name("ai-core"), "AI Core (live)");
        assert_eq!(catalog.display_name("unknown-svc"), "unknown-svc");
    }
}
