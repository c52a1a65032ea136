//! Zone lifecycle: existence cache and idempotent creation.

use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};
use zonebridge_api::{ApiError, DnsApiClient, ZoneCreate};
use zonebridge_model::canonical_fqdn;

/// Ensures zones exist remotely before they are mutated.
///
/// Wraps the API client with a name → zone-id cache so repeated syncs of
/// the same zone skip the remote existence check. The cache has no TTL;
/// it is invalidated explicitly on zone removal. The mutex keeps it
/// correct when multiple zones are reconciled concurrently against the
/// same remote target; it is never held across an await.
pub struct ZoneLifecycle {
    client: DnsApiClient,
    cache: Mutex<HashMap<String, String>>,
}

impl ZoneLifecycle {
    /// Creates a lifecycle manager over the given client.
    pub fn new(client: DnsApiClient) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the zone's id, creating the zone when it does not exist.
    ///
    /// Zones are always created with kind `Primary`; when `nameservers`
    /// is non-empty it is supplied at creation time so the new zone is
    /// born with delegation. An "already exists" conflict from the create
    /// call is treated as success: another sync got there first.
    pub async fn ensure_zone(&self, zone: &str, nameservers: &[String]) -> Result<String> {
        let fqdn = canonical_fqdn(zone);

        if let Some(id) = self.cached(&fqdn) {
            return Ok(id);
        }

        match self.client.get_zone(&fqdn).await {
            Ok(existing) => {
                debug!(zone = %fqdn, id = %existing.id, "Zone exists remotely");
                return Ok(self.remember(fqdn, existing.id));
            }
            Err(ApiError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let payload = ZoneCreate::primary(fqdn.clone(), nameservers.to_vec());
        match self.client.create_zone(&payload).await {
            Ok(created) => {
                info!(zone = %fqdn, id = %created.id, "Created zone");
                Ok(self.remember(fqdn, created.id))
            }
            Err(e) if e.is_conflict() => {
                // Lost a creation race; the zone is there, which is all
                // ensure_zone promises.
                debug!(zone = %fqdn, "Zone already existed at creation");
                Ok(self.remember(fqdn.clone(), fqdn))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the zone's id without creating it: cache first, then one
    /// remote lookup. `None` means the zone does not exist remotely.
    pub async fn zone_id(&self, zone: &str) -> Result<Option<String>> {
        let fqdn = canonical_fqdn(zone);

        if let Some(id) = self.cached(&fqdn) {
            return Ok(Some(id));
        }

        match self.client.get_zone(&fqdn).await {
            Ok(existing) => Ok(Some(self.remember(fqdn, existing.id))),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Refreshes the cache from the remote zone listing.
    pub async fn refresh_all(&self) -> Result<usize> {
        let zones = self.client.list_zones().await?;
        let count = zones.len();

        let mut cache = self.cache.lock();
        cache.clear();
        for zone in zones {
            cache.insert(canonical_fqdn(&zone.name), zone.id);
        }

        debug!(zones = count, "Refreshed zone cache");
        Ok(count)
    }

    /// Deletes the zone remotely and drops it from the cache.
    pub async fn remove_zone(&self, zone: &str) -> Result<()> {
        let fqdn = canonical_fqdn(zone);
        self.client.delete_zone(&fqdn).await?;
        self.forget(&fqdn);
        info!(zone = %fqdn, "Removed zone");
        Ok(())
    }

    /// Drops one zone from the cache.
    pub fn forget(&self, zone: &str) {
        self.cache.lock().remove(&canonical_fqdn(zone));
    }

    fn cached(&self, fqdn: &str) -> Option<String> {
        self.cache.lock().get(fqdn).cloned()
    }

    fn remember(&self, fqdn: String, id: String) -> String {
        self.cache.lock().insert(fqdn, id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn zone_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": name,
            "name": name,
            "kind": "Primary",
            "rrsets": []
        })
    }

    async fn lifecycle_for(server: &MockServer) -> ZoneLifecycle {
        let client = DnsApiClient::builder(server.uri(), "key").build().unwrap();
        ZoneLifecycle::new(client)
    }

    #[tokio::test]
    async fn existing_zone_is_cached_after_first_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_json("example.com.")))
            .expect(1) // second ensure must hit the cache
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        let id1 = lifecycle.ensure_zone("example.com", &[]).await.unwrap();
        let id2 = lifecycle.ensure_zone("Example.COM.", &[]).await.unwrap();
        assert_eq!(id1, "example.com.");
        assert_eq!(id2, "example.com.");
    }

    #[tokio::test]
    async fn missing_zone_is_created_as_primary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Could not find domain"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/servers/localhost/zones"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "kind": "Primary",
                "nameservers": ["ns1.example.net."]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(zone_json("example.com.")))
            .expect(1)
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        let id = lifecycle
            .ensure_zone("example.com", &["ns1.example.net.".to_string()])
            .await
            .unwrap();
        assert_eq!(id, "example.com.");
    }

    #[tokio::test]
    async fn creation_conflict_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": "Domain 'example.com.' already exists"
            })))
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        let id = lifecycle.ensure_zone("example.com", &[]).await.unwrap();
        assert_eq!(id, "example.com.");
    }

    #[tokio::test]
    async fn zone_id_returns_none_for_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        assert!(lifecycle.zone_id("missing.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_invalidates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_json("example.com.")))
            .expect(2) // re-fetched after removal
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        lifecycle.ensure_zone("example.com", &[]).await.unwrap();
        lifecycle.remove_zone("example.com").await.unwrap();
        lifecycle.ensure_zone("example.com", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_all_populates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a.example.", "name": "a.example.", "kind": "Primary"},
                {"id": "b.example.", "name": "b.example.", "kind": "Primary"}
            ])))
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server).await;
        assert_eq!(lifecycle.refresh_all().await.unwrap(), 2);

        // Cache hit: no per-zone GET was mounted, so a miss would error.
        let id = lifecycle.ensure_zone("a.example", &[]).await.unwrap();
        assert_eq!(id, "a.example.");
    }
}
