//! Single-zone sync orchestration.

use crate::diff::diff_zone;
use crate::export::export_zone;
use crate::lifecycle::ZoneLifecycle;
use crate::mapper::build_desired;
use crate::policy::{apply_policy, validate_policy};
use crate::Result;
use tracing::{debug, info, warn};
use zonebridge_api::{DnsApiClient, RrsetUpdate};
use zonebridge_model::{
    canonical_fqdn, strip_trailing_dot, ChangeVerb, NameserverPolicy, ResourceRecord, Rrset,
    ZoneSnapshot,
};

/// Outcome of one zone sync, for logging and queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Canonical zone FQDN.
    pub zone: String,

    /// Number of REPLACE operations sent.
    pub replaced: usize,

    /// Number of DELETE operations sent.
    pub deleted: usize,

    /// Record types skipped as unsupported by the mapper.
    pub skipped_types: Vec<String>,
}

/// The reconciliation engine.
///
/// One `sync_zone` call is the unit of retry: policy validation, existence
/// check (possibly creating the zone), snapshot fetch, diff, and one bulk
/// update, strictly in that order.
pub struct SyncEngine {
    client: DnsApiClient,
    lifecycle: ZoneLifecycle,
    policy: NameserverPolicy,
}

impl SyncEngine {
    /// Creates an engine over the given client with the given policy.
    pub fn new(client: DnsApiClient, policy: NameserverPolicy) -> Self {
        Self {
            lifecycle: ZoneLifecycle::new(client.clone()),
            client,
            policy,
        }
    }

    /// Returns the lifecycle manager (for cache priming and removal).
    pub fn lifecycle(&self) -> &ZoneLifecycle {
        &self.lifecycle
    }

    /// Reconciles one zone's authored records against the remote server.
    pub async fn sync_zone(&self, zone: &str, records: &[ResourceRecord]) -> Result<SyncReport> {
        let zone_fqdn = canonical_fqdn(zone);
        let zone_short = strip_trailing_dot(zone);

        // Reject unusable policy before touching the network.
        validate_policy(&self.policy)?;

        let policy_ns = if self.policy.is_active() {
            self.policy.canonical_nameservers()
        } else {
            Vec::new()
        };
        self.lifecycle.ensure_zone(&zone_fqdn, &policy_ns).await?;

        let remote = self.client.get_zone(&zone_fqdn).await?;
        let snapshot =
            ZoneSnapshot::from_rrsets(remote.rrsets.into_iter().map(Rrset::from));
        debug!(zone = %zone_fqdn, remote_rrsets = snapshot.len(), "Fetched zone snapshot");

        let (mut desired, skipped_types) = build_desired(records, &zone_fqdn, &zone_short);
        for rtype in &skipped_types {
            warn!(zone = %zone_fqdn, rtype = %rtype, "Skipping unsupported record type");
        }
        apply_policy(&mut desired, &self.policy, &zone_fqdn)?;

        let ops = diff_zone(&desired, &snapshot, &zone_fqdn);
        let replaced = ops.iter().filter(|op| op.verb == ChangeVerb::Replace).count();
        let deleted = ops.len() - replaced;

        if ops.is_empty() {
            debug!(zone = %zone_fqdn, "Zone already in sync");
        } else {
            self.client
                .patch_zone(&zone_fqdn, &RrsetUpdate::from_ops(&ops))
                .await?;
        }

        info!(zone = %zone_fqdn, replaced, deleted, "Zone synchronized");
        Ok(SyncReport {
            zone: zone_fqdn,
            replaced,
            deleted,
            skipped_types,
        })
    }

    /// Fetches a remote zone and renders it as zone-file text.
    pub async fn export_zone(&self, zone: &str) -> Result<String> {
        let zone_fqdn = canonical_fqdn(zone);
        let remote = self.client.get_zone(&zone_fqdn).await?;

        let rrsets: Vec<Rrset> = remote.rrsets.into_iter().map(Rrset::from).collect();
        Ok(export_zone(&zone_fqdn, &rrsets, remote.serial))
    }

    /// Deletes a zone remotely and invalidates the existence cache.
    pub async fn remove_zone(&self, zone: &str) -> Result<()> {
        self.lifecycle.remove_zone(zone).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zonebridge_model::{PolicyMode, RecordData};

    fn records() -> Vec<ResourceRecord> {
        vec![
            ResourceRecord::new(
                "@",
                3600,
                RecordData::Soa {
                    mname: "ns1.example.net.".to_string(),
                    rname: "hostmaster".to_string(),
                    serial: 2024010101,
                    refresh: 10800,
                    retry: 3600,
                    expire: 604800,
                    minimum: 3600,
                },
            ),
            ResourceRecord::new("www", 300, RecordData::A { address: "192.0.2.1".parse().unwrap() }),
            ResourceRecord::new("@", 3600, RecordData::Mx {
                preference: 10,
                exchange: "mail".to_string(),
            }),
        ]
    }

    fn remote_zone(rrsets: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "example.com.",
            "name": "example.com.",
            "kind": "Primary",
            "serial": 2024010101u64,
            "rrsets": rrsets
        })
    }

    async fn engine_for(server: &MockServer, policy: NameserverPolicy) -> SyncEngine {
        let client = DnsApiClient::builder(server.uri(), "key").build().unwrap();
        SyncEngine::new(client, policy)
    }

    #[tokio::test]
    async fn sync_existing_zone_patches_replaces_and_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_zone(serde_json::json!([
                {
                    "name": "stale.example.com.",
                    "type": "TXT",
                    "ttl": 300,
                    "records": [{"content": "\"old\"", "disabled": false}]
                }
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .and(body_partial_json(serde_json::json!({
                "rrsets": [
                    {"name": "example.com.", "type": "MX", "changetype": "REPLACE"},
                    {"name": "example.com.", "type": "SOA", "changetype": "REPLACE"},
                    {"name": "www.example.com.", "type": "A", "changetype": "REPLACE"},
                    {"name": "stale.example.com.", "type": "TXT", "changetype": "DELETE"}
                ]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server, NameserverPolicy::default()).await;
        let report = engine.sync_zone("example.com", &records()).await.unwrap();

        assert_eq!(report.replaced, 3);
        assert_eq!(report.deleted, 1);
        assert!(report.skipped_types.is_empty());
    }

    #[tokio::test]
    async fn sync_creates_missing_zone_with_policy_nameservers() {
        let server = MockServer::start().await;

        // First existence check misses; after creation the zone is empty.
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Could not find domain"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/servers/localhost/zones"))
            .and(body_partial_json(serde_json::json!({
                "kind": "Primary",
                "nameservers": ["ns1.example.net.", "ns2.example.net."]
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(remote_zone(serde_json::json!([]))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_zone(serde_json::json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(body_partial_json(serde_json::json!({
                "rrsets": [
                    {"name": "example.com.", "type": "MX"},
                    {"name": "example.com.", "type": "NS", "changetype": "REPLACE",
                     "records": [
                        {"content": "ns1.example.net.", "disabled": false},
                        {"content": "ns2.example.net.", "disabled": false}
                     ]},
                    {"name": "example.com.", "type": "SOA"},
                    {"name": "www.example.com.", "type": "A"}
                ]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let policy = NameserverPolicy::new(
            PolicyMode::Force,
            vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()],
        );
        let engine = engine_for(&server, policy).await;
        let report = engine.sync_zone("example.com", &records()).await.unwrap();

        assert_eq!(report.replaced, 4);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn second_sync_sends_no_deletes() {
        let server = MockServer::start().await;

        // Remote state already matches the desired set.
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_zone(serde_json::json!([
                {
                    "name": "example.com.",
                    "type": "SOA",
                    "ttl": 3600,
                    "records": [{"content": "ns1.example.net. hostmaster.example.com. 2024010101 10800 3600 604800 3600", "disabled": false}]
                },
                {
                    "name": "example.com.",
                    "type": "MX",
                    "ttl": 3600,
                    "records": [{"content": "10 mail.example.com.", "disabled": false}]
                },
                {
                    "name": "www.example.com.",
                    "type": "A",
                    "ttl": 300,
                    "records": [{"content": "192.0.2.1", "disabled": false}]
                }
            ]))))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let engine = engine_for(&server, NameserverPolicy::default()).await;
        let report = engine.sync_zone("example.com", &records()).await.unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.replaced, 3);
    }

    #[tokio::test]
    async fn invalid_policy_is_rejected_before_any_remote_call() {
        let server = MockServer::start().await;
        // No mocks mounted: any request would 404 and the error kind would
        // differ from the policy error asserted here.

        let policy = NameserverPolicy::new(PolicyMode::Ensure, Vec::new());
        let engine = engine_for(&server, policy).await;
        let err = engine.sync_zone("example.com", &records()).await.unwrap_err();

        assert!(matches!(err, crate::SyncError::Policy(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unsupported_types_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_zone(serde_json::json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let mut recs = records();
        recs.push(ResourceRecord::new("@", 300, RecordData::Other {
            rtype: "NAPTR".to_string(),
            rdata: "100 10 \"S\" \"SIP+D2U\" \"\" _sip._udp.example.com.".to_string(),
        }));

        let engine = engine_for(&server, NameserverPolicy::default()).await;
        let report = engine.sync_zone("example.com", &recs).await.unwrap();
        assert_eq!(report.skipped_types, vec!["NAPTR".to_string()]);
    }

    #[tokio::test]
    async fn export_renders_zone_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_zone(serde_json::json!([
                {
                    "name": "example.com.",
                    "type": "SOA",
                    "ttl": 3600,
                    "records": [{"content": "ns1.example.net. hostmaster.example.com. 2024010101 10800 3600 604800 3600", "disabled": false}]
                },
                {
                    "name": "www.example.com.",
                    "type": "A",
                    "ttl": 300,
                    "records": [{"content": "192.0.2.1", "disabled": false}]
                }
            ]))))
            .mount(&server)
            .await;

        let engine = engine_for(&server, NameserverPolicy::default()).await;
        let text = engine.export_zone("example.com").await.unwrap();

        assert!(text.starts_with("; serial 2024010101\n"));
        assert!(text.contains("@\t3600\tIN\tSOA\t"));
        assert!(text.contains("www.example.com.\t300\tIN\tA\t192.0.2.1\n"));
    }
}
