//! Apex NS rewriting per the configured nameserver policy.

use crate::mapper::DesiredSet;
use crate::{Result, SyncError};
use tracing::debug;
use zonebridge_model::{
    canonical_fqdn, NameserverPolicy, PolicyMode, Rrset, RrsetKey, POLICY_NS_TTL,
};

/// Validates a policy before any remote call is made.
///
/// An active (force/ensure) policy with an empty nameserver list can only
/// produce broken delegation, so it is rejected outright.
pub fn validate_policy(policy: &NameserverPolicy) -> Result<()> {
    if policy.is_active() && policy.nameservers.is_empty() {
        return Err(SyncError::Policy(format!(
            "{} policy requires at least one nameserver",
            policy.mode.as_str()
        )));
    }
    Ok(())
}

/// Rewrites the apex NS RRset of `desired` according to the policy.
///
/// Idempotent: applying the same policy twice yields the same RRset.
/// Content comparison is by normalized FQDN, so spelling differences in
/// case or trailing dots never produce duplicates.
pub fn apply_policy(
    desired: &mut DesiredSet,
    policy: &NameserverPolicy,
    zone_fqdn: &str,
) -> Result<()> {
    validate_policy(policy)?;

    if !policy.is_active() {
        return Ok(());
    }

    let apex_key = RrsetKey::new(zone_fqdn, "NS");
    let nameservers = policy.canonical_nameservers();

    match policy.mode {
        PolicyMode::Force => {
            let ttl = desired.get(&apex_key).map_or(POLICY_NS_TTL, |r| r.ttl);
            let mut rrset = Rrset { key: apex_key.clone(), ttl, records: Vec::new() };
            for ns in &nameservers {
                rrset.push(ns.clone());
            }
            debug!(zone = %zone_fqdn, nameservers = rrset.records.len(), "Forced apex NS RRset");
            desired.insert(apex_key, rrset);
        }
        PolicyMode::Ensure => {
            let rrset = desired.entry(apex_key.clone()).or_insert_with(|| Rrset {
                key: apex_key,
                ttl: POLICY_NS_TTL,
                records: Vec::new(),
            });
            for ns in &nameservers {
                if !rrset.contains_content(ns) {
                    rrset.push(ns.clone());
                }
            }
            debug!(zone = %zone_fqdn, nameservers = rrset.records.len(), "Ensured apex NS RRset");
        }
        PolicyMode::Default => {}
    }

    Ok(())
}
