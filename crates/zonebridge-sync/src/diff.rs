//! RRset diffing: desired state vs. remote snapshot → ordered change list.

use crate::mapper::DesiredSet;
use tracing::warn;
use zonebridge_model::{ChangeOp, RrsetKey, ZoneSnapshot};

/// RRset types at the zone apex that are never auto-deleted.
///
/// Losing the apex SOA or NS breaks the zone outright, so an incomplete
/// desired set must not be able to take them down; explicit zone removal
/// is the only path that does.
const PROTECTED_APEX_TYPES: &[&str] = &["NS", "SOA"];

/// Computes the change list that makes the remote zone match `desired`.
///
/// Every desired RRset becomes a REPLACE. A desired RRset whose content
/// list ended up empty after mapping is demoted to a DELETE of the remote
/// RRset (when one exists); an empty-content REPLACE is never sent.
/// Every snapshot key absent from the desired set becomes a DELETE, except
/// the protected apex types.
///
/// REPLACE ops come before DELETE ops, each group in key order, so logs
/// and tests see a deterministic sequence.
pub fn diff_zone(desired: &DesiredSet, snapshot: &ZoneSnapshot, zone_fqdn: &str) -> Vec<ChangeOp> {
    let mut replaces: Vec<ChangeOp> = Vec::new();
    let mut deletes: Vec<RrsetKey> = Vec::new();

    for (key, rrset) in desired {
        if rrset.records.is_empty() {
            warn!(rrset = %key, "Desired RRset has no content after mapping; treating as delete");
            if snapshot.contains(key) && !key.is_apex_of(zone_fqdn, PROTECTED_APEX_TYPES) {
                deletes.push(key.clone());
            }
            continue;
        }
        replaces.push(ChangeOp::replace(rrset));
    }

    for key in snapshot.keys() {
        if desired.contains_key(key) {
            continue;
        }
        if key.is_apex_of(zone_fqdn, PROTECTED_APEX_TYPES) {
            continue;
        }
        deletes.push(key.clone());
    }

    deletes.sort();
    deletes.dedup();

    let mut ops = replaces;
    ops.extend(deletes.into_iter().map(ChangeOp::delete));
    ops
}
