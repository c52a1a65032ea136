//! Record mapping: one parsed zone record → canonical RRset key + content.
//!
//! Pure functions. The only side channel is the list of skipped record
//! types [`build_desired`] returns so the caller can log them.

use std::collections::BTreeMap;
use zonebridge_model::{
    canonical_fqdn, RecordData, ResourceRecord, Rrset, RrsetKey,
};

/// The desired RRset state for one zone, keyed for deterministic iteration.
pub type DesiredSet = BTreeMap<RrsetKey, Rrset>;

/// Qualifies a record owner name against the zone.
///
/// Already-qualified names (trailing dot) pass through case-folded; `@` and
/// the zone's short name become the apex; anything else is suffixed with
/// the zone FQDN. Whitespace is stripped and the result is lower-cased.
pub fn qualify_name(name: &str, zone_fqdn: &str, zone_short: &str) -> String {
    let name = name.trim();

    if name.ends_with('.') {
        return canonical_fqdn(name);
    }
    if name.is_empty() || name == "@" || name.eq_ignore_ascii_case(zone_short) {
        return canonical_fqdn(zone_fqdn);
    }

    canonical_fqdn(&format!("{}.{}", name.to_ascii_lowercase(), zone_fqdn))
}

/// Qualifies a record data target (MX exchange, CNAME/NS target, SOA
/// names) the same way owner names are qualified, substituting the zone
/// apex for empty, `@`, and short-zone-name spellings.
pub fn qualify_target(target: &str, zone_fqdn: &str, zone_short: &str) -> String {
    qualify_name(target, zone_fqdn, zone_short)
}

/// Maps one parsed record to its RRset key and serialized content.
///
/// Returns `None` for record types the remote protocol mapping does not
/// cover; the caller logs and skips those.
pub fn map_record(
    record: &ResourceRecord,
    zone_fqdn: &str,
    zone_short: &str,
) -> Option<(RrsetKey, String)> {
    let owner = qualify_name(&record.name, zone_fqdn, zone_short);

    let content = match &record.data {
        RecordData::A { address } => address.to_string(),
        RecordData::Aaaa { address } => address.to_string(),
        RecordData::Ptr { target } => target.clone(),
        RecordData::Txt { text } => text.clone(),
        RecordData::Cname { target } | RecordData::Ns { target } => {
            qualify_target(target, zone_fqdn, zone_short)
        }
        RecordData::Mx { preference, exchange } => {
            let exchange = qualify_target(exchange, zone_fqdn, zone_short);
            format!("{preference} {exchange}")
        }
        RecordData::Srv { priority, weight, port, target } => {
            let target = if target.trim().is_empty() {
                String::new()
            } else {
                qualify_target(target, zone_fqdn, zone_short)
            };
            format!("{priority} {weight} {port} {target}")
        }
        RecordData::Soa { mname, rname, serial, refresh, retry, expire, minimum } => {
            format!(
                "{} {} {serial} {refresh} {retry} {expire} {minimum}",
                qualify_target(mname, zone_fqdn, zone_short),
                qualify_target(rname, zone_fqdn, zone_short),
            )
        }
        RecordData::Other { .. } => return None,
    };

    Some((RrsetKey::new(&owner, record.type_name()), content))
}

/// Folds parsed records into the desired RRset set.
///
/// Records sharing a key merge into one RRset: the first record's TTL
/// wins, later contents append. Returns the desired set plus the distinct
/// type mnemonics that were skipped as unsupported, in first-seen order.
pub fn build_desired(
    records: &[ResourceRecord],
    zone_fqdn: &str,
    zone_short: &str,
) -> (DesiredSet, Vec<String>) {
    let mut desired = DesiredSet::new();
    let mut skipped: Vec<String> = Vec::new();

    for record in records {
        match map_record(record, zone_fqdn, zone_short) {
            Some((key, content)) => match desired.get_mut(&key) {
                Some(rrset) => rrset.push(content),
                None => {
                    desired.insert(key.clone(), Rrset::single(key, record.ttl, content));
                }
            },
            None => {
                let rtype = record.type_name().to_string();
                if !skipped.contains(&rtype) {
                    skipped.push(rtype);
                }
            }
        }
    }

    (desired, skipped)
}
