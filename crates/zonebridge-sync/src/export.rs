//! Zone export: remote RRsets → zone-file text.
//!
//! The structural inverse of the record mapper. Output format is the
//! control panel's interchange form: one `; serial <value>` header line,
//! then tab-separated `name  ttl  IN  type  data...` lines with the apex
//! spelled `@`. MX, SRV and SOA content is re-split into its positional
//! fields so each lands in its own column.

use chrono::Utc;
use std::fmt::Write as _;
use zonebridge_model::{canonical_fqdn, Rrset};

/// Renders a zone's RRsets as zone-file text.
///
/// The SOA line comes first, then every other RRset's records in key
/// order, one line per content entry. `serial` is the remote zone's
/// serial timestamp; when absent the current time stands in.
pub fn export_zone(zone_fqdn: &str, rrsets: &[Rrset], serial: Option<u64>) -> String {
    let apex = canonical_fqdn(zone_fqdn);
    let serial = serial.unwrap_or_else(|| Utc::now().timestamp().unsigned_abs());

    let mut out = String::new();
    let _ = writeln!(out, "; serial {serial}");

    let mut others: Vec<&Rrset> = Vec::new();
    let mut soa: Option<&Rrset> = None;
    for rrset in rrsets {
        if rrset.key.rtype == "SOA" && rrset.key.name == apex {
            soa = Some(rrset);
        } else {
            others.push(rrset);
        }
    }
    others.sort_by(|a, b| a.key.cmp(&b.key));

    if let Some(soa) = soa {
        for record in &soa.records {
            write_line(&mut out, &soa.key.name, soa.ttl, "SOA", &record.content, &apex);
        }
    }

    for rrset in others {
        for record in &rrset.records {
            write_line(
                &mut out,
                &rrset.key.name,
                rrset.ttl,
                &rrset.key.rtype,
                &record.content,
                &apex,
            );
        }
    }

    out
}

fn write_line(out: &mut String, name: &str, ttl: u32, rtype: &str, content: &str, apex: &str) {
    let owner = if name == apex { "@" } else { name };
    let data = split_content(rtype, content).join("\t");
    let _ = writeln!(out, "{owner}\t{ttl}\tIN\t{rtype}\t{data}");
}

/// Re-splits structured content into its positional fields.
///
/// MX has 2, SRV has 4, SOA has 7; everything else is a single opaque
/// field. Splitting is bounded so content with embedded spaces (TXT never
/// reaches here, but a malformed remote entry might) degrades to fewer
/// columns instead of panicking.
fn split_content(rtype: &str, content: &str) -> Vec<String> {
    let field_count = match rtype {
        "MX" => 2,
        "SRV" => 4,
        "SOA" => 7,
        _ => 1,
    };

    if field_count == 1 {
        return vec![content.to_string()];
    }

    content
        .splitn(field_count, ' ')
        .map(str::to_string)
        .collect()
}
