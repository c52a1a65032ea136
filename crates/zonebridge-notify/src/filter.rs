//! Zone allow-list with wildcard matching.

use std::fmt;

/// One allow-list entry: either a literal zone name or a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AllowEntry {
    Literal(String),
    Wildcard(String),
}

/// The configured set of zones NOTIFYs may trigger resyncs for.
///
/// An empty list accepts every zone. Entries match case-insensitively;
/// entries containing `*` match any run of characters at that position,
/// anchored to the full name: `*.test.com` matches `sub.test.com` and
/// `a.b.test.com` but not `test.com`. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneAllowList {
    entries: Vec<AllowEntry>,
}

impl ZoneAllowList {
    /// Accepts every zone.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Builds the list from configuration entries.
    ///
    /// Entries are trimmed, lower-cased, and stripped of trailing dots;
    /// empty entries are ignored.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|raw| {
                let entry = raw.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();
                if entry.is_empty() {
                    None
                } else if entry.contains('*') {
                    Some(AllowEntry::Wildcard(entry))
                } else {
                    Some(AllowEntry::Literal(entry))
                }
            })
            .collect();

        Self { entries }
    }

    /// Returns true if the list has no entries (accept everything).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of configured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the first entry matching `zone`, or `None`.
    ///
    /// The zone is expected in dot-stripped, case-folded form as the
    /// handler produces it; matching folds case again either way.
    pub fn matched_entry(&self, zone: &str) -> Option<&str> {
        let zone = zone.trim().trim_end_matches('.').to_ascii_lowercase();

        self.entries.iter().find_map(|entry| match entry {
            AllowEntry::Literal(pattern) => (pattern == &zone).then_some(pattern.as_str()),
            AllowEntry::Wildcard(pattern) => {
                wildcard_match(pattern, &zone).then_some(pattern.as_str())
            }
        })
    }

    /// Returns true if a NOTIFY for `zone` should be dispatched.
    pub fn permits(&self, zone: &str) -> bool {
        self.is_empty() || self.matched_entry(zone).is_some()
    }
}

impl fmt::Display for ZoneAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(all zones)");
        }
        let mut first = true;
        for entry in &self.entries {
            let pattern = match entry {
                AllowEntry::Literal(p) | AllowEntry::Wildcard(p) => p,
            };
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{pattern}")?;
            first = false;
        }
        Ok(())
    }
}

/// Anchored glob match where `*` matches any (possibly empty) run of
/// characters. Both inputs are expected pre-lowercased.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<u8> = pattern.bytes().collect();
    let text: Vec<u8> = text.bytes().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Backtrack: let the last star consume one more byte.
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
