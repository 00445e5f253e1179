//! Cache key derivation and glob matching.

use std::fmt;

use crate::domain::records::RecordId;

const ALL_RECORDS_KEY: &str = "records:all";
const RECORD_PREFIX: &str = "record:";

/// Pattern matching every per-record entry (and nothing else).
pub const RECORD_PATTERN: &str = "record:*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The snapshot of the whole collection.
    AllRecords,
    Record(RecordId),
}

impl CacheKey {
    pub fn record(id: &RecordId) -> Self {
        Self::Record(id.clone())
    }

    pub fn render(&self) -> String {
        match self {
            Self::AllRecords => ALL_RECORDS_KEY.to_string(),
            Self::Record(id) => format!("{RECORD_PREFIX}{id}"),
        }
    }

    /// Metric label for the kind of entry.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::AllRecords => "list",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllRecords => f.write_str(ALL_RECORDS_KEY),
            Self::Record(id) => write!(f, "{RECORD_PREFIX}{id}"),
        }
    }
}

/// Redis-style glob match supporting `*`, `?` and `\` escapes.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0usize, 0usize);
    // Position after the last `*` and the candidate index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p + 1, c));
                p += 1;
            }
            Some('?') => {
                p += 1;
                c += 1;
            }
            Some('\\') if p + 1 < pattern.len() && pattern[p + 1] == candidate[c] => {
                p += 2;
                c += 1;
            }
            Some(&literal) if literal != '\\' && literal == candidate[c] => {
                p += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star_p, star_c)) => {
                    p = star_p;
                    c = star_c + 1;
                    backtrack = Some((star_p, star_c + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|ch| *ch == '*')
}
