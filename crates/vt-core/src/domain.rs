//! Best-effort hostname extraction.

use url::Url;

/// Outcome of extracting a domain from a raw URL string.
///
/// Extraction never fails: when the URL does not parse (or parses without a
/// host), a heuristic slice of the raw string is returned as the explicit
/// [`Fallback`](Self::Fallback) branch rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainName {
    /// Hostname parsed from a well-formed URL.
    Parsed(String),
    /// Heuristic slice of an unparseable or host-less URL string.
    Fallback(String),
}

impl DomainName {
    /// Extracts a lowercased, `www.`-stripped domain from a raw URL string.
    #[must_use]
    pub fn extract(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) => url.host_str().map_or_else(
                // file:, data: and about: URLs parse but carry no host
                || Self::Fallback(heuristic_slice(raw)),
                |host| Self::Parsed(normalize(host)),
            ),
            Err(_) => Self::Fallback(heuristic_slice(raw)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parsed(s) | Self::Fallback(s) => s,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Consumes the result, returning the domain string either way.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Parsed(s) | Self::Fallback(s) => s,
        }
    }
}

fn normalize(host: &str) -> String {
    let lower = host.to_ascii_lowercase();
    lower.strip_prefix("www.").unwrap_or(&lower).to_string()
}

/// Cuts a host-shaped slice out of a raw string: drop anything up to `://`,
/// then stop at the first path, query or fragment delimiter.
fn heuristic_slice(raw: &str) -> String {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    normalize(&rest[..end])
}
