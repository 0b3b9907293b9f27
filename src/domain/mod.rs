//! Domain candidate extraction and validation.
//!
//! This module turns noisy OCR text into a deduplicated, ordered list of
//! plausible domain names. It performs no I/O and never fails: anything that is
//! not a valid, allow-listed host is dropped silently.
//!
//! Key items:
//! - `extract_domains()` - Scans text lines and returns validated candidates in discovery order
//! - `DomainCandidate` - A validated, lower-cased host name

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Host grammar: one or more alphanumeric labels (internal hyphens allowed,
/// at most 63 chars) followed by an alphabetic top-level label.
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
        .expect("domain grammar is a valid regex")
});

/// Top-level domains accepted as real. A fixed list keeps false positives from
/// OCR noise low at the cost of rejecting uncommon TLDs.
static ALLOWED_TLDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "com", "org", "net", "edu", "gov", "ru", "cn", "uk", "jp", "de", "fr", "br", "it", "pl",
        "in", "info", "biz", "io", "co", "me",
    ]
    .into_iter()
    .collect()
});

const MIN_DOMAIN_LENGTH: usize = 3;
const MAX_DOMAIN_LENGTH: usize = 255;

/// Characters stripped from both ends of a token before it is parsed.
const TOKEN_PUNCTUATION: &[char] = &[
    '"', '\'', '(', ')', '[', ']', '{', '}', '<', '>', ',', ';', ':', '!', '?', '“', '”', '‘', '’',
    '，', '。', '、',
];

/// A validated, lower-cased host name such as `example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DomainCandidate(String);

impl DomainCandidate {
    /// Validates a bare host name.
    ///
    /// Returns `None` unless `host` matches the host grammar, ends in an
    /// allow-listed TLD and is 3 to 255 characters long. The host is lower-cased
    /// first.
    pub fn parse(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        if !DOMAIN_REGEX.is_match(&host) {
            return None;
        }
        let tld = host.rsplit('.').next()?;
        if !ALLOWED_TLDS.contains(tld) {
            return None;
        }
        if host.len() < MIN_DOMAIN_LENGTH || host.len() > MAX_DOMAIN_LENGTH {
            return None;
        }
        Some(Self(host))
    }

    /// The host name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Top-level label, e.g. `com`.
    pub fn tld(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or_default()
    }
}

impl fmt::Display for DomainCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainCandidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true when `tld` is in the fixed allow-list.
pub fn is_allowed_tld(tld: &str) -> bool {
    ALLOWED_TLDS.contains(tld.to_ascii_lowercase().as_str())
}

/// Extracts validated domain candidates from OCR text lines.
///
/// Each line is trimmed, lower-cased and split on whitespace. Every token is
/// stripped of surrounding punctuation, parsed as a URL authority (an `http://`
/// scheme is assumed when none is present) and reduced to its host. Hosts that
/// fail the grammar, the TLD allow-list or the length bounds are dropped.
///
/// The result keeps first-seen order and contains each host once.
///
/// # Examples
///
/// ```
/// use domain_analyzer::extract_domains;
///
/// let lines = ["Visit example.com today!", "not a domain", "EXAMPLE.COM", "sub-domain.co"];
/// let domains: Vec<String> = extract_domains(&lines)
///     .into_iter()
///     .map(|d| d.to_string())
///     .collect();
/// assert_eq!(domains, ["example.com", "sub-domain.co"]);
/// ```
pub fn extract_domains<S: AsRef<str>>(lines: &[S]) -> Vec<DomainCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for line in lines {
        let line = line.as_ref().trim().to_lowercase();
        if !line.contains('.') {
            continue;
        }

        for token in line.split_whitespace() {
            let Some(host) = host_from_token(token) else {
                continue;
            };
            if seen.contains(&host) {
                continue;
            }
            let Some(candidate) = DomainCandidate::parse(&host) else {
                continue;
            };
            seen.insert(host);
            results.push(candidate);
        }
    }

    log::debug!("Extracted {} domain candidate(s)", results.len());
    results
}

/// Reduces one token to the host of the URL it spells, if any.
fn host_from_token(token: &str) -> Option<String> {
    let token = token
        .trim_start_matches(TOKEN_PUNCTUATION)
        .trim_end_matches(|c| c == '.' || TOKEN_PUNCTUATION.contains(&c));
    // IDNA would turn non-ASCII hosts into punycode that passes the grammar
    if !token.contains('.') || !token.is_ascii() {
        return None;
    }

    let with_scheme = if token.contains("://") {
        token.to_string()
    } else {
        format!("http://{token}")
    };

    let parsed = url::Url::parse(&with_scheme).ok()?;
    match parsed.host()? {
        url::Host::Domain(host) => Some(host.to_string()),
        // IP literals are never domain candidates
        url::Host::Ipv4(_) | url::Host::Ipv6(_) => None,
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
