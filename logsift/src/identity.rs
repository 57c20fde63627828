use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::pattern::{Pattern, WILDCARD};

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<[^>]+>$").unwrap());

/// True for every spelling treated as a wildcard during canonicalization:
/// the synthesis sentinel `***`, bare `*`, `<*>`, and any `<...>` placeholder.
/// Different synthesis conventions therefore collapse to the same identifier.
pub fn is_wildcard(token: &str) -> bool {
    token == WILDCARD || token == "*" || token == "<*>" || RE_PLACEHOLDER.is_match(token)
}

/// Content-addressed pattern identifier: URL-safe base64 (no padding) of the
/// SHA-256 over canonical tokens joined by NUL. The NUL separator keeps
/// `["a b", "c"]` and `["a", "b c"]` from colliding; wildcards canonicalize
/// to `*` before hashing.
pub fn pattern_id(tokens: &[String]) -> String {
    let mut hasher = Sha256::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        if is_wildcard(token) {
            hasher.update(b"*");
        } else {
            hasher.update(token.as_bytes());
        }
    }
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// First 16 characters of the full identifier, for display.
pub fn short_pattern_id(tokens: &[String]) -> String {
    let id = pattern_id(tokens);
    let cut = id.len().min(16);
    id[..cut].to_owned()
}

/// Tokens joined with single spaces, not canonicalized.
pub fn signature(tokens: &[String]) -> String {
    tokens.iter().join(" ")
}

/// Storage key scoping a pattern to a source and environment, for external
/// stores that deduplicate across nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub pattern_id: String,
    pub signature: String,
    pub source: String,
    pub environment: String,
}

impl CompositeKey {
    pub fn new(pattern: &Pattern, source: impl Into<String>, environment: impl Into<String>) -> Self {
        CompositeKey {
            pattern_id: pattern.id(),
            signature: pattern.signature(),
            source: source.into(),
            environment: environment.into(),
        }
    }

    /// `pattern_id:source:environment`
    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.pattern_id, self.source, self.environment)
    }

    /// The pattern id alone, for aggregation across all sources.
    pub fn global_key(&self) -> &str {
        &self.pattern_id
    }
}
