use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

// Anchored class regexes: a token is only variable when it matches in full.
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap());
static RE_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{4}-\d{2}-\d{2}|\d{2}:\d{2}:\d{2}|\d+,\d+)$").unwrap());
static RE_IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap());
static RE_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static RE_HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]+$").unwrap());
static RE_LONG_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32,}$").unwrap());

/// Decides whether a single token is a variable value, and whether two tokens
/// count as equivalent during edit-distance alignment.
#[derive(Debug, Clone)]
pub enum VariableDetector {
    /// Classifies numbers, timestamps, IPv4 addresses, UUIDs and hashes,
    /// each class individually switchable.
    Standard {
        numbers: bool,
        timestamps: bool,
        ips: bool,
        uuids: bool,
        hashes: bool,
    },
    /// User-supplied rules. Constants override patterns; unmatched tokens fall
    /// back to `default_to_variable`.
    Custom {
        variable_patterns: Vec<Regex>,
        constant_tokens: BTreeSet<String>,
        default_to_variable: bool,
    },
    /// Every token is variable and any two tokens align.
    AlwaysVariable,
    /// No token is variable; alignment is string equality.
    NeverVariable,
}

impl Default for VariableDetector {
    fn default() -> Self {
        VariableDetector::standard()
    }
}

impl VariableDetector {
    /// Standard detector with every class enabled.
    pub fn standard() -> Self {
        VariableDetector::Standard {
            numbers: true,
            timestamps: true,
            ips: true,
            uuids: true,
            hashes: true,
        }
    }

    pub fn custom() -> CustomDetectorBuilder {
        CustomDetectorBuilder::default()
    }

    pub fn is_variable(&self, token: &str) -> bool {
        match self {
            VariableDetector::Standard {
                numbers,
                timestamps,
                ips,
                uuids,
                hashes,
            } => {
                if token.is_empty() {
                    return false;
                }
                (*numbers && RE_NUMBER.is_match(token))
                    || (*timestamps && RE_TIMESTAMP.is_match(token))
                    || (*ips && RE_IPV4.is_match(token))
                    || (*uuids && RE_UUID.is_match(token))
                    || (*hashes
                        && (RE_HEX_LITERAL.is_match(token) || RE_LONG_HASH.is_match(token)))
            }
            VariableDetector::Custom {
                variable_patterns,
                constant_tokens,
                default_to_variable,
            } => {
                if token.is_empty() || constant_tokens.contains(token) {
                    return false;
                }
                if variable_patterns.iter().any(|p| p.is_match(token)) {
                    return true;
                }
                *default_to_variable
            }
            VariableDetector::AlwaysVariable => true,
            VariableDetector::NeverVariable => false,
        }
    }

    /// Equality predicate used during alignment: exact match, or two variables
    /// of the same class. Hashes never cross-match.
    pub fn tokens_match(&self, a: &str, b: &str) -> bool {
        match self {
            VariableDetector::AlwaysVariable => true,
            VariableDetector::NeverVariable => a == b,
            VariableDetector::Standard {
                numbers,
                timestamps,
                ips,
                uuids,
                ..
            } => {
                if a == b {
                    return true;
                }
                if !(self.is_variable(a) && self.is_variable(b)) {
                    return false;
                }
                (*numbers && RE_NUMBER.is_match(a) && RE_NUMBER.is_match(b))
                    || (*timestamps && RE_TIMESTAMP.is_match(a) && RE_TIMESTAMP.is_match(b))
                    || (*ips && RE_IPV4.is_match(a) && RE_IPV4.is_match(b))
                    || (*uuids && RE_UUID.is_match(a) && RE_UUID.is_match(b))
            }
            VariableDetector::Custom { .. } => {
                a == b || (self.is_variable(a) && self.is_variable(b))
            }
        }
    }
}

/// Builder for [`VariableDetector::Custom`].
#[derive(Debug, Default)]
pub struct CustomDetectorBuilder {
    variable_patterns: Vec<Regex>,
    constant_tokens: BTreeSet<String>,
    default_to_variable: bool,
}

impl CustomDetectorBuilder {
    /// Adds a pattern identifying variable tokens. The expression is anchored
    /// so it must match the whole token.
    pub fn variable_pattern(mut self, expr: &str) -> Result<Self, regex::Error> {
        self.variable_patterns
            .push(Regex::new(&format!("^(?:{expr})$"))?);
        Ok(self)
    }

    /// Marks a token that is always a constant, overriding variable patterns.
    pub fn constant_token(mut self, token: impl Into<String>) -> Self {
        self.constant_tokens.insert(token.into());
        self
    }

    /// Sets how unmatched tokens are classified.
    pub fn default_to_variable(mut self, default: bool) -> Self {
        self.default_to_variable = default;
        self
    }

    pub fn build(self) -> VariableDetector {
        VariableDetector::Custom {
            variable_patterns: self.variable_patterns,
            constant_tokens: self.constant_tokens,
            default_to_variable: self.default_to_variable,
        }
    }
}
