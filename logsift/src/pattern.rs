use std::fmt;

use crate::detect::VariableDetector;
use crate::identity;
use crate::message::Message;

/// Sentinel emitted for variable positions during synthesis.
pub const WILDCARD: &str = "***";

/// The synthesized template of a cluster: literal tokens with wildcards at
/// positions that vary across members. Immutable.
#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<String>,
    support_count: usize,
}

impl Pattern {
    pub fn new(tokens: Vec<String>, support_count: usize) -> Self {
        Pattern {
            tokens,
            support_count,
        }
    }

    /// Synthesizes a pattern from cluster members.
    ///
    /// The first member's tokens are the template. A position becomes a
    /// wildcard when the detector classifies the template token as variable,
    /// or when any other member disagrees with it (strict string comparison;
    /// detector equivalence plays no part here). Members longer than the
    /// template contribute no extra positions.
    pub fn from_members(members: &[Message], detector: &VariableDetector) -> Pattern {
        match members {
            [] => Pattern::new(Vec::new(), 0),
            [only] => {
                // Single members still get detector-driven wildcards, so IDs
                // and timestamps do not leak into the template.
                let tokens = only
                    .tokens()
                    .iter()
                    .map(|t| {
                        if detector.is_variable(t) {
                            WILDCARD.to_owned()
                        } else {
                            t.clone()
                        }
                    })
                    .collect();
                Pattern::new(tokens, 1)
            }
            [template, rest @ ..] => {
                let tokens = template
                    .tokens()
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let variable = detector.is_variable(t)
                            || rest.iter().any(|m| m.tokens().get(i) != Some(t));
                        if variable {
                            WILDCARD.to_owned()
                        } else {
                            t.clone()
                        }
                    })
                    .collect();
                Pattern::new(tokens, members.len())
            }
        }
    }

    /// True when the message has exactly this pattern's length and every
    /// non-wildcard position is string-equal.
    pub fn matches(&self, message: &Message) -> bool {
        let tokens = message.tokens();
        if tokens.len() != self.tokens.len() {
            return false;
        }
        self.tokens
            .iter()
            .zip(tokens)
            .all(|(p, t)| p == WILDCARD || p == t)
    }

    /// Ratio of literal tokens to total tokens; 0 for the empty pattern.
    pub fn specificity(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let literal = self.tokens.iter().filter(|t| t.as_str() != WILDCARD).count();
        literal as f64 / self.tokens.len() as f64
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn support_count(&self) -> usize {
        self.support_count
    }

    /// Human-readable form: tokens joined with spaces, shown verbatim.
    pub fn signature(&self) -> String {
        identity::signature(&self.tokens)
    }

    /// Content-addressed identifier; stable across nodes and wildcard
    /// spellings.
    pub fn id(&self) -> String {
        identity::pattern_id(&self.tokens)
    }

    pub fn short_id(&self) -> String {
        identity::short_pattern_id(&self.tokens)
    }

    fn pattern_string(&self) -> String {
        self.tokens.concat()
    }
}

// Two patterns are equal when their token sequences are; support counts are
// a property of the synthesis run, not of the pattern.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern_string() == other.pattern_string()
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (support: {})", self.signature(), self.support_count)
    }
}
