use std::sync::Arc;

use crate::detect::VariableDetector;

/// A single log line after preprocessing and tokenization. Immutable once
/// constructed; similarity is computed against the token sequence only.
#[derive(Debug, Clone)]
pub struct Message {
    raw: String,
    processed: String,
    tokens: Vec<String>,
    detector: Arc<VariableDetector>,
}

impl Message {
    pub fn new(raw: impl Into<String>, tokens: Vec<String>, detector: Arc<VariableDetector>) -> Self {
        let raw = raw.into();
        Message {
            processed: raw.clone(),
            raw,
            tokens,
            detector,
        }
    }

    pub fn with_processed(
        raw: impl Into<String>,
        processed: impl Into<String>,
        tokens: Vec<String>,
        detector: Arc<VariableDetector>,
    ) -> Self {
        Message {
            raw: raw.into(),
            processed: processed.into(),
            tokens,
            detector,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn processed(&self) -> &str {
        &self.processed
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token-level Levenshtein distance (Wagner-Fischer, rolling rows) with
    /// the detector's equivalence as the match predicate. Substitution,
    /// insertion and deletion all cost 1.
    pub fn edit_distance(&self, other: &Message) -> usize {
        let m = self.tokens.len();
        let n = other.tokens.len();
        let mut prev: Vec<usize> = (0..=n).collect();
        let mut curr = vec![0usize; n + 1];

        for i in 1..=m {
            curr[0] = i;
            for j in 1..=n {
                if self
                    .detector
                    .tokens_match(&self.tokens[i - 1], &other.tokens[j - 1])
                {
                    curr[j] = prev[j - 1];
                } else {
                    curr[j] = 1 + prev[j].min(curr[j - 1]).min(prev[j - 1]);
                }
            }
            std::mem::swap(&mut prev, &mut curr);
        }
        prev[n]
    }

    /// `1 - distance / max(len_a, len_b)`; two empty messages are identical.
    pub fn similarity(&self, other: &Message) -> f64 {
        let max_len = self.tokens.len().max(other.tokens.len());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - self.edit_distance(other) as f64 / max_len as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(line: &str) -> Message {
        let detector = Arc::new(VariableDetector::standard());
        let tokens = line.split_whitespace().map(str::to_owned).collect();
        Message::new(line, tokens, detector)
    }

    #[test]
    fn identical_messages_have_zero_distance() {
        let a = msg("INFO user logged in");
        let b = msg("INFO user logged in");
        assert_eq!(a.edit_distance(&b), 0);
        assert_eq!(a.similarity(&b), 1.0);
    }

    #[test]
    fn single_substitution_costs_one() {
        let a = msg("INFO user alice logged in");
        let b = msg("INFO user bob logged in");
        assert_eq!(a.edit_distance(&b), 1);
        assert!((a.similarity(&b) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn detector_equivalence_aligns_numbers() {
        let a = msg("request 123 done");
        let b = msg("request 456 done");
        assert_eq!(a.edit_distance(&b), 0);
        assert_eq!(a.similarity(&b), 1.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = msg("GET /api/users HTTP/1.1 200");
        let b = msg("POST /api/orders HTTP/1.1");
        assert_eq!(a.edit_distance(&b), b.edit_distance(&a));
    }

    #[test]
    fn length_difference_costs_insertions() {
        let a = msg("one two three");
        let b = msg("one two three four five");
        assert_eq!(a.edit_distance(&b), 2);
        assert!((a.similarity(&b) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn empty_messages_are_identical() {
        let a = msg("");
        let b = msg("");
        assert_eq!(a.similarity(&b), 1.0);
    }
}
