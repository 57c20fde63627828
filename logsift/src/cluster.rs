use std::sync::Arc;

use crate::detect::VariableDetector;
use crate::message::Message;
use crate::pattern::Pattern;

/// An ordered group of similar messages. The first message admitted is the
/// representative and stays the admission centroid for the cluster's
/// lifetime; the synthesized pattern is cached until the next admission.
#[derive(Debug, Clone)]
pub struct Cluster {
    members: Vec<Message>,
    detector: Arc<VariableDetector>,
    cached_pattern: Option<Pattern>,
}

impl Cluster {
    pub fn new(first: Message, detector: Arc<VariableDetector>) -> Self {
        Cluster {
            members: vec![first],
            detector,
            cached_pattern: None,
        }
    }

    pub fn representative(&self) -> &Message {
        &self.members[0]
    }

    /// Admits the message when its similarity to the representative clears
    /// the threshold; hands the message back otherwise.
    pub fn try_admit(&mut self, message: Message, threshold: f64) -> Result<(), Message> {
        if self.similarity_to(&message) >= threshold {
            self.force_admit(message);
            Ok(())
        } else {
            Err(message)
        }
    }

    /// Unconditional admission, used by the engine's forced merge when the
    /// cluster cap is reached.
    pub fn force_admit(&mut self, message: Message) {
        self.members.push(message);
        self.cached_pattern = None;
    }

    pub fn similarity_to(&self, message: &Message) -> f64 {
        self.representative().similarity(message)
    }

    /// The cluster's pattern, synthesizing and caching it on first access
    /// after an admission.
    pub fn pattern(&mut self) -> &Pattern {
        let Cluster {
            members,
            detector,
            cached_pattern,
        } = self;
        cached_pattern.get_or_insert_with(|| Pattern::from_members(members, detector))
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[Message] {
        &self.members
    }
}
