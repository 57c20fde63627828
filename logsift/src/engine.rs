use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cluster::Cluster;
use crate::config::EngineConfig;
use crate::detect::VariableDetector;
use crate::hierarchy::PatternForest;
use crate::message::Message;
use crate::pattern::Pattern;
use crate::preprocess::Preprocessor;

/// Live admission count between small-cluster prunes in streaming mode.
const PRUNE_INTERVAL: usize = 100;
/// Live admission count between full pattern re-syntheses in streaming mode.
const REFRESH_INTERVAL: usize = 50;
/// Thresholds used for hierarchical extraction when the config lists none.
const DEFAULT_HIERARCHY_THRESHOLDS: [f64; 3] = [0.5, 0.7, 0.9];

/// The clustering and synthesis engine: greedy single-pass clustering with a
/// bounded cluster count, periodic pruning, and support-ordered patterns.
///
/// Clustering is order-sensitive; two engines fed the same lines in the same
/// order produce identical results, while different orders may emit a
/// different pattern set (each pattern's id is still a function of its own
/// tokens only).
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    detector: Arc<VariableDetector>,
    preprocessor: Option<Preprocessor>,
    clusters: Vec<Cluster>,
    patterns: Vec<Pattern>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let detector = Arc::new(config.variable_detector().clone());
        let preprocessor = Preprocessor::from_config(&config);
        Engine {
            config,
            detector,
            preprocessor,
            clusters: Vec::new(),
            patterns: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn build_message(&self, line: &str) -> Message {
        let processed = match &self.preprocessor {
            Some(p) => p.preprocess(line),
            None => line.to_owned(),
        };
        let tokens = self.config.tokenizer().tokenize(&processed);
        Message::with_processed(line, processed, tokens, self.detector.clone())
    }

    /// Runs a full batch: cluster every line in input order, drop clusters
    /// below the minimum size, synthesize, and return patterns sorted by
    /// support descending (ties keep first-admission order). Resets any
    /// previous state.
    pub fn process<S: AsRef<str>>(&mut self, lines: &[S]) -> Vec<Pattern> {
        self.clusters.clear();
        self.patterns.clear();

        for line in lines {
            let message = self.build_message(line.as_ref());
            if message.is_empty() {
                continue;
            }
            self.admit(message);
        }

        let min_size = self.config.min_cluster_size();
        self.clusters.retain(|c| c.size() >= min_size);
        self.rebuild_patterns();
        self.patterns.clone()
    }

    /// Admits one line in streaming mode. Prunes small clusters on every
    /// 100th live admission; re-synthesizes the sorted pattern list when it
    /// is empty or on every 50th.
    pub fn process_log_incremental(&mut self, line: &str) {
        let message = self.build_message(line);
        if message.is_empty() {
            return;
        }
        self.admit(message);

        if self.total_messages() % PRUNE_INTERVAL == 0 {
            let min_size = self.config.min_cluster_size();
            let before = self.clusters.len();
            self.clusters.retain(|c| c.size() >= min_size);
            if self.clusters.len() < before {
                debug!(
                    removed = before - self.clusters.len(),
                    remaining = self.clusters.len(),
                    "pruned small clusters"
                );
            }
        }

        let total = self.total_messages();
        if self.patterns.is_empty() || (total > 0 && total % REFRESH_INTERVAL == 0) {
            self.rebuild_patterns();
        }
    }

    // First-fit admission against existing clusters in creation order; a new
    // cluster below the cap; otherwise a forced merge into the most similar
    // cluster regardless of threshold, so no admission is ever dropped.
    fn admit(&mut self, mut message: Message) {
        let threshold = self.config.similarity_threshold();
        for cluster in &mut self.clusters {
            message = match cluster.try_admit(message, threshold) {
                Ok(()) => return,
                Err(message) => message,
            };
        }

        if self.clusters.len() < self.config.max_clusters() {
            self.clusters
                .push(Cluster::new(message, self.detector.clone()));
        } else if let Some(closest) = self.closest_cluster_index(&message) {
            debug!(cluster = closest, "forced merge at cluster capacity");
            self.clusters[closest].force_admit(message);
        }
    }

    fn closest_cluster_index(&self, message: &Message) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, cluster) in self.clusters.iter().enumerate() {
            let similarity = cluster.similarity_to(message);
            if best.map_or(true, |(_, b)| similarity > b) {
                best = Some((i, similarity));
            }
        }
        best.map(|(i, _)| i)
    }

    fn rebuild_patterns(&mut self) {
        self.patterns = self
            .clusters
            .iter_mut()
            .map(|c| c.pattern().clone())
            .collect();
        // Stable sort: equal supports keep cluster-creation order.
        self.patterns
            .sort_by(|a, b| b.support_count().cmp(&a.support_count()));
    }

    /// First pattern (in current sort order) matching the line, if any.
    pub fn match_pattern(&self, line: &str) -> Option<Pattern> {
        let message = self.build_message(line);
        self.patterns.iter().find(|p| p.matches(&message)).cloned()
    }

    /// Defensive copy of the current sorted pattern list.
    pub fn patterns(&self) -> Vec<Pattern> {
        self.patterns.clone()
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
        self.patterns.clear();
    }

    /// Messages currently held across live clusters. Pruning removes whole
    /// clusters, so this count can decrease.
    pub fn total_messages(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum()
    }

    pub fn stats(&self) -> EngineStats {
        let total_messages = self.total_messages();
        let cluster_count = self.clusters.len();
        let avg_cluster_size = if cluster_count == 0 {
            0.0
        } else {
            total_messages as f64 / cluster_count as f64
        };
        let avg_pattern_specificity = if self.patterns.is_empty() {
            0.0
        } else {
            self.patterns.iter().map(Pattern::specificity).sum::<f64>() / self.patterns.len() as f64
        };
        EngineStats {
            total_messages,
            cluster_count,
            pattern_count: self.patterns.len(),
            avg_cluster_size,
            avg_pattern_specificity,
        }
    }

    /// Re-clusters the currently held raw lines once per hierarchy threshold
    /// and arranges the resulting patterns into a coarse-to-fine forest.
    ///
    /// This reruns batch clustering `|thresholds|` times; invoke it
    /// periodically, not per message.
    pub fn extract_hierarchical_patterns(&self) -> PatternForest {
        if !self.config.enable_hierarchical_patterns() {
            return PatternForest::default();
        }

        let thresholds: Vec<f64> = if self.config.hierarchy_thresholds().is_empty() {
            DEFAULT_HIERARCHY_THRESHOLDS.to_vec()
        } else {
            self.config.hierarchy_thresholds().to_vec()
        };

        let lines: Vec<String> = self
            .clusters
            .iter()
            .flat_map(|c| c.members().iter().map(|m| m.raw().to_owned()))
            .collect();

        let mut levels = Vec::with_capacity(thresholds.len());
        for &threshold in &thresholds {
            let mut level_engine = Engine::new(self.config.clone_with_threshold(threshold));
            levels.push(level_engine.process(&lines));
        }

        PatternForest::build(&thresholds, levels)
    }
}

/// Snapshot of clustering and synthesis state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_messages: usize,
    pub cluster_count: usize,
    pub pattern_count: usize,
    pub avg_cluster_size: f64,
    pub avg_pattern_specificity: f64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing Statistics:")?;
        writeln!(f, "  Total Messages: {}", self.total_messages)?;
        writeln!(f, "  Number of Clusters: {}", self.cluster_count)?;
        writeln!(f, "  Number of Patterns: {}", self.pattern_count)?;
        writeln!(f, "  Average Cluster Size: {:.2}", self.avg_cluster_size)?;
        write!(
            f,
            "  Average Pattern Specificity: {:.2}",
            self.avg_pattern_specificity
        )
    }
}
