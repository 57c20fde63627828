use std::collections::BTreeSet;

use thiserror::Error;

use crate::detect::VariableDetector;
use crate::tokenize::Tokenizer;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("similarity threshold must be within [0.0, 1.0], got {0}")]
    SimilarityThresholdRange(f64),
    #[error("min cluster size must be at least 1")]
    MinClusterSize,
    #[error("max clusters must be at least 1")]
    MaxClusters,
    #[error("min pattern length must be at least 1")]
    MinPatternLength,
    #[error("max pattern length must be at least min pattern length")]
    PatternLengthOrder,
    #[error("min pattern specificity must be within [0.0, 1.0], got {0}")]
    PatternSpecificityRange(f64),
    #[error("hierarchy threshold must be within [0.0, 1.0], got {0}")]
    HierarchyThresholdRange(f64),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Engine configuration, frozen at construction. Built through
/// [`EngineConfig::builder`], which validates every field and rejects
/// out-of-range values.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    similarity_threshold: f64,
    min_cluster_size: usize,
    max_clusters: usize,
    tokenizer: Tokenizer,
    variable_detector: VariableDetector,
    normalize_timestamps: bool,
    normalize_ips: bool,
    normalize_numbers: bool,
    normalize_paths: bool,
    normalize_urls: bool,
    case_sensitive: bool,
    min_pattern_length: usize,
    max_pattern_length: usize,
    min_pattern_specificity: f64,
    ignore_tokens: BTreeSet<String>,
    enable_hierarchical_patterns: bool,
    hierarchy_thresholds: Vec<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            similarity_threshold: 0.5,
            min_cluster_size: 1,
            max_clusters: usize::MAX,
            tokenizer: Tokenizer::default(),
            variable_detector: VariableDetector::standard(),
            normalize_timestamps: false,
            normalize_ips: false,
            normalize_numbers: false,
            normalize_paths: false,
            normalize_urls: false,
            case_sensitive: true,
            min_pattern_length: 1,
            max_pattern_length: usize::MAX,
            min_pattern_specificity: 0.0,
            ignore_tokens: BTreeSet::new(),
            enable_hierarchical_patterns: false,
            hierarchy_thresholds: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Tuned for web server access logs (Apache, Nginx).
    pub fn web_server() -> Self {
        EngineConfig {
            similarity_threshold: 0.7,
            normalize_ips: true,
            normalize_timestamps: true,
            normalize_numbers: true,
            normalize_urls: true,
            ..EngineConfig::default()
        }
    }

    /// Tuned for application logs with free-form messages.
    pub fn application_log() -> Self {
        EngineConfig {
            similarity_threshold: 0.6,
            normalize_timestamps: true,
            normalize_numbers: true,
            normalize_paths: true,
            case_sensitive: false,
            ..EngineConfig::default()
        }
    }

    /// Tuned for system logs (syslog, systemd).
    pub fn system_log() -> Self {
        EngineConfig {
            similarity_threshold: 0.65,
            min_cluster_size: 2,
            normalize_timestamps: true,
            normalize_ips: true,
            normalize_numbers: true,
            ..EngineConfig::default()
        }
    }

    /// Lenient settings for heterogeneous multi-source corpora, with
    /// hierarchical extraction enabled.
    pub fn multi_source() -> Self {
        EngineConfig {
            similarity_threshold: 0.5,
            normalize_timestamps: true,
            normalize_ips: true,
            normalize_numbers: true,
            normalize_paths: true,
            normalize_urls: true,
            case_sensitive: false,
            enable_hierarchical_patterns: true,
            hierarchy_thresholds: vec![0.8, 0.5, 0.3],
            ..EngineConfig::default()
        }
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    pub fn max_clusters(&self) -> usize {
        self.max_clusters
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn variable_detector(&self) -> &VariableDetector {
        &self.variable_detector
    }

    pub fn normalize_timestamps(&self) -> bool {
        self.normalize_timestamps
    }

    pub fn normalize_ips(&self) -> bool {
        self.normalize_ips
    }

    pub fn normalize_numbers(&self) -> bool {
        self.normalize_numbers
    }

    pub fn normalize_paths(&self) -> bool {
        self.normalize_paths
    }

    pub fn normalize_urls(&self) -> bool {
        self.normalize_urls
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn min_pattern_length(&self) -> usize {
        self.min_pattern_length
    }

    pub fn max_pattern_length(&self) -> usize {
        self.max_pattern_length
    }

    pub fn min_pattern_specificity(&self) -> f64 {
        self.min_pattern_specificity
    }

    pub fn ignore_tokens(&self) -> &BTreeSet<String> {
        &self.ignore_tokens
    }

    pub fn enable_hierarchical_patterns(&self) -> bool {
        self.enable_hierarchical_patterns
    }

    pub fn hierarchy_thresholds(&self) -> &[f64] {
        &self.hierarchy_thresholds
    }

    // Level configs for hierarchical extraction reuse the validated fields
    // wholesale; only the threshold changes, and it comes from an already
    // validated hierarchy list or the built-in defaults.
    pub(crate) fn clone_with_threshold(&self, similarity_threshold: f64) -> EngineConfig {
        EngineConfig {
            similarity_threshold,
            ..self.clone()
        }
    }
}

/// Builder for [`EngineConfig`]. All validation happens in [`build`].
///
/// [`build`]: ConfigBuilder::build
#[derive(Debug)]
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            config: EngineConfig::default(),
        }
    }
}

impl ConfigBuilder {
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn min_cluster_size(mut self, size: usize) -> Self {
        self.config.min_cluster_size = size;
        self
    }

    pub fn max_clusters(mut self, max: usize) -> Self {
        self.config.max_clusters = max;
        self
    }

    pub fn tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.config.tokenizer = tokenizer;
        self
    }

    pub fn variable_detector(mut self, detector: VariableDetector) -> Self {
        self.config.variable_detector = detector;
        self
    }

    pub fn normalize_timestamps(mut self, normalize: bool) -> Self {
        self.config.normalize_timestamps = normalize;
        self
    }

    pub fn normalize_ips(mut self, normalize: bool) -> Self {
        self.config.normalize_ips = normalize;
        self
    }

    pub fn normalize_numbers(mut self, normalize: bool) -> Self {
        self.config.normalize_numbers = normalize;
        self
    }

    pub fn normalize_paths(mut self, normalize: bool) -> Self {
        self.config.normalize_paths = normalize;
        self
    }

    pub fn normalize_urls(mut self, normalize: bool) -> Self {
        self.config.normalize_urls = normalize;
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.config.case_sensitive = sensitive;
        self
    }

    pub fn min_pattern_length(mut self, length: usize) -> Self {
        self.config.min_pattern_length = length;
        self
    }

    pub fn max_pattern_length(mut self, length: usize) -> Self {
        self.config.max_pattern_length = length;
        self
    }

    pub fn min_pattern_specificity(mut self, specificity: f64) -> Self {
        self.config.min_pattern_specificity = specificity;
        self
    }

    pub fn ignore_token(mut self, token: impl Into<String>) -> Self {
        self.config.ignore_tokens.insert(token.into());
        self
    }

    pub fn ignore_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .ignore_tokens
            .extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn enable_hierarchical_patterns(mut self, enable: bool) -> Self {
        self.config.enable_hierarchical_patterns = enable;
        self
    }

    pub fn hierarchy_threshold(mut self, threshold: f64) -> Self {
        self.config.hierarchy_thresholds.push(threshold);
        self
    }

    pub fn hierarchy_thresholds<I>(mut self, thresholds: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.config.hierarchy_thresholds.extend(thresholds);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.similarity_threshold) {
            return Err(ConfigError::SimilarityThresholdRange(c.similarity_threshold));
        }
        if c.min_cluster_size < 1 {
            return Err(ConfigError::MinClusterSize);
        }
        if c.max_clusters < 1 {
            return Err(ConfigError::MaxClusters);
        }
        if c.min_pattern_length < 1 {
            return Err(ConfigError::MinPatternLength);
        }
        if c.max_pattern_length < c.min_pattern_length {
            return Err(ConfigError::PatternLengthOrder);
        }
        if !(0.0..=1.0).contains(&c.min_pattern_specificity) {
            return Err(ConfigError::PatternSpecificityRange(
                c.min_pattern_specificity,
            ));
        }
        if let Some(&t) = c
            .hierarchy_thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(ConfigError::HierarchyThresholdRange(t));
        }
        Ok(self.config)
    }
}
