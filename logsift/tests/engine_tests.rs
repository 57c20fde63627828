use logsift::config::EngineConfig;
use logsift::engine::Engine;
use logsift::tokenize::Tokenizer;

fn engine(threshold: f64, min_cluster_size: usize) -> Engine {
    let config = EngineConfig::builder()
        .similarity_threshold(threshold)
        .min_cluster_size(min_cluster_size)
        .tokenizer(Tokenizer::whitespace())
        .build()
        .unwrap();
    Engine::new(config)
}

fn tokens(pattern: &logsift::pattern::Pattern) -> Vec<&str> {
    pattern.tokens().iter().map(String::as_str).collect()
}

#[test]
fn login_and_error_lines_form_two_patterns() {
    let mut engine = engine(0.5, 2);
    let patterns = engine.process(&[
        "INFO User alice logged in",
        "INFO User bob logged in",
        "ERROR Database connection failed",
        "ERROR Database connection failed",
    ]);

    assert_eq!(patterns.len(), 2);
    // Equal support: first-admission order decides, so the login pattern leads.
    assert_eq!(
        tokens(&patterns[0]),
        vec!["INFO", "User", "***", "logged", "in"]
    );
    assert_eq!(patterns[0].support_count(), 2);
    assert_eq!(
        tokens(&patterns[1]),
        vec!["ERROR", "Database", "connection", "failed"]
    );
    assert_eq!(patterns[1].support_count(), 2);
}

#[test]
fn detector_equivalence_clusters_ids_apart_from_literal_drift() {
    // 12345/67890 align as numbers; 234ms/456ms differ literally, so pairwise
    // similarity is exactly 0.8 and one cluster forms at that cutoff.
    let mut engine = engine(0.8, 2);
    let patterns = engine.process(&[
        "Request 12345 processed in 234ms",
        "Request 67890 processed in 456ms",
        "Request 11111 processed in 789ms",
    ]);

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].support_count(), 3);
    assert_eq!(
        tokens(&patterns[0]),
        vec!["Request", "***", "processed", "in", "***"]
    );
}

#[test]
fn forced_merge_at_capacity_drops_nothing() {
    let config = EngineConfig::builder()
        .similarity_threshold(0.95)
        .min_cluster_size(1)
        .max_clusters(3)
        .tokenizer(Tokenizer::whitespace())
        .build()
        .unwrap();
    let mut engine = Engine::new(config);

    let lines: Vec<String> = (0..10)
        .map(|i| format!("LOG_TYPE_{i} unique message {i}"))
        .collect();
    let patterns = engine.process(&lines);

    let stats = engine.stats();
    assert!(stats.cluster_count <= 3);
    assert_eq!(stats.total_messages, 10);
    assert_eq!(patterns.iter().map(|p| p.support_count()).sum::<usize>(), 10);
}

#[test]
fn empty_input_yields_no_patterns() {
    let mut engine = engine(0.5, 1);
    assert!(engine.process::<&str>(&[]).is_empty());
    assert_eq!(engine.stats().cluster_count, 0);
}

#[test]
fn blank_lines_are_dropped() {
    let mut engine = engine(0.5, 1);
    let patterns = engine.process(&["", "   ", "ERROR disk full"]);
    assert_eq!(patterns.len(), 1);
    assert_eq!(engine.stats().total_messages, 1);
}

#[test]
fn min_cluster_size_filters_singletons() {
    let mut engine = engine(0.9, 2);
    let patterns = engine.process(&[
        "alpha beta gamma",
        "totally different line here",
        "yet another unrelated entry",
    ]);
    assert!(patterns.is_empty());
}

#[test]
fn single_admission_emits_one_pattern_when_min_size_allows() {
    let mut engine = engine(0.5, 1);
    let patterns = engine.process(&["only one line"]);
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].support_count(), 1);
}

#[test]
fn patterns_sort_by_support_descending() {
    let mut engine = engine(0.5, 1);
    let patterns = engine.process(&[
        "GET /api/users returned",
        "cache miss for key alpha",
        "cache miss for key beta",
        "cache miss for key gamma",
    ]);
    let supports: Vec<usize> = patterns.iter().map(|p| p.support_count()).collect();
    assert_eq!(supports, vec![3, 1]);
}

#[test]
fn process_resets_previous_state() {
    let mut engine = engine(0.5, 1);
    engine.process(&["first corpus line"]);
    let patterns = engine.process(&["second corpus line"]);
    assert_eq!(patterns.len(), 1);
    assert_eq!(tokens(&patterns[0]), vec!["second", "corpus", "line"]);
    assert_eq!(engine.stats().total_messages, 1);
}

#[test]
fn match_pattern_returns_first_match_in_sort_order() {
    let mut engine = engine(0.5, 2);
    engine.process(&[
        "INFO User alice logged in",
        "INFO User bob logged in",
        "ERROR Database connection failed",
        "ERROR Database connection failed",
    ]);

    let matched = engine.match_pattern("INFO User mallory logged in").unwrap();
    assert_eq!(tokens(&matched), vec!["INFO", "User", "***", "logged", "in"]);
    assert!(engine.match_pattern("CRITICAL unknown failure").is_none());
}

#[test]
fn match_pattern_without_patterns_is_none() {
    let engine = engine(0.5, 1);
    assert!(engine.match_pattern("anything at all").is_none());
}

#[test]
fn clear_is_idempotent() {
    let mut engine = engine(0.5, 1);
    engine.process(&["one line", "another line"]);
    engine.clear();
    let stats = engine.stats();
    assert_eq!(stats.total_messages, 0);
    assert_eq!(stats.cluster_count, 0);
    assert_eq!(stats.pattern_count, 0);

    engine.clear();
    let again = engine.stats();
    assert_eq!(again.total_messages, 0);
    assert_eq!(again.cluster_count, 0);
    assert_eq!(again.pattern_count, 0);
}

#[test]
fn stats_report_counts_and_averages() {
    let mut engine = engine(0.5, 2);
    engine.process(&[
        "INFO User alice logged in",
        "INFO User bob logged in",
        "ERROR Database connection failed",
        "ERROR Database connection failed",
    ]);
    let stats = engine.stats();
    assert_eq!(stats.total_messages, 4);
    assert_eq!(stats.cluster_count, 2);
    assert_eq!(stats.pattern_count, 2);
    assert!((stats.avg_cluster_size - 2.0).abs() < 1e-9);
    assert!(stats.avg_pattern_specificity > 0.0);
    assert!(stats.avg_pattern_specificity <= 1.0);
}

#[test]
fn incremental_refresh_fires_on_first_and_every_50th_admission() {
    let mut engine = engine(0.5, 1);
    engine.process_log_incremental("worker heartbeat ok");
    assert_eq!(engine.patterns().len(), 1);
    assert_eq!(engine.patterns()[0].support_count(), 1);

    for _ in 1..49 {
        engine.process_log_incremental("worker heartbeat ok");
    }
    // 49 admissions total: the list still reflects the first refresh.
    assert_eq!(engine.patterns()[0].support_count(), 1);

    engine.process_log_incremental("worker heartbeat ok");
    assert_eq!(engine.patterns()[0].support_count(), 50);
}

#[test]
fn incremental_prune_fires_exactly_on_the_100th_admission() {
    let mut engine = engine(0.5, 2);
    for _ in 0..99 {
        engine.process_log_incremental("INFO Common message");
    }
    // The rare line lands as the 100th admission and its singleton cluster is
    // pruned on the same tick.
    engine.process_log_incremental("ERROR Rare");
    let stats = engine.stats();
    assert_eq!(stats.cluster_count, 1);
    assert_eq!(stats.total_messages, 99);
}

#[test]
fn incremental_and_batch_agree_on_patterns() {
    let lines: Vec<String> = (0..60)
        .map(|i| format!("session {i} closed cleanly"))
        .collect();

    let mut batch = engine(0.5, 1);
    let batch_patterns = batch.process(&lines);

    let mut streaming = engine(0.5, 1);
    for line in &lines {
        streaming.process_log_incremental(line);
    }
    // 60 admissions: last refresh at 50 covers the same single cluster.
    let streaming_patterns = streaming.patterns();

    assert_eq!(batch_patterns.len(), 1);
    assert_eq!(streaming_patterns.len(), 1);
    assert_eq!(batch_patterns[0], streaming_patterns[0]);
}
