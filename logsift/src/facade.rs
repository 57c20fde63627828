use std::collections::VecDeque;
use std::fmt;
use std::sync::RwLock;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::{Engine, EngineStats};
use crate::hierarchy::PatternForest;
use crate::pattern::Pattern;

/// How ingested lines are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Process each line immediately; raw lines are not retained and memory
    /// stays proportional to the cluster count.
    Streaming,
    /// Buffer lines (up to a cap, oldest evicted first) and process them all
    /// on an explicit [`LogSift::extract_patterns`] call.
    Batch,
}

/// Characters admitted per line; longer inputs are truncated, not rejected.
const MAX_LOG_CHARS: usize = 10_000;
/// Default cap on buffered lines in batch mode.
const DEFAULT_MAX_BUFFERED_LOGS: usize = 100_000;
/// Streaming snapshot refresh granularity; matches the engine's re-synthesis
/// interval so a refresh never copies a list that is about to change again.
const SNAPSHOT_REFRESH_INTERVAL: usize = 50;

/// Thread-safe entry point wrapping an [`Engine`] behind one readers-writer
/// lock. Ingest and clearing take the write side; pattern reads, statistics
/// and anomaly checks take the read side.
///
/// In streaming mode the cached pattern snapshot is refreshed every
/// [`SNAPSHOT_REFRESH_INTERVAL`] admissions plus an on-read rendezvous, so
/// readers can observe a snapshot that is at most 49 admissions (or one
/// [`current_patterns`] call) stale, but never an inconsistent one.
///
/// [`current_patterns`]: LogSift::current_patterns
pub struct LogSift {
    mode: Mode,
    max_buffered_logs: usize,
    state: RwLock<State>,
}

#[derive(Debug)]
struct State {
    engine: Engine,
    buffer: VecDeque<String>,
    current_patterns: Vec<Pattern>,
    patterns_stale: bool,
    last_pattern_update_count: usize,
}

impl LogSift {
    pub fn new(mode: Mode) -> Self {
        Self::with_config(mode, EngineConfig::default())
    }

    pub fn with_config(mode: Mode, config: EngineConfig) -> Self {
        Self::with_capacity(mode, config, DEFAULT_MAX_BUFFERED_LOGS)
    }

    pub fn with_capacity(mode: Mode, config: EngineConfig, max_buffered_logs: usize) -> Self {
        LogSift {
            mode,
            max_buffered_logs,
            state: RwLock::new(State {
                engine: Engine::new(config),
                buffer: VecDeque::new(),
                current_patterns: Vec::new(),
                patterns_stale: true,
                last_pattern_update_count: 0,
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.mode == Mode::Streaming
    }

    pub fn is_batch(&self) -> bool {
        self.mode == Mode::Batch
    }

    /// Ingests one line. Blank input is dropped silently; oversized input is
    /// truncated to [`MAX_LOG_CHARS`] characters but still counts as one
    /// admission.
    pub fn add_log(&self, line: &str) {
        let Some(line) = validate(line) else { return };
        let mut state = self.state.write().unwrap();
        match self.mode {
            Mode::Streaming => state.ingest_streaming(&line),
            Mode::Batch => state.buffer_log(line, self.max_buffered_logs),
        }
    }

    /// Bulk ingest. In streaming mode this processes every line first and
    /// refreshes the snapshot exactly once at the end, skipping the per-line
    /// refresh check entirely.
    pub fn add_logs<S: AsRef<str>>(&self, lines: &[S]) {
        if lines.is_empty() {
            return;
        }
        let mut state = self.state.write().unwrap();
        match self.mode {
            Mode::Streaming => {
                for line in lines {
                    if let Some(line) = validate(line.as_ref()) {
                        state.engine.process_log_incremental(&line);
                    }
                }
                state.refresh_snapshot();
            }
            Mode::Batch => {
                for line in lines {
                    if let Some(line) = validate(line.as_ref()) {
                        state.buffer_log(line, self.max_buffered_logs);
                    }
                }
            }
        }
    }

    /// In batch mode, runs a full process over the buffered lines (when new
    /// input arrived since the last run) and returns the patterns. In
    /// streaming mode the engine's list is already current and is returned
    /// directly.
    pub fn extract_patterns(&self) -> Vec<Pattern> {
        let mut state = self.state.write().unwrap();
        match self.mode {
            Mode::Streaming => state.engine.patterns(),
            Mode::Batch => {
                if state.patterns_stale && !state.buffer.is_empty() {
                    let lines: Vec<String> = state.buffer.iter().cloned().collect();
                    state.current_patterns = state.engine.process(&lines);
                    state.patterns_stale = false;
                }
                state.current_patterns.clone()
            }
        }
    }

    /// Cached snapshot of the pattern list. In streaming mode a stale
    /// snapshot is refreshed first (the read lock is dropped, the write lock
    /// taken, and the staleness re-checked); in batch mode the snapshot may
    /// lag until [`LogSift::extract_patterns`] runs.
    pub fn current_patterns(&self) -> Vec<Pattern> {
        if self.mode == Mode::Streaming {
            {
                let state = self.state.read().unwrap();
                if !state.needs_snapshot_refresh() {
                    return state.current_patterns.clone();
                }
            }
            let mut state = self.state.write().unwrap();
            if state.needs_snapshot_refresh() {
                state.refresh_snapshot();
            }
            state.current_patterns.clone()
        } else {
            self.state.read().unwrap().current_patterns.clone()
        }
    }

    /// First pattern matching the line, if any. Not an error when absent.
    pub fn match_pattern(&self, line: &str) -> Option<Pattern> {
        self.state.read().unwrap().engine.match_pattern(line)
    }

    /// True when the line matches no known pattern. Always false while the
    /// snapshot is empty, since nothing can be judged anomalous yet.
    pub fn is_anomaly(&self, line: &str) -> bool {
        let state = self.state.read().unwrap();
        if state.current_patterns.is_empty() {
            return false;
        }
        state.engine.match_pattern(line).is_none()
    }

    /// See [`Engine::extract_hierarchical_patterns`].
    pub fn extract_hierarchical_patterns(&self) -> PatternForest {
        self.state.read().unwrap().engine.extract_hierarchical_patterns()
    }

    /// Drops buffered lines, clusters, patterns and the snapshot watermark.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap();
        state.buffer.clear();
        state.engine.clear();
        state.current_patterns.clear();
        state.patterns_stale = true;
        state.last_pattern_update_count = 0;
    }

    /// Streaming: messages held across live clusters. Batch: buffered lines.
    pub fn log_count(&self) -> usize {
        let state = self.state.read().unwrap();
        match self.mode {
            Mode::Streaming => state.engine.total_messages(),
            Mode::Batch => state.buffer.len(),
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.state.read().unwrap().current_patterns.len()
    }

    pub fn stats(&self) -> Stats {
        let state = self.state.read().unwrap();
        let total_logs = match self.mode {
            Mode::Streaming => state.engine.total_messages(),
            Mode::Batch => state.buffer.len(),
        };
        Stats {
            mode: self.mode,
            total_logs,
            pattern_count: state.current_patterns.len(),
            patterns_stale: state.patterns_stale,
            engine: state.engine.stats(),
        }
    }
}

impl State {
    fn ingest_streaming(&mut self, line: &str) {
        self.engine.process_log_incremental(line);

        // Copying the pattern list on every admission would dominate ingest
        // cost, so the snapshot only follows the engine's refresh cadence
        // (plus the very first admission).
        let count = self.engine.total_messages();
        if self.current_patterns.is_empty() || count != self.last_pattern_update_count {
            if self.current_patterns.is_empty()
                || count % SNAPSHOT_REFRESH_INTERVAL == 0
                || count == 1
            {
                self.refresh_snapshot();
            }
        }
        self.patterns_stale = false;
    }

    fn refresh_snapshot(&mut self) {
        self.current_patterns = self.engine.patterns();
        self.last_pattern_update_count = self.engine.total_messages();
        self.patterns_stale = false;
    }

    fn needs_snapshot_refresh(&self) -> bool {
        let count = self.engine.total_messages();
        count > 0 && count != self.last_pattern_update_count
    }

    fn buffer_log(&mut self, line: String, cap: usize) {
        self.buffer.push_back(line);
        while self.buffer.len() > cap {
            self.buffer.pop_front();
        }
        self.patterns_stale = true;
    }
}

fn validate(line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }
    if line.len() > MAX_LOG_CHARS {
        // Byte length bounds char count; short lines skip the char walk.
        Some(line.chars().take(MAX_LOG_CHARS).collect())
    } else {
        Some(line.to_owned())
    }
}

/// Facade-level statistics, wrapping the engine's snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mode: Mode,
    pub total_logs: usize,
    pub pattern_count: usize,
    pub patterns_stale: bool,
    pub engine: EngineStats,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LogSift Statistics:")?;
        writeln!(f, "  Processing Mode: {:?}", self.mode)?;
        writeln!(f, "  Total Logs: {}", self.total_logs)?;
        writeln!(f, "  Patterns Extracted: {}", self.pattern_count)?;
        writeln!(f, "  Patterns Need Update: {}", self.patterns_stale)?;
        write!(f, "  {}", self.engine)
    }
}
