// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Performance recording for graph and per-stage execution timing.
//!
//! The recorder accumulates samples in O(1) per [`PerfRecorder::record`]
//! call: most recent duration, timestamps of the first and most recent
//! sample in the current window, running minimum, maximum, sum, and count.
//! Snapshots are read-only and never reset anything; measurement is fully
//! decoupled from execution correctness.
//!
//! Scopes are graph-level plus one per stage. Both executors feed the same
//! recorder, so a pipelined session's statistics read exactly like a
//! single-shot run repeated N times.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::graph::StageId;

/// What a timing sample is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerfScope {
    /// One whole graph execution.
    Graph,
    /// One stage's transform within an execution.
    Stage(StageId),
}

impl PerfScope {
    /// Stage scope by position in the graph's insertion order.
    pub fn stage(index: usize) -> Self {
        PerfScope::Stage(StageId(index))
    }
}

impl std::fmt::Display for PerfScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerfScope::Graph => write!(f, "graph"),
            PerfScope::Stage(id) => write!(f, "{}", id),
        }
    }
}

/// Read-only view of one scope's accumulated statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSnapshot {
    /// Duration of the most recent execution.
    pub last: Duration,
    /// Wall-clock time of the first sample in the current window.
    pub first_ts: SystemTime,
    /// Wall-clock time of the most recent sample.
    pub last_ts: SystemTime,
    pub avg: Duration,
    pub min: Duration,
    pub max: Duration,
    pub sum: Duration,
    pub count: u64,
}

#[derive(Debug, Clone, Copy)]
struct PerfStats {
    last: Duration,
    first_ts: SystemTime,
    last_ts: SystemTime,
    min: Duration,
    max: Duration,
    sum: Duration,
    count: u64,
}

impl PerfStats {
    fn first(duration: Duration, now: SystemTime) -> Self {
        Self {
            last: duration,
            first_ts: now,
            last_ts: now,
            min: duration,
            max: duration,
            sum: duration,
            count: 1,
        }
    }

    fn update(&mut self, duration: Duration, now: SystemTime) {
        self.last = duration;
        self.last_ts = now;
        self.min = self.min.min(duration);
        self.max = self.max.max(duration);
        self.sum += duration;
        self.count += 1;
    }

    fn snapshot(&self) -> PerfSnapshot {
        PerfSnapshot {
            last: self.last,
            first_ts: self.first_ts,
            last_ts: self.last_ts,
            avg: self.sum / self.count.max(1) as u32,
            min: self.min,
            max: self.max,
            sum: self.sum,
            count: self.count,
        }
    }
}

/// Accumulates per-execution timing samples at graph and stage granularity.
#[derive(Debug, Default)]
pub struct PerfRecorder {
    scopes: Mutex<HashMap<PerfScope, PerfStats>>,
}

impl PerfRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one sample to the named scope.
    pub fn record(&self, scope: PerfScope, duration: Duration) {
        let now = SystemTime::now();
        let mut scopes = self.scopes.lock().expect("perf recorder poisoned");
        scopes
            .entry(scope)
            .and_modify(|s| s.update(duration, now))
            .or_insert_with(|| PerfStats::first(duration, now));
    }

    /// Read-only, non-resetting view. `None` before the first sample.
    pub fn snapshot(&self, scope: PerfScope) -> Option<PerfSnapshot> {
        let scopes = self.scopes.lock().expect("perf recorder poisoned");
        scopes.get(&scope).map(|s| s.snapshot())
    }

    /// Clears the scope's accumulated statistics. Buffers and queue state
    /// are unaffected.
    pub fn reset(&self, scope: PerfScope) {
        let mut scopes = self.scopes.lock().expect("perf recorder poisoned");
        scopes.remove(&scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_min_max_sum_count() {
        let perf = PerfRecorder::new();
        let scope = PerfScope::Graph;
        perf.record(scope, Duration::from_millis(10));
        perf.record(scope, Duration::from_millis(30));
        perf.record(scope, Duration::from_millis(20));

        let snap = perf.snapshot(scope).unwrap();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.min, Duration::from_millis(10));
        assert_eq!(snap.max, Duration::from_millis(30));
        assert_eq!(snap.sum, Duration::from_millis(60));
        assert_eq!(snap.avg, Duration::from_millis(20));
        assert_eq!(snap.last, Duration::from_millis(20));
        assert!(snap.first_ts <= snap.last_ts);
    }

    #[test]
    fn snapshot_does_not_reset() {
        let perf = PerfRecorder::new();
        perf.record(PerfScope::Graph, Duration::from_millis(5));
        let _ = perf.snapshot(PerfScope::Graph);
        assert_eq!(perf.snapshot(PerfScope::Graph).unwrap().count, 1);
    }

    #[test]
    fn reset_clears_one_scope_only() {
        let perf = PerfRecorder::new();
        let stage = PerfScope::Stage(crate::graph::StageId(0));
        perf.record(PerfScope::Graph, Duration::from_millis(5));
        perf.record(stage, Duration::from_millis(7));

        perf.reset(PerfScope::Graph);
        assert!(perf.snapshot(PerfScope::Graph).is_none());
        assert_eq!(perf.snapshot(stage).unwrap().count, 1);
    }
}
