//! Per-session bookkeeping for document analyses.
//!
//! An [`AnalysisSession`] is created when a session starts and cleared when it
//! ends. It records which items are currently being analysed and how long
//! finished analyses took, so a host can show "in progress" badges and time
//! estimates without process-wide globals.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::CoreError;

/// Aggregate duration of completed analyses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationStats {
    pub count: u32,
    pub total: Duration,
}

impl DurationStats {
    pub fn average(&self) -> Option<Duration> {
        (self.count > 0).then(|| self.total / self.count)
    }

    fn record(&mut self, elapsed: Duration) {
        self.count = self.count.saturating_add(1);
        self.total = self.total.saturating_add(elapsed);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    in_progress: DashMap<String, Instant>,
    stats: Mutex<DurationStats>,
}

/// Shared, cloneable handle to one session's analysis state.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    state: Arc<SessionState>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `item_id` as being analysed.
    ///
    /// Fails if an analysis for the same item is already running. The entry
    /// is removed and its duration recorded when the returned guard is
    /// finished or dropped.
    pub fn begin(&self, item_id: &str) -> Result<AnalysisGuard, CoreError> {
        use dashmap::mapref::entry::Entry;

        match self.state.in_progress.entry(item_id.to_string()) {
            Entry::Occupied(_) => Err(CoreError::AnalysisInProgress(item_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                tracing::debug!(item_id, "analysis started");
                Ok(AnalysisGuard {
                    session: self.clone(),
                    item_id: item_id.to_string(),
                    done: false,
                })
            }
        }
    }

    pub fn is_in_progress(&self, item_id: &str) -> bool {
        self.state.in_progress.contains_key(item_id)
    }

    pub fn in_progress_count(&self) -> usize {
        self.state.in_progress.len()
    }

    pub fn stats(&self) -> DurationStats {
        self.state
            .stats
            .lock()
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Estimated duration of the next analysis, from completed ones.
    pub fn estimate(&self) -> Option<Duration> {
        self.stats().average()
    }

    /// End the session: forget in-progress entries and statistics.
    pub fn clear(&self) {
        self.state.in_progress.clear();
        if let Ok(mut stats) = self.state.stats.lock() {
            *stats = DurationStats::default();
        }
    }

    fn complete(&self, item_id: &str) -> Option<Duration> {
        let (_, started) = self.state.in_progress.remove(item_id)?;
        let elapsed = started.elapsed();
        if let Ok(mut stats) = self.state.stats.lock() {
            stats.record(elapsed);
        }
        tracing::debug!(item_id, elapsed_ms = elapsed.as_millis() as u64, "analysis finished");
        Some(elapsed)
    }
}

/// Marks one running analysis; completes it on [`finish`](Self::finish) or drop.
#[derive(Debug)]
pub struct AnalysisGuard {
    session: AnalysisSession,
    item_id: String,
    done: bool,
}

impl AnalysisGuard {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Complete the analysis and return how long it took.
    ///
    /// Returns `None` if the session was cleared while the analysis ran.
    pub fn finish(mut self) -> Option<Duration> {
        self.done = true;
        self.session.complete(&self.item_id)
    }
}

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        if !self.done {
            self.session.complete(&self.item_id);
        }
    }
}
