// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-CPU counters surfaced when debug-stats logging is enabled.

/// Running totals for one CPU's trace controller. Cheap to copy; `TraceController::stats()`
/// hands out a snapshot rather than a reference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub entries_emitted: u64,
    pub trace_start: u64,
    pub trace_stop: u64,
}

impl Stats {
    /// Logs the counters at debug level; a start/stop mismatch is logged as a warning but is not
    /// treated as an error; it's an observation about the trace, not a core invariant violation.
    pub fn dump(&self, cpu_id: usize) {
        log::debug!(
            "instr_trace: cpu {cpu_id}: entries_emitted={} trace_start={} trace_stop={}",
            self.entries_emitted,
            self.trace_start,
            self.trace_stop
        );
        if self.trace_start != self.trace_stop {
            log::warn!(
                "instr_trace: cpu {cpu_id}: unbalanced trace slices (start={}, stop={})",
                self.trace_start,
                self.trace_stop
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zeroed() {
        let stats = Stats::default();
        assert_eq!(stats.entries_emitted, 0);
        assert_eq!(stats.trace_start, 0);
        assert_eq!(stats.trace_stop, 0);
    }
}
