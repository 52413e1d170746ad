// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Process-wide configuration: the selected backend kind, the reset-filter list applied to every
//! newly created CPU, and the debug-stats toggle. Modeled as an explicit service object rather
//! than scattered statics, per the "inject services at CPU creation" design used throughout this
//! crate — `TraceConfig` is what gets read once at CPU creation, not queried from every collector
//! call.

use anyhow::Context;
use sync::Mutex;
use trace_types::BackendKind;

use crate::filter::FilterKind;

/// Process-wide trace configuration, built once at startup (typically from CLI parsing, which is
/// out of scope for this crate) and read whenever a new CPU is created.
pub struct TraceConfig {
    backend_kind: BackendKind,
    reset_filters: Mutex<Vec<FilterKind>>,
    debug_stats: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            backend_kind: BackendKind::Text,
            reset_filters: Mutex::new(Vec::new()),
            debug_stats: false,
        }
    }
}

impl TraceConfig {
    pub fn new(backend_kind: BackendKind, debug_stats: bool) -> Self {
        TraceConfig {
            backend_kind,
            reset_filters: Mutex::new(Vec::new()),
            debug_stats,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub fn debug_stats(&self) -> bool {
        self.debug_stats
    }

    /// Appends a filter to the reset list, applied to every CPU created from this point on.
    /// CPUs already created are unaffected, matching `set_cli_filters`' startup-only contract.
    pub fn add_reset_filter(&self, kind: FilterKind) {
        let mut filters = self.reset_filters.lock();
        if !filters.contains(&kind) {
            filters.push(kind);
        }
    }

    pub fn reset_filters(&self) -> Vec<FilterKind> {
        self.reset_filters.lock().clone()
    }

    /// CLI glue: parses a `set_cli_filters`-style comma list and folds the recognized names into
    /// the reset-filter list, surfacing an unknown name through the error channel instead of the
    /// domain-level `thiserror` type `set_cli_filters` itself returns.
    pub fn apply_cli_filters(&self, spec: &str) -> anyhow::Result<()> {
        let mut parsed = self.reset_filters();
        crate::filter::set_cli_filters(&mut parsed, spec).context("invalid -trace-filter argument")?;
        for kind in parsed {
            self.add_reset_filter(kind);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_text_and_stats_off() {
        let config = TraceConfig::default();
        assert_eq!(config.backend_kind(), BackendKind::Text);
        assert!(!config.debug_stats());
        assert!(config.reset_filters().is_empty());
    }

    #[test]
    fn reset_filters_dedupe() {
        let config = TraceConfig::default();
        config.add_reset_filter(FilterKind::Events);
        config.add_reset_filter(FilterKind::Events);
        assert_eq!(config.reset_filters(), vec![FilterKind::Events]);
    }

    #[test]
    fn cli_filters_reject_unknown_name_via_error_channel() {
        let config = TraceConfig::default();
        assert!(config.apply_cli_filters("events,bogus").is_err());
        assert_eq!(config.reset_filters(), vec![FilterKind::Events]);
    }
}
