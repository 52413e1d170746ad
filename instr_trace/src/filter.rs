// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use trace_types::Entry;

/// The `-dfilter ADDR[,ADDR...]` address-range collaborator. The core never parses or stores
/// ranges itself; it only asks whether a given address falls inside whatever was configured.
pub trait DebugRegions: Send + Sync {
    fn contains(&self, addr: u64) -> bool;
    fn is_empty(&self) -> bool;
}

/// A `DebugRegions` that never restricts anything, used when no `-dfilter` was configured.
#[derive(Default)]
pub struct NoDebugRegions;

impl DebugRegions for NoDebugRegions {
    fn contains(&self, _addr: u64) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        true
    }
}

/// One of the standard filter predicates. Referenced by this small closed enum rather than by
/// function pointer so that the per-CPU filter list can dedupe and compare filters by value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Matches if `debug_regions` contains the entry's PC or any memory record's address. An
    /// empty region set always matches.
    MemRegions,
    /// Matches iff the entry carries at least one event record.
    Events,
}

impl FilterKind {
    fn evaluate(self, entry: &Entry, regions: &dyn DebugRegions) -> bool {
        match self {
            FilterKind::MemRegions => {
                regions.is_empty()
                    || regions.contains(entry.pc)
                    || entry.memory.iter().any(|m| regions.contains(m.addr))
            }
            FilterKind::Events => entry.has_events(),
        }
    }

    fn cli_name(self) -> &'static str {
        match self {
            FilterKind::MemRegions => "mem_regions",
            FilterKind::Events => "events",
        }
    }

    fn from_cli_name(name: &str) -> Option<Self> {
        match name {
            "events" => Some(FilterKind::Events),
            "mem_regions" => Some(FilterKind::MemRegions),
            _ => None,
        }
    }
}

/// The ordered, deduped list of filters attached to one CPU. `commit` evaluates these in order;
/// the first `false` discards the entry and no later filter runs.
#[derive(Default, Clone)]
pub struct FilterList {
    kinds: Vec<FilterKind>,
}

impl FilterList {
    pub fn from_defaults(defaults: &[FilterKind]) -> Self {
        let mut list = FilterList::default();
        for kind in defaults {
            list.add(*kind);
        }
        list
    }

    /// Appends `kind` unless it's already present.
    pub fn add(&mut self, kind: FilterKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Removes `kind` if present, preserving the relative order of what remains.
    pub fn remove(&mut self, kind: FilterKind) {
        self.kinds.retain(|&k| k != kind);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterKind> {
        self.kinds.iter()
    }

    /// Evaluates filters in order; an entry survives iff every filter passes.
    pub fn passes(&self, entry: &Entry, regions: &dyn DebugRegions) -> bool {
        for kind in &self.kinds {
            if !kind.evaluate(entry, regions) {
                return false;
            }
        }
        true
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown trace filter name(s): {0}")]
pub struct UnknownFilterNames(pub String);

/// Parses a comma-separated list of filter names (as accepted on the command line) and appends
/// the recognized ones to `filters`. Earlier successful additions are kept even if a later name
/// in the list is unrecognized; all unknown names are reported together once the whole list has
/// been processed.
pub fn set_cli_filters(filters: &mut Vec<FilterKind>, spec: &str) -> Result<(), UnknownFilterNames> {
    let mut unknown = Vec::new();
    for name in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match FilterKind::from_cli_name(name) {
            Some(kind) => {
                if !filters.contains(&kind) {
                    filters.push(kind);
                }
            }
            None => unknown.push(name.to_string()),
        }
    }
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(UnknownFilterNames(unknown.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_types::Event;

    #[test]
    fn empty_debug_regions_always_matches() {
        let mut entry = trace_types::Entry::new();
        entry.pc = 0x4000;
        assert!(FilterKind::MemRegions.evaluate(&entry, &NoDebugRegions));
    }

    #[test]
    fn events_filter_requires_an_event() {
        let mut entry = trace_types::Entry::new();
        assert!(!FilterKind::Events.evaluate(&entry, &NoDebugRegions));
        entry.events.push(Event::start(0));
        assert!(FilterKind::Events.evaluate(&entry, &NoDebugRegions));
    }

    #[test]
    fn list_dedupes_and_preserves_order_on_remove() {
        let mut list = FilterList::default();
        list.add(FilterKind::Events);
        list.add(FilterKind::MemRegions);
        list.add(FilterKind::Events); // duplicate, ignored
        assert_eq!(list.iter().count(), 2);

        list.remove(FilterKind::Events);
        let remaining: Vec<_> = list.iter().copied().collect();
        assert_eq!(remaining, vec![FilterKind::MemRegions]);
    }

    #[test]
    fn cli_filters_keep_earlier_successes_on_unknown_name() {
        let mut filters = Vec::new();
        let err = set_cli_filters(&mut filters, "events,bogus").unwrap_err();
        assert_eq!(filters, vec![FilterKind::Events]);
        assert_eq!(err.0, "bogus");
    }
}
