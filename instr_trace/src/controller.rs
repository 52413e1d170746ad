// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The per-CPU trace state machine: enable/disable, user-mode-only filtering, the commit/drop
//! discipline, and buffered-mode flush. Every other module in this crate (collector, printf,
//! ring, filter) exists to be driven by this one.

use std::sync::Arc;

use log::warn;
use trace_types::Backend;
use trace_types::CpuMode;
use trace_types::Entry;
use trace_types::EntryFlags;
use trace_types::Event;
use trace_types::RegisterRecord;

use crate::filter::DebugRegions;
use crate::filter::FilterKind;
use crate::filter::FilterList;
use crate::filter::NoDebugRegions;
use crate::global;
use crate::printf::PrintfStage;
use crate::ring::RingBuffer;
use crate::stats::Stats;

/// Smallest ring size `set_buffer_size` will accept. Below this, per-instruction tracing would
/// thrash the ring on anything but the shortest runs.
pub const MIN_ENTRY_BUFFER_SIZE: usize = 65_536;

/// The three-way instruction-log verbosity a CPU can be configured to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    None,
    User,
    All,
}

/// Per-CPU trace state. Owned exclusively by the CPU's worker thread; every method here runs
/// either on that thread (collector-driven calls) or in CPU-exclusive context (loglevel
/// switches), never concurrently with itself.
pub struct TraceController {
    cpu_id: usize,
    ring: RingBuffer,
    buffered: bool,
    loglevel: LogLevel,
    loglevel_active: bool,
    starting: bool,
    force_drop: bool,
    filters: FilterList,
    debug_regions: Arc<dyn DebugRegions>,
    backend: Arc<dyn Backend>,
    stats: Stats,
    printf: PrintfStage,
}

impl TraceController {
    /// Allocates the ring at `ring_size`, attaches `default_filters`, and — if instruction
    /// logging was already requested globally at the time this CPU came up — applies the
    /// matching loglevel switch immediately (as if `global_switch` had just run for this CPU
    /// alone). `current_mode` is this CPU's privilege mode at creation time, needed only to
    /// resolve a `USER` switch with no preceding `MODE_SWITCH` entry. `backend` and
    /// `debug_regions` are injected rather than looked up from process-wide state, so that
    /// swapping either for a test double never requires touching global singletons.
    pub fn init(
        cpu_id: usize,
        ring_size: usize,
        default_filters: &[FilterKind],
        debug_regions: Arc<dyn DebugRegions>,
        backend: Arc<dyn Backend>,
        initial_level: LogLevel,
        current_mode: CpuMode,
    ) -> Self {
        let mut controller = TraceController {
            cpu_id,
            ring: RingBuffer::new(ring_size),
            buffered: false,
            loglevel: LogLevel::None,
            loglevel_active: false,
            starting: false,
            force_drop: false,
            filters: FilterList::from_defaults(default_filters),
            debug_regions,
            backend,
            stats: Stats::default(),
            printf: PrintfStage::new(),
        };
        if initial_level != LogLevel::None {
            controller.apply_loglevel_switch(initial_level, 0, current_mode);
        }
        controller
    }

    pub fn cpu_id(&self) -> usize {
        self.cpu_id
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn printf_mut(&mut self) -> &mut PrintfStage {
        &mut self.printf
    }

    pub fn filters_mut(&mut self) -> &mut FilterList {
        &mut self.filters
    }

    pub fn current_entry_mut(&mut self) -> &mut Entry {
        self.ring.current_mut()
    }

    /// True iff the ring has no committed-but-undrained entries: always true in streaming mode,
    /// and the state buffered mode returns to after a `flush`.
    pub fn ring_is_quiescent(&self) -> bool {
        self.ring.head() == self.ring.tail()
    }

    /// Renders whatever is staged in the printf area and appends it to the current entry's text
    /// buffer, the way the runtime render helper is wired into the entry accumulator in practice.
    ///
    /// If this CPU isn't logging, per §4.6 nothing is rendered: the staged entries are simply
    /// discarded by clearing their valid bits.
    pub fn render_staged_printf(&mut self) {
        if !self.check_enabled() {
            self.printf.clear_all_valid();
            return;
        }
        crate::printf::printf_dump(&mut self.printf, &mut self.ring.current_mut().extra_text);
    }

    pub fn set_buffered(&mut self, buffered: bool) {
        self.buffered = buffered;
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Rejects undersized requests with a warning, otherwise reinitializes every slot and resets
    /// both ring indices. Fanning this out to every CPU is the caller's job (see `global`).
    pub fn set_buffer_size(&mut self, size: usize) {
        if size < MIN_ENTRY_BUFFER_SIZE {
            warn!(
                "instr_trace: cpu {}: requested buffer size {} below minimum {}, ignoring",
                self.cpu_id, size, MIN_ENTRY_BUFFER_SIZE
            );
            return;
        }
        self.ring.resize(size);
    }

    /// `global-bit && per-cpu.loglevel_active`.
    pub fn check_enabled(&self) -> bool {
        global::instr_log_enabled() && self.loglevel_active
    }

    /// Marks the current entry as crossing into `new_mode`. If this CPU is filtering by `USER`
    /// and the switch changes whether `USER` tracing should be active, applies the loglevel
    /// switch immediately. The caller guarantees the current translation block ends right after
    /// this call.
    pub fn mode_switch(&mut self, new_mode: CpuMode, pc: u64) {
        self.ring.current_mut().flags |= EntryFlags::MODE_SWITCH;
        self.ring.current_mut().next_cpu_mode = Some(new_mode);

        if self.loglevel == LogLevel::User {
            let next_active = new_mode.is_user();
            if next_active != self.loglevel_active {
                self.apply_loglevel_switch(LogLevel::User, pc, new_mode);
            }
        }
    }

    /// The loglevel-switch state machine (see module docs): computes whether the new level is
    /// active, closes out the previous slice if one was open (discarding it outright if it never
    /// got past the deferred `starting` phase), and opens a new one if the new level is active.
    /// A switch that changes neither level nor activity is a no-op (P6).
    pub fn apply_loglevel_switch(&mut self, next_level: LogLevel, pc: u64, current_mode: CpuMode) {
        let next_active = match next_level {
            LogLevel::None => false,
            LogLevel::All => true,
            LogLevel::User => {
                if self.ring.current().flags.contains(EntryFlags::MODE_SWITCH) {
                    self.ring.current().next_cpu_mode == Some(CpuMode::User)
                } else {
                    current_mode.is_user()
                }
            }
        };

        if next_level == self.loglevel && next_active == self.loglevel_active {
            return;
        }

        let prev_active = self.loglevel_active;
        if prev_active {
            if self.starting {
                self.ring.current_mut().reset();
                self.starting = false;
            } else {
                self.ring.current_mut().events.push(Event::stop(pc));
                self.stats.trace_stop += 1;
                self.commit();
            }
        }

        self.loglevel = next_level;
        self.loglevel_active = next_active;

        if next_active {
            self.starting = true;
            self.ring.current_mut().events.push(Event::start(pc));
            self.ring.current_mut().events.push(Event::RegDump { gpr: Vec::new() });
            self.stats.trace_start += 1;
        }
    }

    /// Appends a register dump to the most recently opened `STATE{Start}` slice's `REGDUMP`
    /// event. The target collaborator calls this (via `event_create_regdump` +
    /// `event_dump_reg*` in the source system) once per register, right after the switch that
    /// set `starting`.
    pub fn dump_start_register(&mut self, reg: RegisterRecord) {
        if let Some(Event::RegDump { gpr }) = self
            .ring
            .current_mut()
            .events
            .iter_mut()
            .rev()
            .find(|e| matches!(e, Event::RegDump { .. }))
        {
            gpr.push(reg);
        }
    }

    /// Marks the current entry to be discarded instead of emitted at the next `commit`.
    pub fn drop_current(&mut self) {
        self.force_drop = true;
    }

    /// Applies filters and either hands the entry to the backend (streaming) or advances the
    /// ring (buffered), then resets whatever slot is now current. `force_drop` and a failing
    /// filter both discard the entry without looking at the other.
    pub fn commit(&mut self) {
        if self.force_drop {
            self.force_drop = false;
            self.ring.current_mut().reset();
            return;
        }
        if !self.filters.passes(self.ring.current(), self.debug_regions.as_ref()) {
            self.ring.current_mut().reset();
            return;
        }

        self.starting = false;
        if self.buffered {
            self.ring.advance_head();
        } else {
            self.backend.emit_instr(self.cpu_id, self.ring.current());
            self.stats.entries_emitted += 1;
            self.ring.current_mut().reset();
        }
    }

    /// Appends a `STATE{Flush}` event to the current entry, then empties the ring: in streaming
    /// mode that's just one more commit; in buffered mode every already-committed slot from
    /// `tail` to `head` drains through the backend and the flush-carrying entry itself drains
    /// right along with them, as the final one. Filters still gate the flush-carrying entry
    /// unless logging is disabled, in which case it force-commits — an explicit flush must always
    /// take effect.
    pub fn flush(&mut self, pc: u64) {
        self.ring.current_mut().events.push(Event::flush(pc));
        let keep = !self.loglevel_active
            || self.filters.passes(self.ring.current(), self.debug_regions.as_ref());

        if !self.buffered {
            if keep {
                self.backend.emit_instr(self.cpu_id, self.ring.current());
                self.stats.entries_emitted += 1;
            }
            self.ring.current_mut().reset();
            return;
        }

        let cpu_id = self.cpu_id;
        let backend = &self.backend;
        let mut drained = 0u64;
        if keep {
            self.ring.flush_all(|entry| {
                backend.emit_instr(cpu_id, entry);
                drained += 1;
            });
        } else {
            self.ring.current_mut().reset();
            self.ring.drain_to_head(|entry| {
                backend.emit_instr(cpu_id, entry);
                drained += 1;
            });
        }
        self.stats.entries_emitted += drained;
    }
}

impl Default for NoDebugRegionsHandle {
    fn default() -> Self {
        NoDebugRegionsHandle(Arc::new(NoDebugRegions))
    }
}

/// Convenience wrapper so callers that don't care about `-dfilter` can write
/// `NoDebugRegionsHandle::default().0` without spelling out the `Arc<dyn DebugRegions>` coercion.
pub struct NoDebugRegionsHandle(pub Arc<dyn DebugRegions>);
