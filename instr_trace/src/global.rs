// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The monitor-facing global switch and the cross-CPU fan-out it requires. The actual CPU
//! worker threads, their translation-block boundaries, and the exclusive-context primitive that
//! quiesces them are the named external collaborator this module only declares an interface for
//! (`CpuScheduler`); everything else here — flag normalization, the global instruction-log bit,
//! `sync_buffers` — belongs to the core.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use bitflags::bitflags;

use crate::backend;
use crate::controller::LogLevel;

bitflags! {
    /// Monitor-facing instruction-log request bits. `INSTR_U` implies `INSTR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MonitorFlags: u32 {
        const INSTR   = 0b01;
        const INSTR_U = 0b10;
    }
}

static INSTR_LOG_ENABLED: AtomicBool = AtomicBool::new(false);

/// The process-wide "is any instruction logging active" bit that `check_enabled` reads
/// alongside a CPU's own `loglevel_active`. Set only by `global_switch`, under the assumption
/// (per the concurrency model) that the monitor path always runs in exclusive context.
pub fn instr_log_enabled() -> bool {
    INSTR_LOG_ENABLED.load(Ordering::Acquire)
}

fn set_instr_log_enabled(enabled: bool) {
    INSTR_LOG_ENABLED.store(enabled, Ordering::Release);
}

/// Fans a quiesce-and-apply callback out to every live CPU. `run_on_cpu` is synchronous and
/// blocking; `async_safe_run_on_all` is the exclusive-context variant `global_switch` and
/// `set_buffer_size` fan-out both use. Implementations outside tests back this with real CPU
/// worker threads; nothing in this crate depends on how.
pub trait CpuScheduler {
    fn async_safe_run_on_all(&self, f: &mut dyn FnMut(usize));
}

/// A `CpuScheduler` that simply invokes the callback in-line for a fixed set of CPU ids, for use
/// where there's no real multi-threaded VM to quiesce.
pub struct ImmediateScheduler {
    pub cpu_ids: Vec<usize>,
}

impl CpuScheduler for ImmediateScheduler {
    fn async_safe_run_on_all(&self, f: &mut dyn FnMut(usize)) {
        for &id in &self.cpu_ids {
            f(id);
        }
    }
}

fn normalize(flags: MonitorFlags) -> MonitorFlags {
    if flags.contains(MonitorFlags::INSTR_U) {
        flags | MonitorFlags::INSTR
    } else {
        flags
    }
}

fn level_from_flags(flags: MonitorFlags) -> LogLevel {
    if flags.contains(MonitorFlags::INSTR_U) {
        LogLevel::User
    } else if flags.contains(MonitorFlags::INSTR) {
        LogLevel::All
    } else {
        LogLevel::None
    }
}

/// The monitor-facing `global_switch`. Normalizes `flags`, sets the global instruction-log bit
/// before scheduling anything (so that by the time any CPU applies its switch, `check_enabled`
/// would already see the bit if it were checked mid-flight), then asks `scheduler` to apply
/// `on_cpu` to every CPU in exclusive context. Returns the normalized flag word.
pub fn global_switch(
    scheduler: &dyn CpuScheduler,
    flags: MonitorFlags,
    pc: u64,
    mut on_cpu: impl FnMut(usize, LogLevel, u64),
) -> MonitorFlags {
    let normalized = normalize(flags);
    let next_level = level_from_flags(normalized);
    set_instr_log_enabled(next_level != LogLevel::None);
    scheduler.async_safe_run_on_all(&mut |cpu_id| on_cpu(cpu_id, next_level, pc));
    normalized
}

/// Walks every CPU and invokes the active backend's `sync` hook in each CPU's own context,
/// blocking until all have completed.
pub fn sync_buffers(cpu_ids: &[usize]) {
    let active = backend::active();
    for &cpu_id in cpu_ids {
        active.sync(cpu_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `instr_log_enabled` is a single process-wide bit; serialize the tests that flip it so they
    // don't observe each other's writes when run on separate threads.
    static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn instr_u_implies_instr_and_maps_to_user_level() {
        let _guard = TEST_LOCK.lock();
        let scheduler = ImmediateScheduler { cpu_ids: vec![0, 1] };
        let mut seen = Vec::new();
        let normalized = global_switch(&scheduler, MonitorFlags::INSTR_U, 0, |cpu, level, _pc| {
            seen.push((cpu, level));
        });
        assert!(normalized.contains(MonitorFlags::INSTR));
        assert!(normalized.contains(MonitorFlags::INSTR_U));
        assert_eq!(seen, vec![(0, LogLevel::User), (1, LogLevel::User)]);
        assert!(instr_log_enabled());
    }

    #[test]
    fn no_bits_maps_to_none_and_clears_global_bit() {
        let _guard = TEST_LOCK.lock();
        let scheduler = ImmediateScheduler { cpu_ids: vec![0] };
        global_switch(&scheduler, MonitorFlags::empty(), 0, |_, _, _| {});
        assert!(!instr_log_enabled());
    }
}
