// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! End-to-end scenarios exercising the trace controller, collector API, global switch and staged
//! printf together, the way a single CPU's worker thread would drive them.

use std::sync::Arc;

use instr_trace::collector;
use instr_trace::controller::LogLevel;
use instr_trace::controller::TraceController;
use instr_trace::filter::NoDebugRegions;
use instr_trace::global::global_switch;
use instr_trace::global::ImmediateScheduler;
use instr_trace::global::MonitorFlags;
use instr_trace::printf::RuntimeArg;
use sync::Mutex;
use trace_types::Backend;
use trace_types::CpuMode;
use trace_types::Entry;
use trace_types::Event;
use trace_types::TraceState;

/// A backend that records a short description of every committed entry, so scenarios can assert
/// on emission order and the events each entry carried without depending on a concrete wire
/// format.
#[derive(Default)]
struct RecordingBackend {
    entries: Mutex<Vec<(u64, Vec<String>)>>,
}

impl RecordingBackend {
    fn snapshot(&self) -> Vec<(u64, Vec<String>)> {
        self.entries.lock().clone()
    }
}

impl Backend for RecordingBackend {
    fn emit_instr(&self, _cpu_id: usize, entry: &Entry) {
        let events = entry
            .events
            .iter()
            .map(|e| match e {
                Event::State { next_state, pc } => format!("{next_state:?}@{pc:#x}"),
                Event::RegDump { gpr } => format!("REGDUMP({})", gpr.len()),
                Event::User { id, .. } => format!("USER({id})"),
            })
            .collect();
        self.entries.lock().push((entry.pc, events));
    }
}

// `global_switch` flips a single process-wide bit; serialize the scenarios that drive it so they
// don't see each other's writes when the test binary runs them concurrently.
static GLOBAL_SWITCH_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn controller_with(
    backend: Arc<RecordingBackend>,
    ring_size: usize,
    initial_level: LogLevel,
) -> TraceController {
    TraceController::init(
        0,
        ring_size,
        &[],
        Arc::new(NoDebugRegions),
        backend,
        initial_level,
        CpuMode::Kernel,
    )
}

#[test]
fn s1_start_emit_stop_streaming() {
    let _guard = GLOBAL_SWITCH_LOCK.lock();
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend.clone(), 64, LogLevel::None);
    let scheduler = ImmediateScheduler { cpu_ids: vec![0] };

    global_switch(&scheduler, MonitorFlags::INSTR, 0x1000, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });

    collector::instr(&mut c, 0x1000, &[0x90], 1);
    collector::reg(&mut c, "rax", 0x42);
    c.commit();

    collector::instr(&mut c, 0x1001, &[0x90], 1);
    c.commit();

    global_switch(&scheduler, MonitorFlags::empty(), 0x1010, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });

    let recorded = backend.snapshot();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0].0, 0x1000);
    assert!(recorded[0].1.iter().any(|e| e.starts_with("Start@")));
    assert!(recorded[0].1.iter().any(|e| e.starts_with("REGDUMP")));
    assert_eq!(recorded[1].0, 0x1001);
    assert!(recorded[2].1.iter().any(|e| e == &format!("{:?}@{:#x}", TraceState::Stop, 0x1010u64)));
    assert_eq!(c.stats().trace_start, 1);
    assert_eq!(c.stats().trace_stop, 1);
}

#[test]
fn s2_user_only_filtering_activates_on_mode_switch() {
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend.clone(), 64, LogLevel::User);

    c.mode_switch(CpuMode::User, 0x2000);
    collector::instr(&mut c, 0x2000, &[0x90], 1);
    c.commit();

    let recorded = backend.snapshot();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].1.iter().any(|e| e == "Start@0x2000"));
}

#[test]
fn s3_degenerate_slice_drops_dangling_start() {
    let _guard = GLOBAL_SWITCH_LOCK.lock();
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend.clone(), 64, LogLevel::None);
    let scheduler = ImmediateScheduler { cpu_ids: vec![0] };

    global_switch(&scheduler, MonitorFlags::INSTR, 0, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });
    global_switch(&scheduler, MonitorFlags::empty(), 0, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });

    assert!(backend.snapshot().is_empty());
    assert_eq!(c.stats().trace_start, 1);
    assert_eq!(c.stats().trace_stop, 0);
}

#[test]
fn s4_buffered_flush_drains_in_commit_order() {
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend.clone(), 64, LogLevel::All);
    c.set_buffered(true);

    for pc in 0..5u64 {
        c.current_entry_mut().pc = pc;
        c.commit();
    }
    c.flush(0xffff);

    let recorded = backend.snapshot();
    assert_eq!(recorded.len(), 6);
    for (i, (pc, _)) in recorded.iter().take(5).enumerate() {
        assert_eq!(*pc, i as u64);
    }
    assert!(recorded[5].1.iter().any(|e| e.starts_with("Flush@")));
    assert!(c.ring_is_quiescent());
}

#[test]
fn s5_ring_overflow_drops_oldest() {
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend.clone(), 4, LogLevel::All);
    c.set_buffered(true);

    for pc in 0..6u64 {
        c.current_entry_mut().pc = pc;
        c.commit();
    }
    // Ring capacity is 4: of the 6 committed, the first 2 (pc 0 and 1) are already gone before
    // flush ever runs.
    c.flush(0xffff);

    let recorded = backend.snapshot();
    assert_eq!(recorded.len(), 5);
    assert_eq!(recorded[0].0, 2);
    assert_eq!(recorded[3].0, 5);
    assert!(recorded.last().unwrap().1.iter().any(|e| e.starts_with("Flush@")));
}

#[test]
fn s6_staged_printf_renders_in_bit_order() {
    let _guard = GLOBAL_SWITCH_LOCK.lock();
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend, 64, LogLevel::None);
    let scheduler = ImmediateScheduler { cpu_ids: vec![0] };
    global_switch(&scheduler, MonitorFlags::INSTR, 0, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });

    c.printf_mut().gen_printf(
        "a=%d b=%c c=0x%lx",
        "wcd",
        &[
            RuntimeArg::Reg32(7),
            RuntimeArg::ConstInt('Q' as i64),
            RuntimeArg::Reg64(0xABCD),
        ],
    );
    c.render_staged_printf();

    assert!(c.current_entry_mut().extra_text.ends_with("a=7 b=Q c=0xabcd"));
    assert_eq!(c.printf_mut().valid_entries(), 0);

    global_switch(&scheduler, MonitorFlags::empty(), 0, |_cpu, level, pc| {
        c.apply_loglevel_switch(level, pc, CpuMode::Kernel);
    });
}

#[test]
fn s6b_staged_printf_discarded_when_logging_disabled() {
    let backend = Arc::new(RecordingBackend::default());
    let mut c = controller_with(backend, 64, LogLevel::None);

    c.printf_mut().gen_printf("a=%d", "w", &[RuntimeArg::Reg32(7)]);
    c.render_staged_printf();

    assert!(c.current_entry_mut().extra_text.is_empty());
    assert_eq!(c.printf_mut().valid_entries(), 0);
}
