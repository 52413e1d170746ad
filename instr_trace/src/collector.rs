// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Stateless entry-points translated target code calls between `reset_log_buffer` and `commit`
//! to append to the owning CPU's current entry. Every function here is a safe no-op whenever
//! `TraceController::check_enabled` is false, which is what lets translated code call these
//! unconditionally without branching around them on the hot path.

use std::borrow::Cow;
use std::fmt;

use trace_types::decode_memop;
use trace_types::Capability;
use trace_types::EntryFlags;
use trace_types::Event;
use trace_types::MemoryFlags;
use trace_types::MemoryRecord;
use trace_types::MemoryValue;
use trace_types::RegisterRecord;
use trace_types::MAX_INSN_SIZE;
use trace_types::PADDR_UNTRANSLATED;

use crate::controller::TraceController;

/// The MMU collaborator `ld_int`/`st_int`/`ld_cap`/`st_cap` consult to fill in a memory record's
/// physical address. Address translation is out of scope for this crate; a failed translation is
/// never an error here, only a sentinel.
pub trait PaddrResolver: Send + Sync {
    fn translate(&self, vaddr: u64) -> Option<u64>;
}

/// A `PaddrResolver` that never resolves anything, for targets or tests with no MMU model.
#[derive(Default)]
pub struct NoPaddrResolver;

impl PaddrResolver for NoPaddrResolver {
    fn translate(&self, _vaddr: u64) -> Option<u64> {
        None
    }
}

fn resolve_paddr(resolver: &dyn PaddrResolver, vaddr: u64) -> u64 {
    resolver.translate(vaddr).unwrap_or(PADDR_UNTRANSLATED)
}

pub fn reg(c: &mut TraceController, name: impl Into<Cow<'static, str>>, value: u64) {
    if !c.check_enabled() {
        return;
    }
    c.current_entry_mut().registers.push(RegisterRecord::gpr(name, value));
}

pub fn cap(c: &mut TraceController, name: impl Into<Cow<'static, str>>, capability: Capability) {
    if !c.check_enabled() {
        return;
    }
    c.current_entry_mut().registers.push(RegisterRecord::cap(name, capability));
}

pub fn cap_int(c: &mut TraceController, name: impl Into<Cow<'static, str>>, value: u64) {
    if !c.check_enabled() {
        return;
    }
    c.current_entry_mut().registers.push(RegisterRecord::cap_int(name, value));
}

pub fn ld_int(c: &mut TraceController, resolver: &dyn PaddrResolver, addr: u64, memop: u32, value: u64) {
    if !c.check_enabled() {
        return;
    }
    let paddr = resolve_paddr(resolver, addr);
    c.current_entry_mut().memory.push(MemoryRecord {
        flags: MemoryFlags::empty(),
        op: decode_memop(memop),
        addr,
        paddr,
        value: MemoryValue::Integer(value),
    });
}

pub fn st_int(c: &mut TraceController, resolver: &dyn PaddrResolver, addr: u64, memop: u32, value: u64) {
    if !c.check_enabled() {
        return;
    }
    let paddr = resolve_paddr(resolver, addr);
    c.current_entry_mut().memory.push(MemoryRecord {
        flags: MemoryFlags::ST,
        op: decode_memop(memop),
        addr,
        paddr,
        value: MemoryValue::Integer(value),
    });
}

pub fn ld_cap(c: &mut TraceController, resolver: &dyn PaddrResolver, addr: u64, memop: u32, capability: Capability) {
    if !c.check_enabled() {
        return;
    }
    let paddr = resolve_paddr(resolver, addr);
    c.current_entry_mut().memory.push(MemoryRecord {
        flags: MemoryFlags::CAP,
        op: decode_memop(memop),
        addr,
        paddr,
        value: MemoryValue::Capability(capability),
    });
}

pub fn st_cap(c: &mut TraceController, resolver: &dyn PaddrResolver, addr: u64, memop: u32, capability: Capability) {
    if !c.check_enabled() {
        return;
    }
    let paddr = resolve_paddr(resolver, addr);
    c.current_entry_mut().memory.push(MemoryRecord {
        flags: MemoryFlags::ST | MemoryFlags::CAP,
        op: decode_memop(memop),
        addr,
        paddr,
        value: MemoryValue::Capability(capability),
    });
}

/// Records the instruction proper. `bytes.len() > MAX_INSN_SIZE` is a target bug, not a runtime
/// condition, so it asserts rather than truncating silently.
pub fn instr(c: &mut TraceController, pc: u64, bytes: &[u8], size: u8) {
    if !c.check_enabled() {
        return;
    }
    assert!(
        bytes.len() <= MAX_INSN_SIZE,
        "instruction encoding of {} bytes exceeds MAX_INSN_SIZE ({})",
        bytes.len(),
        MAX_INSN_SIZE
    );
    let entry = c.current_entry_mut();
    entry.pc = pc;
    entry.insn_bytes[..bytes.len()].copy_from_slice(bytes);
    entry.insn_size = size;
    entry.flags |= EntryFlags::HAS_INSTR_DATA;
}

pub fn asid(c: &mut TraceController, value: u32) {
    if !c.check_enabled() {
        return;
    }
    c.current_entry_mut().asid = value;
}

pub fn exception(c: &mut TraceController, code: u32, vector: u32, faultaddr: u64) {
    if !c.check_enabled() {
        return;
    }
    let entry = c.current_entry_mut();
    entry.flags |= EntryFlags::INTR_TRAP;
    entry.intr_code = code;
    entry.intr_vector = vector;
    entry.intr_faultaddr = faultaddr;
}

pub fn interrupt(c: &mut TraceController, code: u32, vector: u32) {
    if !c.check_enabled() {
        return;
    }
    let entry = c.current_entry_mut();
    entry.flags |= EntryFlags::INTR_ASYNC;
    entry.intr_code = code;
    entry.intr_vector = vector;
}

/// Appends an event record; ownership of any heap-allocated payload `evt` carries (e.g. a
/// `User` event's byte payload) transfers to the entry and is released on reset.
pub fn event(c: &mut TraceController, evt: Event) {
    if !c.check_enabled() {
        return;
    }
    c.current_entry_mut().events.push(evt);
}

/// Appends immediately-rendered text to the entry's text buffer. Unlike staged printf, this
/// formats on the spot; use it for cold paths where the cost of runtime formatting doesn't
/// matter.
pub fn extra(c: &mut TraceController, args: fmt::Arguments) {
    if !c.check_enabled() {
        return;
    }
    use std::fmt::Write;
    let _ = write!(c.current_entry_mut().extra_text, "{args}");
}
