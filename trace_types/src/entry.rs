// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use bitflags::bitflags;

use crate::Event;
use crate::MemoryRecord;
use crate::RegisterRecord;

/// Upper bound on the number of raw instruction bytes an `Entry` can carry. Targets with wider
/// instructions (e.g. long x86 encodings with many prefixes) still fit; anything that doesn't
/// is a target bug, not a core one.
pub const MAX_INSN_SIZE: usize = 16;

/// Sentinel physical address stored when translation fails or was never attempted.
pub const PADDR_UNTRANSLATED: u64 = u64::MAX;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct EntryFlags: u8 {
        const HAS_INSTR_DATA = 0b0001;
        const MODE_SWITCH    = 0b0010;
        const INTR_TRAP      = 0b0100;
        const INTR_ASYNC     = 0b1000;
    }
}

/// A coarse CPU privilege mode. Targets with richer mode spaces (hypervisor, debug, secure
/// monitor, ...) still reduce to one of these for the purposes of user-only filtering; the
/// raw target mode code, if needed, belongs in `extra_text` or a `User` event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CpuMode {
    User,
    Kernel,
    Hypervisor,
    Debug,
}

impl CpuMode {
    pub fn is_user(self) -> bool {
        matches!(self, CpuMode::User)
    }
}

/// The mutable accumulator for one in-flight instruction.
///
/// Collector calls append to the sequences below in the order they're made; `commit` and
/// `flush` are the only operations that read `Entry` as a whole, and `reset` is the only one
/// that mutates it back to empty. The three sequences, the text buffer, and every `Vec` inside
/// an `Event` are heap-owned and freed by ordinary `Drop`, which is what gives `reset` (and by
/// extension ring-buffer overwrite) its "no leak, no double free" property for free.
#[derive(Debug, Default)]
pub struct Entry {
    pub pc: u64,
    pub paddr: u64,
    pub insn_bytes: [u8; MAX_INSN_SIZE],
    pub insn_size: u8,
    pub flags: EntryFlags,
    pub next_cpu_mode: Option<CpuMode>,
    pub intr_code: u32,
    pub intr_vector: u32,
    pub intr_faultaddr: u64,
    pub asid: u32,
    pub registers: Vec<RegisterRecord>,
    pub memory: Vec<MemoryRecord>,
    pub events: Vec<Event>,
    pub extra_text: String,
}

impl Entry {
    pub fn new() -> Self {
        Entry {
            paddr: PADDR_UNTRANSLATED,
            ..Default::default()
        }
    }

    /// True iff this entry carries no observations at all: the shape every entry must have
    /// immediately after `reset`.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
            && self.registers.is_empty()
            && self.memory.is_empty()
            && self.events.is_empty()
            && self.extra_text.is_empty()
    }

    /// Returns the entry to its just-reset shape, retaining the `Vec`/`String` backing storage
    /// so that steady-state tracing does no further allocation once the ring has warmed up.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.paddr = PADDR_UNTRANSLATED;
        self.insn_bytes = [0; MAX_INSN_SIZE];
        self.insn_size = 0;
        self.flags = EntryFlags::empty();
        self.next_cpu_mode = None;
        self.intr_code = 0;
        self.intr_vector = 0;
        self.intr_faultaddr = 0;
        self.asid = 0;
        self.registers.clear();
        self.memory.clear();
        self.events.clear();
        self.extra_text.clear();
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_empty() {
        let e = Entry::new();
        assert!(e.is_empty());
        assert_eq!(e.paddr, PADDR_UNTRANSLATED);
    }

    #[test]
    fn reset_restores_canonical_empty_shape() {
        let mut e = Entry::new();
        e.pc = 0x1000;
        e.flags |= EntryFlags::HAS_INSTR_DATA;
        e.registers.push(RegisterRecord::gpr("rax", 1));
        e.events.push(Event::start(0x1000));
        e.extra_text.push_str("hi");

        assert!(!e.is_empty());
        e.reset();
        assert!(e.is_empty());
        assert_eq!(e.pc, 0);
    }
}
