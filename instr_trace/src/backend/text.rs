// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::io::Write;

use sync::Mutex;
use trace_types::Backend;
use trace_types::Entry;
use trace_types::Event;
use trace_types::RegisterData;

/// A human-readable backend, useful for interactive debugging. The line format below is a
/// reasonable default rendering, not a format other tools are expected to parse; anything
/// wire-stable belongs in a dedicated backend crate, out of scope for the core.
pub struct TextBackend {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl TextBackend {
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        TextBackend {
            sink: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        TextBackend::to_writer(Box::new(std::io::stdout()))
    }

    fn write_line(&self, line: &str) {
        let mut sink = self.sink.lock();
        if let Err(e) = writeln!(sink, "{line}") {
            log::warn!("instr_trace: text backend write failed: {e}");
        }
    }
}

impl Backend for TextBackend {
    fn init(&self, cpu_id: usize) {
        self.write_line(&format!("--- trace start, cpu {cpu_id} ---"));
    }

    fn sync(&self, _cpu_id: usize) {
        let mut sink = self.sink.lock();
        let _ = sink.flush();
    }

    fn emit_instr(&self, cpu_id: usize, entry: &Entry) {
        let mut line = format!("cpu{cpu_id} pc=0x{:x}", entry.pc);
        if entry.flags.contains(trace_types::EntryFlags::HAS_INSTR_DATA) {
            let bytes = &entry.insn_bytes[..entry.insn_size as usize];
            line.push_str(" insn=");
            for b in bytes {
                line.push_str(&format!("{b:02x}"));
            }
        }
        for reg in &entry.registers {
            match &reg.data {
                RegisterData::Integer(v) => line.push_str(&format!(" {}=0x{:x}", reg.name, v)),
                RegisterData::Capability(c) => {
                    line.push_str(&format!(" {}=(base=0x{:x},len=0x{:x},tag={})", reg.name, c.base, c.length, c.tag))
                }
            }
        }
        for mem in &entry.memory {
            let op = if mem.is_store() { "st" } else { "ld" };
            line.push_str(&format!(" {op}[0x{:x}]", mem.addr));
        }
        for event in &entry.events {
            match event {
                Event::State { next_state, pc } => {
                    line.push_str(&format!(" STATE({next_state:?}@0x{pc:x})"))
                }
                Event::RegDump { gpr } => line.push_str(&format!(" REGDUMP({} regs)", gpr.len())),
                Event::User { id, .. } => line.push_str(&format!(" USER({id})")),
            }
        }
        if !entry.extra_text.is_empty() {
            line.push_str(" ; ");
            line.push_str(&entry.extra_text);
        }
        self.write_line(&line);
    }

    fn emit_debug(&self, cpu_id: usize, counter_id: u32, value: u64) {
        self.write_line(&format!("cpu{cpu_id} counter[{counter_id}]={value}"));
    }
}
