// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::Entry;

/// Process-wide selector for the single active backend. The concrete byte format each of these
/// produces is out of scope for this crate; only the dispatch contract below is specified.
#[derive(Copy, Clone, Debug, PartialEq, Eq, enumn::N)]
#[repr(u8)]
pub enum BackendKind {
    Text = 0,
    CvTrace = 1,
    Nop = 2,
    Perfetto = 3,
    Protobuf = 4,
    Json = 5,
    DrCacheSim = 6,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Text
    }
}

/// A serialization sink for committed trace entries.
///
/// Every hook is optional: a backend that has nothing useful to do for a given hook simply
/// leaves it at the default no-op implementation. The core holds exactly one active backend for
/// the whole process, shared across every CPU; switching backends after any CPU has been created
/// is not supported (there's no hook for it below on purpose).
pub trait Backend: Send + Sync {
    /// Per-CPU one-time setup, e.g. writing a file header. Called once from `TraceController`
    /// init on the owning CPU thread.
    fn init(&self, _cpu_id: usize) {}

    /// Blocking checkpoint: when this returns, every entry handed to `emit_instr` before the
    /// call is durably observable by whatever is downstream of the backend.
    fn sync(&self, _cpu_id: usize) {}

    /// Serialize one committed entry. Called with entries for a single CPU always on that CPU's
    /// own thread, and always in commit order.
    fn emit_instr(&self, _cpu_id: usize, _entry: &Entry) {}

    /// An out-of-band numeric sample, keyed by an opaque counter id, outside the per-instruction
    /// entry stream (e.g. periodic stats).
    fn emit_debug(&self, _cpu_id: usize, _counter_id: u32, _value: u64) {}
}
