// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use trace_types::Backend;
use trace_types::BackendKind;

/// Placeholder for a backend whose wire format is a named external collaborator (CVTrace,
/// perfetto, protobuf, JSON, DrCacheSim): the core only owns the dispatch contract those formats
/// must satisfy, not their byte layout. Accepts every call `Backend` defines and logs once per
/// process that the concrete encoder isn't built in, so selecting one of these kinds fails
/// loudly exactly once instead of silently dropping every entry like `NopBackend` intentionally
/// does.
pub struct UnimplementedBackend {
    kind: BackendKind,
    warned: AtomicBool,
}

impl UnimplementedBackend {
    pub fn new(kind: BackendKind) -> Self {
        UnimplementedBackend {
            kind,
            warned: AtomicBool::new(false),
        }
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            log::warn!(
                "instr_trace: backend {:?} is interface-only in this build; entries will be dropped",
                self.kind
            );
        }
    }
}

impl Backend for UnimplementedBackend {
    fn init(&self, _cpu_id: usize) {
        self.warn_once();
    }

    fn emit_instr(&self, _cpu_id: usize, _entry: &trace_types::Entry) {
        self.warn_once();
    }
}
