// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::RegisterRecord;

/// The three transitions the trace state machine can announce via a `STATE` event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceState {
    Start,
    Stop,
    Flush,
}

/// One event observed during an instruction. Events own any heap data they carry (notably the
/// register dump attached to a slice-opening `STATE{Start}`), which is released when the owning
/// `Entry` is reset.
#[derive(Clone, Debug)]
pub enum Event {
    /// A trace-slice boundary or explicit flush point.
    State { next_state: TraceState, pc: u64 },
    /// A full register dump, emitted alongside a `STATE{Start}` event so that consumers of a
    /// slice have a baseline without having to reconstruct it from preceding slices.
    RegDump { gpr: Vec<RegisterRecord> },
    /// A target-defined event with an opaque id and payload, for anything the core doesn't
    /// otherwise model (e.g. a guest hypercall marker).
    User { id: u32, payload: Vec<u8> },
}

impl Event {
    pub fn start(pc: u64) -> Self {
        Event::State {
            next_state: TraceState::Start,
            pc,
        }
    }

    pub fn stop(pc: u64) -> Self {
        Event::State {
            next_state: TraceState::Stop,
            pc,
        }
    }

    pub fn flush(pc: u64) -> Self {
        Event::State {
            next_state: TraceState::Flush,
            pc,
        }
    }
}
