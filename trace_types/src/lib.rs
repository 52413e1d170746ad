// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Shared vocabulary for the per-CPU instruction trace core: the `Entry` accumulator and its
//! child records, plus the `Backend` interface that serialization sinks implement.
//!
//! This crate intentionally carries no knowledge of *how* entries are collected or dispatched
//! (that's `instr_trace`); it only fixes the types that collectors, the controller, and backends
//! all need to agree on, the way `cros_tracing_types` is shared between `cros_tracing` and the
//! concrete tracing backends that implement it.

mod backend;
mod capability;
mod entry;
mod event;
mod memop;
mod memory;
mod register;

pub use backend::Backend;
pub use backend::BackendKind;
pub use capability::Capability;
pub use entry::Entry;
pub use entry::EntryFlags;
pub use entry::CpuMode;
pub use entry::MAX_INSN_SIZE;
pub use entry::PADDR_UNTRANSLATED;
pub use event::Event;
pub use event::TraceState;
pub use memop::decode_memop;
pub use memop::Endianness;
pub use memop::MemOpInfo;
pub use memop::MemWidth;
pub use memory::MemoryFlags;
pub use memory::MemoryRecord;
pub use memory::MemoryValue;
pub use register::RegisterData;
pub use register::RegisterFlags;
pub use register::RegisterRecord;
