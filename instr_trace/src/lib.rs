// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The per-CPU instruction trace core of a whole-system emulator: collects, filters, and
//! dispatches a stream of instruction trace entries to a pluggable serialization backend.
//!
//! This crate owns the collection and dispatch engine only — the CPU translator and execution
//! loop, the cross-CPU exclusive-context scheduling primitive, `-dfilter` address-range parsing,
//! physical-address translation, concrete wire formats, and CLI parsing are all named external
//! collaborators with interfaces declared here (`global::CpuScheduler`, `filter::DebugRegions`,
//! `collector::PaddrResolver`) and implementations supplied by the embedder.
//!
//! A CPU's trace state lives in a [`controller::TraceController`]; translated code drives it
//! through the [`collector`] functions and commits at instruction boundaries; [`global::global_switch`]
//! fans a monitor command out to every CPU; [`printf`] is the staged-printf side channel for
//! cheap formatted debug text.

pub mod backend;
pub mod collector;
pub mod config;
pub mod controller;
pub mod filter;
pub mod global;
pub mod printf;
mod ring;
pub mod stats;

use std::sync::Arc;

pub use trace_types::Entry;

use crate::config::TraceConfig;
use crate::controller::LogLevel;
use crate::controller::TraceController;
use crate::filter::DebugRegions;

/// Builds the per-CPU trace state for a newly created CPU: resolves the backend and reset-filter
/// list from `config`, and leaves the loglevel at `NONE` unless `initial_level` says otherwise
/// (the caller is expected to pass whatever `global_switch` would already have applied, if
/// instruction logging was requested before this CPU came up — see
/// [`controller::TraceController::init`]).
///
/// The backend is the process-wide one installed via [`backend::install`]/[`backend::active`],
/// not a fresh instance per CPU: every CPU must emit through the same backend object so that
/// [`global::sync_buffers`], which drains `backend::active()`, actually reaches what CPUs wrote
/// to. The first call to `new_cpu` installs `config`'s configured backend as that process-wide
/// instance; later calls reuse it, matching `install`'s own "first one wins" contract.
pub fn new_cpu(
    cpu_id: usize,
    config: &TraceConfig,
    debug_regions: Arc<dyn DebugRegions>,
    initial_level: LogLevel,
    current_mode: trace_types::CpuMode,
) -> TraceController {
    backend::install(backend::build(config.backend_kind()));
    TraceController::init(
        cpu_id,
        controller::MIN_ENTRY_BUFFER_SIZE,
        &config.reset_filters(),
        debug_regions,
        backend::active(),
        initial_level,
        current_mode,
    )
}
