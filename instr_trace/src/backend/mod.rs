// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod nop;
mod stub;
mod text;

use std::sync::Arc;

use once_cell::sync::OnceCell;
pub use trace_types::Backend;
pub use trace_types::BackendKind;

pub use self::nop::NopBackend;
pub use self::stub::UnimplementedBackend;
pub use self::text::TextBackend;

static ACTIVE: OnceCell<Arc<dyn Backend>> = OnceCell::new();

/// Installs the process-wide active backend. The core holds a single active backend selected at
/// startup; a second call is a configuration bug and is rejected (with a warning) rather than
/// silently replacing whatever every existing CPU is already emitting through.
pub fn install(backend: Arc<dyn Backend>) {
    if ACTIVE.set(backend).is_err() {
        log::warn!("instr_trace: backend already installed, ignoring later installation");
    }
}

/// The active backend, defaulting to `NopBackend` if nothing was ever installed.
pub fn active() -> Arc<dyn Backend> {
    ACTIVE.get_or_init(|| Arc::new(NopBackend)).clone()
}

/// Builds the standard backend for `kind`. `Text` and `Nop` are fully functional; the rest are
/// interface-only placeholders (see `UnimplementedBackend`) since their wire formats are out of
/// scope for the core.
pub fn build(kind: BackendKind) -> Arc<dyn Backend> {
    match kind {
        BackendKind::Nop => Arc::new(NopBackend),
        BackendKind::Text => Arc::new(TextBackend::stdout()),
        other => Arc::new(UnimplementedBackend::new(other)),
    }
}

/// Forwards an out-of-band numeric sample to the active backend, if it wants one.
pub fn counter(cpu_id: usize, counter_id: u32, value: u64) {
    active().emit_debug(cpu_id, counter_id, value);
}
