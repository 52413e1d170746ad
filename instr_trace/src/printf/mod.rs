// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Staged printf: a format string and its arguments are enqueued cheaply during translation
//! (`gen_printf`/`gen_printf_flush`) and rendered only when the buffer actually needs text
//! (`printf_dump`). See `stage` and `render` for the two halves.

mod conv;
mod render;
mod stage;

pub use conv::FormatError;
pub use render::printf_dump;
pub use stage::PrintfStage;
pub use stage::RuntimeArg;
pub use stage::FLUSH_BARRIER;
pub use stage::PRINTF_ARG_MAX;
pub use stage::PRINTF_BUF_DEPTH;
