// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use trace_types::Backend;

/// Discards everything. Exists so tracing can be switched fully off at runtime (via
/// `global_switch`) without reconfiguring which backend is active.
#[derive(Default)]
pub struct NopBackend;

impl Backend for NopBackend {}
