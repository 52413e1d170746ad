// Copyright 2020 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Synchronization primitives that panic instead of silently poisoning state.
//!
//! A thread that panics while holding a `std::sync::Mutex` poisons it, and every later `lock()`
//! returns an `Err` that almost all callers promptly `unwrap()` anyway. That turns an
//! already-fatal bug (an unexpected panic) into a second failure mode (poison propagation) that
//! has to be handled everywhere a lock is taken. `Mutex` and `Condvar` here skip the poisoning
//! step: a poisoned lock is unwrapped immediately and the original panic propagates as if the
//! lock were never involved.

mod condvar;
mod mutex;

pub use condvar::Condvar;
pub use mutex::Mutex;
pub use mutex::MutexGuard;
