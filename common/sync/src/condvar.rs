// Copyright 2020 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::time::Duration;

use crate::mutex::MutexGuard;

/// A condition variable that does not poison itself on panic, pairing with `Mutex`.
#[derive(Debug, Default)]
pub struct Condvar {
    inner: std::sync::Condvar,
}

impl Condvar {
    pub fn new() -> Self {
        Condvar {
            inner: std::sync::Condvar::new(),
        }
    }

    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let MutexGuard { guard } = guard;
        let guard = match self.inner.wait(guard) {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        };
        MutexGuard { guard }
    }

    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        dur: Duration,
    ) -> (MutexGuard<'a, T>, bool) {
        let MutexGuard { guard } = guard;
        let (guard, timeout) = match self.inner.wait_timeout(guard, dur) {
            Ok((guard, timeout)) => (guard, timeout.timed_out()),
            Err(poison) => {
                let (guard, timeout) = poison.into_inner();
                (guard, timeout.timed_out())
            }
        };
        (MutexGuard { guard }, timeout)
    }

    pub fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}
