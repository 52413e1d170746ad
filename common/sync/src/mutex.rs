// Copyright 2020 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::LockResult;
use std::sync::TryLockError;

/// A mutual exclusion primitive that does not poison itself on panic.
///
/// Behaves like `std::sync::Mutex` except that a panic while the lock is held does not mark the
/// mutex as poisoned for subsequent lockers; the original panic is simply allowed to unwind
/// through whichever thread triggered it.
#[derive(Debug, Default)]
pub struct Mutex<T: ?Sized> {
    inner: std::sync::Mutex<T>,
}

impl<T> Mutex<T> {
    pub fn new(val: T) -> Self {
        Mutex {
            inner: std::sync::Mutex::new(val),
        }
    }

    pub fn into_inner(self) -> T {
        clean(self.inner.into_inner())
    }
}

impl<T: ?Sized> Mutex<T> {
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        MutexGuard {
            guard: clean(self.inner.lock()),
        }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(MutexGuard { guard }),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(p)) => Some(MutexGuard { guard: p.into_inner() }),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        clean(self.inner.get_mut())
    }
}

/// An RAII guard returned by `Mutex::lock`, dereferencing to the guarded value.
pub struct MutexGuard<'a, T: ?Sized + 'a> {
    pub(crate) guard: std::sync::MutexGuard<'a, T>,
}

impl<'a, T: ?Sized> Deref for MutexGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard.deref()
    }
}

impl<'a, T: ?Sized> DerefMut for MutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard.deref_mut()
    }
}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

fn clean<T>(result: LockResult<T>) -> T {
    match result {
        Ok(val) => val,
        Err(poison) => poison.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn smoke() {
        let m = Mutex::new(1);
        *m.lock() += 1;
        assert_eq!(*m.lock(), 2);
    }

    #[test]
    fn unpoisoned_after_panic() {
        let m = Arc::new(Mutex::new(0));
        let m2 = Arc::clone(&m);
        let _ = thread::spawn(move || {
            let mut guard = m2.lock();
            *guard = 1;
            panic!("expected panic");
        })
        .join();

        // A panicking holder does not poison the lock; the next locker just sees the last
        // write that made it through before the unwind.
        assert_eq!(*m.lock(), 1);
    }
}
