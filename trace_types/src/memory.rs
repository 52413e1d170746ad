// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use bitflags::bitflags;

use crate::Capability;
use crate::MemOpInfo;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct MemoryFlags: u8 {
        /// Set for a store; absent for a load.
        const ST = 0b01;
        /// The value carried is a capability rather than a plain integer.
        const CAP = 0b10;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemoryValue {
    Integer(u64),
    Capability(Capability),
}

/// One memory access observed during an instruction.
#[derive(Clone, Debug)]
pub struct MemoryRecord {
    pub flags: MemoryFlags,
    pub op: MemOpInfo,
    pub addr: u64,
    pub paddr: u64,
    pub value: MemoryValue,
}

impl MemoryRecord {
    pub fn is_store(&self) -> bool {
        self.flags.contains(MemoryFlags::ST)
    }
}
