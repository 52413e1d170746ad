// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::Capability;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct RegisterFlags: u8 {
        /// The register itself is a capability register (value is a full `Capability`).
        const CAP_REG = 0b01;
        /// The register is a plain integer register whose bits currently encode a capability
        /// (e.g. a GPR aliased onto a capability register file). Distinct from `CAP_REG` because
        /// the payload here is still an integer, not a decoded `Capability`.
        const HOLDS_CAP = 0b10;
    }
}

/// The payload carried by a register record: either a plain integer or a decoded capability.
#[derive(Clone, Debug, PartialEq)]
pub enum RegisterData {
    Integer(u64),
    Capability(Capability),
}

/// One register update observed during an instruction.
#[derive(Clone, Debug)]
pub struct RegisterRecord {
    pub name: Cow<'static, str>,
    pub flags: RegisterFlags,
    pub data: RegisterData,
}

impl RegisterRecord {
    /// A plain integer GPR.
    pub fn gpr(name: impl Into<Cow<'static, str>>, value: u64) -> Self {
        RegisterRecord {
            name: name.into(),
            flags: RegisterFlags::empty(),
            data: RegisterData::Integer(value),
        }
    }

    /// A capability register.
    pub fn cap(name: impl Into<Cow<'static, str>>, capability: Capability) -> Self {
        RegisterRecord {
            name: name.into(),
            flags: RegisterFlags::CAP_REG,
            data: RegisterData::Capability(capability),
        }
    }

    /// An integer register whose bits happen to hold a capability encoding.
    pub fn cap_int(name: impl Into<Cow<'static, str>>, value: u64) -> Self {
        RegisterRecord {
            name: name.into(),
            flags: RegisterFlags::HOLDS_CAP,
            data: RegisterData::Integer(value),
        }
    }
}
