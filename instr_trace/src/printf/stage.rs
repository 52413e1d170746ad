// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The staged-printf protocol: translated code enqueues a format pointer and its arguments with
//! one store per argument and one bitmap-OR per call (`gen_printf`), so that tracing a hot path
//! costs almost nothing until the entry actually commits and `printf_dump` renders whatever was
//! staged.
//!
//! There's no JIT in this core to hand instructions to, so `gen_printf`/`gen_printf_flush` below
//! perform the staging effect directly instead of emitting code that performs it later; the
//! mutated state, its ordering and the store widths are exactly what §4.6 specifies, which is
//! what the translator's IR builder would otherwise be asked to reproduce at codegen time.

use crate::printf::conv;
use crate::printf::conv::ConvKind;

/// Depth of the staging area: the maximum number of printfs in flight before a flush is forced.
pub const PRINTF_BUF_DEPTH: usize = 16;
/// Maximum arguments a single staged printf may carry.
pub const PRINTF_ARG_MAX: usize = 8;
/// Slot-count threshold at which a non-early, non-forced flush request still emits a render call.
pub const FLUSH_BARRIER: usize = 8;

/// The source of one argument passed to `gen_printf`, corresponding to a `type_spec` character:
/// `c` (compile-time constant), `w` (32-bit runtime value) or `d` (64-bit runtime value).
#[derive(Copy, Clone, Debug)]
pub enum RuntimeArg {
    ConstInt(i64),
    ConstFloat(f64),
    Reg32(u32),
    Reg64(u64),
}

impl RuntimeArg {
    fn type_char(self) -> char {
        match self {
            RuntimeArg::ConstInt(_) | RuntimeArg::ConstFloat(_) => 'c',
            RuntimeArg::Reg32(_) => 'w',
            RuntimeArg::Reg64(_) => 'd',
        }
    }
}

/// Computes the raw 64-bit word to store in `args[ndx][k]` for one conversion/argument pair,
/// sign- or zero-extending a 32-bit runtime value per the conversion's declared signedness.
fn encode_arg(kind: ConvKind, type_spec_char: char, arg: RuntimeArg) -> u64 {
    assert_eq!(
        arg.type_char(),
        type_spec_char,
        "printf argument kind does not match its type_spec character"
    );
    match (kind, arg) {
        (ConvKind::Int { signed: true, .. }, RuntimeArg::ConstInt(v)) => v as u64,
        (ConvKind::Int { signed: false, .. }, RuntimeArg::ConstInt(v)) => v as u64,
        (ConvKind::Int { signed: true, .. }, RuntimeArg::Reg32(v)) => (v as i32) as i64 as u64,
        (ConvKind::Int { signed: false, .. }, RuntimeArg::Reg32(v)) => v as u64,
        (ConvKind::Int { .. }, RuntimeArg::Reg64(v)) => v,
        (ConvKind::Pointer, RuntimeArg::ConstInt(v)) => v as u64,
        (ConvKind::Pointer, RuntimeArg::Reg32(v)) => v as u64,
        (ConvKind::Pointer, RuntimeArg::Reg64(v)) => v,
        (ConvKind::Float { storage_bytes: 4 }, RuntimeArg::ConstFloat(v)) => (v as f32).to_bits() as u64,
        (ConvKind::Float { storage_bytes: 4 }, RuntimeArg::Reg32(v)) => v as u64,
        (ConvKind::Float { storage_bytes: 8 }, RuntimeArg::ConstFloat(v)) => v.to_bits(),
        (ConvKind::Float { storage_bytes: 8 }, RuntimeArg::Reg64(v)) => v,
        (kind, arg) => panic!("printf argument {arg:?} cannot satisfy conversion {kind:?}"),
    }
}

/// The per-CPU staging area: pending format pointers, their encoded arguments, and which slots
/// are valid. `used` is the translation-time "next free slot" counter (`ctx.printf_used_ptr` in
/// §4.6); it's reset by `gen_printf_flush` independently of `valid`, which `printf_dump` clears
/// once it has rendered everything.
#[derive(Default)]
pub struct PrintfStage {
    fmts: [Option<&'static str>; PRINTF_BUF_DEPTH],
    args: [[u64; PRINTF_ARG_MAX]; PRINTF_BUF_DEPTH],
    arg_counts: [usize; PRINTF_BUF_DEPTH],
    valid: u32,
    used: usize,
}

impl PrintfStage {
    pub fn new() -> Self {
        PrintfStage {
            fmts: [None; PRINTF_BUF_DEPTH],
            ..Default::default()
        }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn valid_entries(&self) -> u32 {
        self.valid
    }

    pub(crate) fn fmt(&self, ndx: usize) -> Option<&'static str> {
        self.fmts[ndx]
    }

    pub(crate) fn args(&self, ndx: usize) -> &[u64] {
        &self.args[ndx][..self.arg_counts[ndx]]
    }

    pub(crate) fn clear_valid(&mut self, ndx: usize) {
        self.valid &= !(1 << ndx);
    }

    pub(crate) fn clear_all_valid(&mut self) {
        self.valid = 0;
    }

    /// Stages one printf: reserves the next slot, stores the format pointer, encodes every
    /// argument into the slot's argument words, and sets the slot's valid bit. Panics (a
    /// programming-contract violation, not a runtime condition) if the staging area is full, the
    /// format string is malformed, or `fmt`/`type_spec`/`args` disagree on argument count or
    /// kind.
    pub fn gen_printf(&mut self, fmt: &'static str, type_spec: &str, args: &[RuntimeArg]) -> usize {
        assert!(self.used < PRINTF_BUF_DEPTH, "printf staging area exhausted");
        assert!(args.len() <= PRINTF_ARG_MAX, "too many printf arguments");

        let (conversions, _trailing) = conv::parse_format(fmt).expect("malformed printf format string");
        let type_chars: Vec<char> = type_spec.chars().collect();
        assert_eq!(
            conversions.len(),
            type_chars.len(),
            "format string and type spec desynchronized"
        );
        assert_eq!(
            conversions.len(),
            args.len(),
            "format string and argument list desynchronized"
        );

        let ndx = self.used;
        self.used += 1;

        self.fmts[ndx] = Some(fmt);
        self.arg_counts[ndx] = args.len();
        for (k, ((conv, &tc), &arg)) in conversions.iter().zip(type_chars.iter()).zip(args.iter()).enumerate() {
            self.args[ndx][k] = encode_arg(conv.kind, tc, arg);
        }
        self.valid |= 1 << ndx;
        ndx
    }

    /// Flushes the translation-time staging counter. Emits a (simulated) call to `printf_dump`
    /// when `force` is set, or when at least one slot is in use and either `early` is set or the
    /// barrier has been reached; returns whether that call would fire. `used` is reset
    /// unconditionally, matching the translator starting the next block with a clean counter
    /// regardless of whether this flush actually rendered anything.
    pub fn gen_printf_flush(&mut self, early: bool, force: bool) -> bool {
        let should_flush = force || (self.used > 0 && (early || self.used >= FLUSH_BARRIER));
        self.used = 0;
        should_flush
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_mixed_argument_kinds() {
        let mut stage = PrintfStage::new();
        let ndx = stage.gen_printf(
            "a=%d b=%c c=0x%lx",
            "wcd",
            &[
                RuntimeArg::Reg32(7),
                RuntimeArg::ConstInt('Q' as i64),
                RuntimeArg::Reg64(0xABCD),
            ],
        );
        assert_eq!(ndx, 0);
        assert_eq!(stage.valid_entries(), 0b1);
        assert_eq!(stage.args(0), &[7, b'Q' as u64, 0xABCD]);
    }

    #[test]
    #[should_panic(expected = "desynchronized")]
    fn mismatched_type_spec_length_panics() {
        let mut stage = PrintfStage::new();
        stage.gen_printf("%d %d", "w", &[RuntimeArg::Reg32(1)]);
    }

    #[test]
    fn flush_barrier_forces_emission_without_early() {
        let mut stage = PrintfStage::new();
        for _ in 0..FLUSH_BARRIER {
            stage.gen_printf("x", "", &[]);
        }
        assert!(stage.gen_printf_flush(false, false));
        assert_eq!(stage.used(), 0);
    }

    #[test]
    fn flush_is_noop_when_nothing_staged_and_not_forced() {
        let mut stage = PrintfStage::new();
        assert!(!stage.gen_printf_flush(true, false));
    }

    #[test]
    fn force_flushes_even_when_empty() {
        let mut stage = PrintfStage::new();
        assert!(stage.gen_printf_flush(false, true));
    }
}
