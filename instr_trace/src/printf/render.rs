// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Runtime side of staged printf: `printf_dump` walks whatever `gen_printf` left behind and
//! renders it into the current entry's text buffer. This is the half of §4.6 that actually runs
//! on the hot path's cold exit, not at translation time.

use crate::printf::conv;
use crate::printf::conv::ConvKind;
use crate::printf::stage::PrintfStage;

/// Each staged printf renders through a small bounce buffer before landing in the entry's text;
/// this bounds a single misbehaving format string (e.g. one that manages to loop conversions)
/// from growing the entry without limit.
const BOUNCE_LIMIT: usize = 256;

/// Renders every valid staged printf, in slot order (bit 0 first), appending the result to `out`
/// and clearing each slot's valid bit as it's consumed. Does not touch `used`, which only
/// `gen_printf`/`gen_printf_flush` manage.
pub fn printf_dump(stage: &mut PrintfStage, out: &mut String) {
    let valid = stage.valid_entries();
    for ndx in 0..super::stage::PRINTF_BUF_DEPTH {
        if valid & (1 << ndx) == 0 {
            continue;
        }
        let fmt = stage
            .fmt(ndx)
            .expect("valid bit set without a staged format string");
        let args = stage.args(ndx).to_vec();
        let rendered = render_one(fmt, &args);
        out.push_str(&rendered);
        stage.clear_valid(ndx);
    }
}

fn render_one(fmt: &str, args: &[u64]) -> String {
    let (conversions, trailing) = conv::parse_format(fmt).expect("malformed printf format string");
    let mut bounce = String::new();
    for (conv, &word) in conversions.iter().zip(args.iter()) {
        bounce.push_str(&conv.literal_before);
        render_value(&mut bounce, conv.kind, conv.spec, word);
    }
    bounce.push_str(&trailing);
    assert!(
        bounce.len() <= BOUNCE_LIMIT,
        "printf bounce buffer overflow: rendered {} bytes, limit {BOUNCE_LIMIT}",
        bounce.len()
    );
    bounce
}

fn render_value(out: &mut String, kind: ConvKind, spec: char, word: u64) {
    use std::fmt::Write;

    match kind {
        ConvKind::Int { .. } => match spec {
            'd' | 'i' => {
                let _ = write!(out, "{}", word as i64);
            }
            'u' => {
                let _ = write!(out, "{word}");
            }
            'x' => {
                let _ = write!(out, "{word:x}");
            }
            'X' => {
                let _ = write!(out, "{word:X}");
            }
            'o' => {
                let _ = write!(out, "{word:o}");
            }
            'c' => out.push((word as u8) as char),
            other => panic!("unexpected integer conversion character '{other}'"),
        },
        ConvKind::Float { storage_bytes } => {
            let v = if storage_bytes == 4 {
                f64::from(f32::from_bits(word as u32))
            } else {
                f64::from_bits(word)
            };
            match spec {
                'f' | 'F' => {
                    let _ = write!(out, "{v:.6}");
                }
                'e' | 'E' => {
                    let _ = write!(out, "{v:e}");
                }
                'g' | 'G' => {
                    let _ = write!(out, "{v}");
                }
                other => panic!("unexpected float conversion character '{other}'"),
            }
        }
        ConvKind::Pointer => {
            let _ = write!(out, "{word:#x}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printf::stage::RuntimeArg;

    #[test]
    fn renders_staged_entries_in_order_and_clears_valid() {
        let mut stage = PrintfStage::new();
        stage.gen_printf("first=%d\n", "w", &[RuntimeArg::Reg32(1)]);
        stage.gen_printf("second=%x\n", "d", &[RuntimeArg::Reg64(0xff)]);

        let mut out = String::new();
        printf_dump(&mut stage, &mut out);

        assert_eq!(out, "first=1\nsecond=ff\n");
        assert_eq!(stage.valid_entries(), 0);
    }

    #[test]
    fn renders_pointer_and_char_conversions() {
        let mut stage = PrintfStage::new();
        stage.gen_printf("%p:%c", "dc", &[RuntimeArg::Reg64(0x1000), RuntimeArg::ConstInt(b'!' as i64)]);

        let mut out = String::new();
        printf_dump(&mut stage, &mut out);

        assert_eq!(out, "0x1000:!");
    }

    #[test]
    fn bounce_buffer_stays_within_limit_for_ordinary_output() {
        let mut stage = PrintfStage::new();
        let fmt: &'static str = "%d";
        stage.gen_printf(fmt, "w", &[RuntimeArg::Reg32(123)]);

        let mut out = String::new();
        printf_dump(&mut stage, &mut out);
        assert!(out.len() <= BOUNCE_LIMIT);
    }

    #[test]
    #[should_panic(expected = "bounce buffer overflow")]
    fn bounce_buffer_overflow_panics() {
        // Literal text alone exceeds the limit; render_one must assert rather than truncate.
        let fmt = format!("{}%d", "a".repeat(BOUNCE_LIMIT + 1));
        render_one(&fmt, &[1]);
    }
}
