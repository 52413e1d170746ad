// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Parses the subset of printf conversions the staged-printf renderer understands: integers
//! (with `h`/`hh`/`l`/`ll` length modifiers), floats/doubles, and pointers. Walking `fmt` and a
//! parallel `type_spec` string in lockstep is how `gen_printf` decides, for each argument, what
//! width store to emit and whether a 32-bit runtime value needs sign- or zero-extension into the
//! 64-bit argument slot.

/// Per-argument storage kind, decoded from one conversion in the format string.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConvKind {
    Int { storage_bytes: u8, signed: bool },
    Float { storage_bytes: u8 },
    Pointer,
}

/// One parsed conversion and the raw format text of the literal run that preceded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub literal_before: String,
    pub kind: ConvKind,
    /// The conversion character itself (`x`, `d`, `c`, ...), kept alongside `kind` because
    /// rendering needs to distinguish e.g. `%x` from `%d` even though both store a 4-byte int.
    pub spec: char,
}

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported conversion character '{0}'")]
    Unsupported(char),
    #[error("unterminated conversion in format string")]
    Unterminated,
}

/// Splits `fmt` into its literal runs and parsed conversions, in order. `%%` is a literal `%`
/// and folds into the surrounding literal text rather than producing a `Conversion`.
pub fn parse_format(fmt: &str) -> Result<(Vec<Conversion>, String), FormatError> {
    let mut conversions = Vec::new();
    let mut literal = String::new();
    let mut trailing = String::new();
    let chars: Vec<char> = fmt.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        // '%'
        i += 1;
        if i >= chars.len() {
            return Err(FormatError::Unterminated);
        }
        if chars[i] == '%' {
            literal.push('%');
            i += 1;
            continue;
        }

        // Skip flags and width/precision digits/'.'; none of them affect storage width.
        while i < chars.len() && matches!(chars[i], '-' | '+' | ' ' | '0' | '#') {
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }

        let mut length = Length::None;
        loop {
            match chars.get(i) {
                Some('h') if length == Length::None => {
                    length = Length::H;
                    i += 1;
                }
                Some('h') if length == Length::H => {
                    length = Length::Hh;
                    i += 1;
                }
                Some('l') if length == Length::None => {
                    length = Length::L;
                    i += 1;
                }
                Some('l') if length == Length::L => {
                    length = Length::Ll;
                    i += 1;
                }
                _ => break,
            }
        }

        let conv_char = *chars.get(i).ok_or(FormatError::Unterminated)?;
        i += 1;

        let kind = match conv_char {
            'd' | 'i' => ConvKind::Int {
                storage_bytes: length.int_bytes(),
                signed: true,
            },
            'u' | 'x' | 'X' | 'o' => ConvKind::Int {
                storage_bytes: length.int_bytes(),
                signed: false,
            },
            'c' => ConvKind::Int {
                storage_bytes: 1,
                signed: false,
            },
            'f' | 'e' | 'g' | 'F' | 'E' | 'G' => ConvKind::Float {
                storage_bytes: if length >= Length::L { 8 } else { 4 },
            },
            'p' => ConvKind::Pointer,
            other => return Err(FormatError::Unsupported(other)),
        };

        conversions.push(Conversion {
            literal_before: std::mem::take(&mut literal),
            kind,
            spec: conv_char,
        });
    }
    trailing.push_str(&literal);
    Ok((conversions, trailing))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Length {
    None,
    H,
    Hh,
    L,
    Ll,
}

impl Length {
    fn int_bytes(self) -> u8 {
        match self {
            Length::Hh => 1,
            Length::H => 2,
            Length::None => 4,
            Length::L => 8,
            Length::Ll => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_conversions() {
        let (convs, trailing) = parse_format("a=%d b=%c c=0x%lx").unwrap();
        assert_eq!(convs.len(), 3);
        assert_eq!(convs[0].literal_before, "a=");
        assert_eq!(convs[0].kind, ConvKind::Int { storage_bytes: 4, signed: true });
        assert_eq!(convs[0].spec, 'd');
        assert_eq!(convs[1].literal_before, " b=");
        assert_eq!(convs[1].kind, ConvKind::Int { storage_bytes: 1, signed: false });
        assert_eq!(convs[1].spec, 'c');
        assert_eq!(convs[2].literal_before, " c=0x");
        assert_eq!(convs[2].kind, ConvKind::Int { storage_bytes: 8, signed: false });
        assert_eq!(convs[2].spec, 'x');
        assert_eq!(trailing, "");
    }

    #[test]
    fn percent_percent_is_literal() {
        let (convs, trailing) = parse_format("100%% done").unwrap();
        assert!(convs.is_empty());
        assert_eq!(trailing, "100% done");
    }

    #[test]
    fn rejects_unknown_conversion() {
        assert_eq!(parse_format("%s"), Err(FormatError::Unsupported('s')));
    }
}
