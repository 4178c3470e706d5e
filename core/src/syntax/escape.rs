//! Escape sequence decoding for character and string literals.
//!
//! The scanner calls [`decode_escapes`] on the body of a literal (the text
//! between the quotes). Decoding never panics: a malformed sequence comes back
//! as an [`EscapeError`] value so the scanner can keep going and the resolve
//! pass can report it against the offending token.

use core::fmt;
use core::iter::Peekable;
use core::str::CharIndices;

use crate::String;

/// Why an escape sequence could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeErrorKind {
    /// A backslash at the very end of the literal body.
    Dangling,
    /// `\q` and friends.
    Unknown(char),
    /// `\u` not followed by exactly four hex digits.
    BadUnicode,
    /// A `\u` escape naming half of a surrogate pair with no partner.
    LoneSurrogate,
}

/// A malformed escape sequence.
///
/// `offset` is the byte offset of the backslash within the literal body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeError {
    pub offset: usize,
    pub kind: EscapeErrorKind,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EscapeErrorKind::Dangling => write!(f, "dangling backslash at offset {}", self.offset),
            EscapeErrorKind::Unknown(c) => {
                write!(f, "unknown escape '\\{}' at offset {}", c, self.offset)
            }
            EscapeErrorKind::BadUnicode => {
                write!(f, "malformed unicode escape at offset {}", self.offset)
            }
            EscapeErrorKind::LoneSurrogate => {
                write!(f, "unpaired surrogate escape at offset {}", self.offset)
            }
        }
    }
}

/// Decode every escape sequence in `raw`.
///
/// Supports `\b \t \n \f \r \" \' \\`, octal escapes up to `\377`, and
/// unicode escapes `\uXXXX` (any number of `u`s). Surrogate pairs written as
/// two consecutive unicode escapes are combined.
pub fn decode_escapes(raw: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let err = |kind| EscapeError { offset, kind };
        let Some((_, e)) = chars.next() else {
            return Err(err(EscapeErrorKind::Dangling));
        };
        match e {
            'b' => out.push('\u{8}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'f' => out.push('\u{c}'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            '0'..='7' => out.push(decode_octal(e, &mut chars)),
            'u' => {
                let unit = decode_unicode_unit(&mut chars).ok_or(err(EscapeErrorKind::BadUnicode))?;
                match unit {
                    0xD800..=0xDBFF => {
                        // A high surrogate must be followed by `\uDC00`..`\uDFFF`.
                        let low = match (chars.next(), chars.next()) {
                            (Some((_, '\\')), Some((_, 'u'))) => decode_unicode_unit(&mut chars)
                                .ok_or(err(EscapeErrorKind::BadUnicode))?,
                            _ => return Err(err(EscapeErrorKind::LoneSurrogate)),
                        };
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(err(EscapeErrorKind::LoneSurrogate));
                        }
                        let code = 0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
                        out.push(char::from_u32(code).ok_or(err(EscapeErrorKind::LoneSurrogate))?);
                    }
                    0xDC00..=0xDFFF => return Err(err(EscapeErrorKind::LoneSurrogate)),
                    _ => out.push(
                        char::from_u32(unit as u32).ok_or(err(EscapeErrorKind::BadUnicode))?,
                    ),
                }
            }
            other => return Err(err(EscapeErrorKind::Unknown(other))),
        }
    }

    Ok(out)
}

fn decode_octal(first: char, chars: &mut Peekable<CharIndices<'_>>) -> char {
    // \0..\377: three digits only when the first one is 0..3.
    let max_digits = if first <= '3' { 3 } else { 2 };
    let mut value = first as u32 - '0' as u32;
    for _ in 1..max_digits {
        match chars.peek() {
            Some(&(_, d @ '0'..='7')) => {
                value = value * 8 + (d as u32 - '0' as u32);
                chars.next();
            }
            _ => break,
        }
    }
    // At most 0o377, always a valid scalar value.
    char::from_u32(value).unwrap_or('\0')
}

fn decode_unicode_unit(chars: &mut Peekable<CharIndices<'_>>) -> Option<u16> {
    // `\uuuu0041` is legal: skip the extra `u`s.
    while let Some(&(_, 'u')) = chars.peek() {
        chars.next();
    }
    let mut value: u16 = 0;
    for _ in 0..4 {
        let (_, d) = chars.next()?;
        value = value * 16 + d.to_digit(16)? as u16;
    }
    Some(value)
}
