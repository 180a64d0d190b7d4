//! Pure word-level encode/decode.
//!
//! Wire data is a sequence of 16-bit words. Multi-word unsigned values
//! are big-endian concatenations; signed values are two's-complement
//! single words; text fields pack two ASCII characters per word,
//! high byte first.

use crate::channel::Value;
use crate::fault::Fault;

/// Midpoint of the unsigned 16-bit range, exclusive upper bound for
/// values that pass through overflow correction unchanged.
pub const WRAP_MIDPOINT: i64 = 32768;
/// Full unsigned 16-bit range, subtracted during overflow correction.
pub const WRAP_RANGE: i64 = 65536;

/// Wire encoding of one register binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// One unsigned word.
    U16,
    /// One signed (two's-complement) word.
    S16,
    /// Two unsigned words, big-endian.
    U32,
    /// Fixed-width text, two packed characters per word.
    Text(usize),
    /// Placeholder consuming wire words, bound to no channel.
    Pad(usize),
}

impl RegisterKind {
    /// Number of wire words this kind occupies.
    pub fn words(&self) -> usize {
        match self {
            RegisterKind::U16 | RegisterKind::S16 => 1,
            RegisterKind::U32 => 2,
            RegisterKind::Text(n) | RegisterKind::Pad(n) => *n,
        }
    }
}

/// Decodes a word slice according to `kind`.
///
/// Returns `None` for padding. Infallible for well-formed slices: the
/// caller guarantees `words.len() == kind.words()`.
pub fn decode(words: &[u16], kind: RegisterKind) -> Option<Value> {
    debug_assert_eq!(words.len(), kind.words());
    match kind {
        RegisterKind::U16 | RegisterKind::U32 => Some(Value::Int(decode_unsigned(words) as i64)),
        RegisterKind::S16 => Some(Value::Int(i64::from(decode_signed16(words[0])))),
        RegisterKind::Text(_) => Some(Value::Text(decode_text(words))),
        RegisterKind::Pad(_) => None,
    }
}

/// Big-endian concatenation of up to four unsigned words, no sign
/// extension.
pub fn decode_unsigned(words: &[u16]) -> u64 {
    debug_assert!(words.len() <= 4);
    words.iter().fold(0u64, |acc, &w| (acc << 16) | u64::from(w))
}

/// Two's-complement interpretation of a single word.
pub fn decode_signed16(word: u16) -> i16 {
    word as i16
}

/// Unpacks fixed-width text, two ASCII characters per word, high byte
/// first. The declared width is authoritative: no terminator scanning,
/// trailing NULs are trimmed, non-ASCII bytes become `.`.
pub fn decode_text(words: &[u16]) -> String {
    let mut out = String::with_capacity(words.len() * 2);
    for &w in words {
        for byte in [(w >> 8) as u8, (w & 0xff) as u8] {
            if byte == 0 {
                out.push('\0');
            } else if byte.is_ascii() {
                out.push(byte as char);
            } else {
                out.push('.');
            }
        }
    }
    out.trim_end_matches('\0').to_string()
}

/// Recovers a signed physical quantity from a wire-unsigned field that
/// lacks a dedicated sign bit: raw values above the unsigned midpoint
/// wrap to negative by subtracting the full range.
///
/// This is a declared per-field property, applied where the binding (or
/// the aggregation layer) calls for it, never globally.
pub fn overflow_corrected(raw: i64) -> i64 {
    if raw > WRAP_MIDPOINT {
        raw - WRAP_RANGE
    } else {
        raw
    }
}

/// Encodes an integer value according to `kind`.
///
/// # Errors
///
/// Returns a validation fault if the value does not fit the field, or if
/// the kind accepts no integer encode (text, padding).
pub fn encode_int(value: i64, kind: RegisterKind) -> Result<Vec<u16>, Fault> {
    match kind {
        RegisterKind::U16 => {
            let v = u16::try_from(value)
                .map_err(|_| Fault::validation(format!("value {value} does not fit u16")))?;
            Ok(vec![v])
        }
        RegisterKind::S16 => {
            let v = i16::try_from(value)
                .map_err(|_| Fault::validation(format!("value {value} does not fit s16")))?;
            Ok(vec![v as u16])
        }
        RegisterKind::U32 => {
            let v = u32::try_from(value)
                .map_err(|_| Fault::validation(format!("value {value} does not fit u32")))?;
            Ok(vec![(v >> 16) as u16, (v & 0xffff) as u16])
        }
        RegisterKind::Text(_) => Err(Fault::validation(
            "text field accepts no integer encode".to_string(),
        )),
        RegisterKind::Pad(_) => Err(Fault::validation(
            "padding accepts no encode".to_string(),
        )),
    }
}

/// Packs text into its fixed word count, two characters per word, high
/// byte first. Shorter text is NUL-padded; longer text is a validation
/// fault.
///
/// # Errors
///
/// Returns a validation fault for non-ASCII text or text exceeding the
/// declared width.
pub fn encode_text(text: &str, words: usize) -> Result<Vec<u16>, Fault> {
    if !text.is_ascii() {
        return Err(Fault::validation("text field must be ASCII".to_string()));
    }
    if text.len() > words * 2 {
        return Err(Fault::validation(format!(
            "text \"{text}\" exceeds {words}-word field"
        )));
    }
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(words * 2, 0);
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| (u16::from(pair[0]) << 8) | u16::from(pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed16_round_trip_over_full_range() {
        for w in [i16::MIN, -12000, -1, 0, 1, 12000, i16::MAX] {
            let encoded = encode_int(i64::from(w), RegisterKind::S16).ok();
            assert_eq!(encoded.as_deref().map(|e| decode_signed16(e[0])), Some(w));
        }
    }

    #[test]
    fn signed16_negative_wire_form() {
        assert_eq!(decode_signed16(0xffff), -1);
        assert_eq!(decode_signed16(0x8000), i16::MIN);
        assert_eq!(decode_signed16(0x7fff), i16::MAX);
    }

    #[test]
    fn unsigned_big_endian_concatenation() {
        assert_eq!(decode_unsigned(&[0x0001]), 1);
        assert_eq!(decode_unsigned(&[0x0001, 0x0000]), 0x1_0000);
        assert_eq!(decode_unsigned(&[0xffff, 0xffff]), 0xffff_ffff);
    }

    #[test]
    fn u32_round_trip() {
        let words = encode_int(0x0001_0002, RegisterKind::U32).ok();
        assert_eq!(words, Some(vec![0x0001, 0x0002]));
        assert_eq!(decode_unsigned(&[0x0001, 0x0002]), 0x0001_0002);
    }

    #[test]
    fn overflow_correction_above_midpoint_wraps_negative() {
        assert_eq!(overflow_corrected(40000), 40000 - 65536);
        assert_eq!(overflow_corrected(65535), -1);
        assert_eq!(overflow_corrected(32769), -32767);
    }

    #[test]
    fn overflow_correction_at_or_below_midpoint_is_identity() {
        assert_eq!(overflow_corrected(0), 0);
        assert_eq!(overflow_corrected(100), 100);
        assert_eq!(overflow_corrected(32768), 32768);
    }

    #[test]
    fn overflow_correction_full_wire_range_property() {
        for raw in 0..=u16::MAX as i64 {
            let corrected = overflow_corrected(raw);
            if raw > 32768 {
                assert_eq!(corrected, raw - 65536);
            } else {
                assert_eq!(corrected, raw);
            }
        }
    }

    #[test]
    fn text_decode_is_exact_width() {
        // "AB" "CD" "E\0" in three words; no terminator scanning.
        let words = [0x4142, 0x4344, 0x4500];
        assert_eq!(decode_text(&words), "ABCDE");
    }

    #[test]
    fn text_round_trip() {
        let words = encode_text("SN-01234", 5).ok();
        assert_eq!(words.as_deref().map(|w| decode_text(w)), Some("SN-01234".to_string()));
    }

    #[test]
    fn text_encode_rejects_overflow_and_non_ascii() {
        assert!(encode_text("TOO LONG FOR FIELD", 2).is_err());
        assert!(encode_text("müller", 5).is_err());
    }

    #[test]
    fn encode_rejects_out_of_range_values() {
        assert!(encode_int(70000, RegisterKind::U16).is_err());
        assert!(encode_int(-1, RegisterKind::U16).is_err());
        assert!(encode_int(40000, RegisterKind::S16).is_err());
        assert!(encode_int(-40000, RegisterKind::S16).is_err());
    }

    #[test]
    fn padding_decodes_to_nothing_and_rejects_encode() {
        assert_eq!(decode(&[0xdead, 0xbeef], RegisterKind::Pad(2)), None);
        assert!(encode_int(0, RegisterKind::Pad(2)).is_err());
    }
}
