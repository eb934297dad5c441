//! Fixed-width Crockford base32 codec for 64-bit IDs.
//!
//! A `u64` encodes to exactly [`ENCODED_LEN`] characters (13 × 5 = 65 bits;
//! the top two encoded bits are always zero for 63-bit IDs). Encoding is
//! big-endian over 5-bit groups, so lexicographic order of the encoded
//! strings equals numeric order of the source integers.

use crate::{Error, Result};

/// Width of every encoded ID, in characters.
pub const ENCODED_LEN: usize = 13;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NO_VALUE: u8 = 255;
const BITS_PER_CHAR: u32 = 5;

/// Decode table: canonical alphabet, lowercase, and the Crockford aliases
/// O/o -> 0 and I/i/L/l -> 1.
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    while i < 32 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    lut[b'O' as usize] = 0;
    lut[b'o' as usize] = 0;
    lut[b'I' as usize] = 1;
    lut[b'i' as usize] = 1;
    lut[b'L' as usize] = 1;
    lut[b'l' as usize] = 1;
    lut
};

/// Encodes `value` as a fixed 13-character Crockford base32 array.
pub(crate) fn encode_u64(value: u64) -> [u8; ENCODED_LEN] {
    let mut buf = [0_u8; ENCODED_LEN];
    for (i, slot) in buf.iter_mut().enumerate() {
        // shift is 60 for the first character, which therefore carries
        // only the top 4 payload bits (64 - 12 * 5)
        let shift = BITS_PER_CHAR * (ENCODED_LEN as u32 - 1 - i as u32);
        let group = (value >> shift) & 0x1F;
        *slot = ALPHABET[group as usize];
    }
    buf
}

/// Decodes a fixed 13-character Crockford base32 string.
///
/// Accepts lowercase input and the Crockford aliases. The first character
/// carries only 4 payload bits, so values above `F` there encode a 65th
/// bit no `u64` produced; such strings are rejected rather than aliased to
/// a truncated value.
pub(crate) fn decode_u64(encoded: &str) -> Result<u64> {
    if encoded.len() != ENCODED_LEN {
        return Err(Error::FriendlyIdLength {
            expected: ENCODED_LEN,
            actual: encoded.len(),
        });
    }
    let mut acc = 0_u64;
    for (index, byte) in encoded.bytes().enumerate() {
        let val = LOOKUP[byte as usize];
        if val == NO_VALUE || (index == 0 && val > 0x0F) {
            return Err(Error::FriendlyIdByte { byte, index });
        }
        acc = (acc << BITS_PER_CHAR) | u64::from(val);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: u64) {
        let buf = encode_u64(value);
        let s = core::str::from_utf8(&buf).unwrap();
        assert_eq!(decode_u64(s).unwrap(), value, "roundtrip of {value} via {s}");
    }

    #[test]
    fn encode_decode_preserves_values() {
        for value in [0, 1, 42, (1 << 53) - 1, (1 << 63) - 1, 0x1234_5678_90AB_CDEF] {
            roundtrip(value);
        }
    }

    #[test]
    fn zero_encodes_to_all_zero_characters() {
        assert_eq!(&encode_u64(0), b"0000000000000");
        assert_eq!(&encode_u64(1), b"0000000000001");
    }

    #[test]
    fn encoding_is_lexically_monotonic() {
        let values = [0_u64, 1, 31, 32, 4095, 1 << 22, (1 << 41) - 1, (1 << 62) + 7];
        let mut encoded: Vec<String> = values
            .iter()
            .map(|v| String::from_utf8(encode_u64(*v).to_vec()).unwrap())
            .collect();
        let sorted = encoded.clone();
        encoded.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn decode_accepts_lowercase_and_aliases() {
        let canonical = decode_u64("0000000000ABC").unwrap();
        assert_eq!(decode_u64("0000000000abc").unwrap(), canonical);

        let zero = decode_u64("0000000000000").unwrap();
        assert_eq!(decode_u64("000000000000O").unwrap(), zero);
        assert_eq!(decode_u64("000000000000o").unwrap(), zero);

        let one = decode_u64("0000000000001").unwrap();
        assert_eq!(decode_u64("000000000000I").unwrap(), one);
        assert_eq!(decode_u64("000000000000L").unwrap(), one);
        assert_eq!(decode_u64("000000000000l").unwrap(), one);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(
            decode_u64("123").unwrap_err(),
            Error::FriendlyIdLength {
                expected: ENCODED_LEN,
                actual: 3
            }
        );
    }

    #[test]
    fn decode_rejects_invalid_byte() {
        assert_eq!(
            decode_u64("000000000000!").unwrap_err(),
            Error::FriendlyIdByte {
                byte: b'!',
                index: 12
            }
        );
        // 'U' is deliberately absent from the Crockford alphabet
        assert!(matches!(
            decode_u64("U000000000000").unwrap_err(),
            Error::FriendlyIdByte { byte: b'U', index: 0 }
        ));
    }

    #[test]
    fn decode_rejects_a_65th_bit_in_the_first_character() {
        // 'G' is value 16: its single payload bit falls outside a u64, so
        // accepting it would alias the string to all-zero
        assert_eq!(
            decode_u64("G000000000000").unwrap_err(),
            Error::FriendlyIdByte {
                byte: b'G',
                index: 0
            }
        );
        assert_eq!(
            decode_u64("g000000000000").unwrap_err(),
            Error::FriendlyIdByte {
                byte: b'g',
                index: 0
            }
        );
        // 'F' (value 15) is the largest first character the encoder emits
        assert_eq!(decode_u64("F000000000000").unwrap(), 0xF << 60);
        // past the first character the full alphabet stays legal
        assert!(decode_u64("0G00000000000").is_ok());
    }
}
