//! # Variable-Length Integer Encoding
//!
//! Lengths inside record payloads and undo records (text/blob lengths, array
//! element counts, update-vector sizes) are written as varints. The scheme
//! uses a leading marker byte that says how many bytes follow:
//!
//! | Value Range              | Bytes | Format                          |
//! |--------------------------|-------|---------------------------------|
//! | 0 - 240                  | 1     | `[value]`                       |
//! | 241 - 2287               | 2     | `[241 + (v-240)>>8, (v-240)&FF]`|
//! | 2288 - 67823             | 3     | `[249, (v-2288)>>8, (v-2288)&FF]`|
//! | 67824 - 16777215         | 4     | `[250, v>>16, v>>8, v]`         |
//! | 16777216 - 4294967295    | 5     | `[251, v>>24, v>>16, v>>8, v]`  |
//! | 4294967296 - u64::MAX    | 9     | `[255, 8-byte big-endian]`      |
//!
//! Markers 252-254 are invalid. `decode_varint` rejects them together with
//! truncated encodings, so malformed undo bytes surface as errors rather
//! than panics.

use eyre::{bail, ensure, Result};

/// Longest possible encoding.
pub const MAX_VARINT_LEN: usize = 9;

pub fn varint_len(value: u64) -> usize {
    match value {
        0..=240 => 1,
        241..=2287 => 2,
        2288..=67823 => 3,
        67824..=0xFF_FFFF => 4,
        0x100_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Appends the varint encoding of `value` to `out`.
pub fn put_varint(value: u64, out: &mut Vec<u8>) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

pub fn encode_varint(value: u64, buf: &mut [u8]) -> usize {
    match varint_len(value) {
        1 => {
            buf[0] = value as u8;
        }
        2 => {
            let v = value - 240;
            buf[0] = ((v >> 8) + 241) as u8;
            buf[1] = v as u8;
        }
        3 => {
            let v = value - 2288;
            buf[0] = 249;
            buf[1] = (v >> 8) as u8;
            buf[2] = v as u8;
        }
        4 => {
            buf[0] = 250;
            buf[1..4].copy_from_slice(&value.to_be_bytes()[5..8]);
        }
        5 => {
            buf[0] = 251;
            buf[1..5].copy_from_slice(&value.to_be_bytes()[4..8]);
        }
        _ => {
            buf[0] = 255;
            buf[1..9].copy_from_slice(&value.to_be_bytes());
        }
    }
    varint_len(value)
}

/// Decodes a varint from the front of `buf`, returning `(value, bytes_read)`.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");

    let first = buf[0];
    let width = match first {
        0..=240 => return Ok((first as u64, 1)),
        241..=248 => 2,
        249 => 3,
        250 => 4,
        251 => 5,
        255 => 9,
        _ => bail!("invalid varint marker: {}", first),
    };
    ensure!(buf.len() >= width, "truncated {}-byte varint", width);

    let value = match first {
        241..=248 => 240 + ((first as u64 - 241) << 8) + buf[1] as u64,
        249 => 2288 + ((buf[1] as u64) << 8) + buf[2] as u64,
        _ => buf[1..width]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64),
    };
    Ok((value, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_use_expected_widths() {
        for (value, len) in [
            (0u64, 1usize),
            (240, 1),
            (241, 2),
            (2287, 2),
            (2288, 3),
            (67823, 3),
            (67824, 4),
            (0xFF_FFFF, 4),
            (0x100_0000, 5),
            (0xFFFF_FFFF, 5),
            (0x1_0000_0000, 9),
            (u64::MAX, 9),
        ] {
            assert_eq!(varint_len(value), len, "len of {}", value);
            let mut out = Vec::new();
            put_varint(value, &mut out);
            assert_eq!(out.len(), len);
            assert_eq!(decode_varint(&out).unwrap(), (value, len));
        }
    }

    #[test]
    fn two_byte_layout_matches_marker_scheme() {
        let mut buf = [0u8; 9];
        assert_eq!(encode_varint(2287, &mut buf), 2);
        assert_eq!(&buf[..2], &[248, 255]);
    }

    #[test]
    fn decode_rejects_reserved_markers() {
        for marker in 252u8..=254 {
            assert!(decode_varint(&[marker, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        }
    }

    #[test]
    fn decode_rejects_truncated_input() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[241]).is_err());
        assert!(decode_varint(&[249, 0]).is_err());
        assert!(decode_varint(&[255, 0, 0, 0]).is_err());
    }
}
