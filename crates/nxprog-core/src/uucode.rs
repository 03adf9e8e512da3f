//! Historical uuencode, reused by the NXP boot ROM as its payload framing
//!
//! Each line carries up to 45 input bytes: a length character (`32 + n`)
//! followed by one printable character per 6 input bits. Twenty lines form
//! one protocol chunk, terminated by a decimal checksum line.

use crate::error::{Error, Result};

/// Maximum payload bytes per uuencoded line
pub const LINE_SIZE: usize = 45;

/// Lines per checksummed protocol chunk
pub const LINES_PER_BLOCK: usize = 20;

/// Payload bytes per checksummed protocol chunk
pub const BLOCK_SIZE: usize = LINE_SIZE * LINES_PER_BLOCK;

/// Arithmetic sum of the raw bytes, as sent on the checksum line
pub fn checksum(data: &[u8]) -> u64 {
    data.iter().map(|&b| u64::from(b)).sum()
}

fn enc_char(v: u8) -> char {
    // zero goes out as a grave accent, never a strippable space
    if v == 0 {
        '`'
    } else {
        char::from(v + 0x20)
    }
}

fn dec_val(c: u8) -> u32 {
    u32::from(c.wrapping_sub(0x20) & 0x3f)
}

/// Encode up to [`LINE_SIZE`] bytes as one uuencoded line
///
/// # Panics
///
/// Panics if `data` is empty or longer than [`LINE_SIZE`].
pub fn encode_line(data: &[u8]) -> String {
    assert!(!data.is_empty() && data.len() <= LINE_SIZE);

    let mut out = String::with_capacity(1 + data.len().div_ceil(3) * 4);
    out.push(char::from(data.len() as u8 + 0x20));
    for chunk in data.chunks(3) {
        let mut group = [0u8; 3];
        group[..chunk.len()].copy_from_slice(chunk);
        let v =
            u32::from(group[0]) << 16 | u32::from(group[1]) << 8 | u32::from(group[2]);
        for shift in [18u32, 12, 6, 0] {
            out.push(enc_char((v >> shift) as u8 & 0x3f));
        }
    }
    out
}

/// Decode one uuencoded line
///
/// Lines longer than the declared length requires are trimmed (the chip
/// occasionally pads the final group sloppily); shorter lines are malformed.
pub fn decode_line(line: &str) -> Result<Vec<u8>> {
    let bytes = line.as_bytes();
    let &len_ch = bytes
        .first()
        .ok_or_else(|| Error::Codec("empty line".into()))?;

    let data_len = dec_val(len_ch) as usize;
    if data_len == 0 || data_len > LINE_SIZE {
        return Err(Error::Codec(format!(
            "bad length character {:?} in {:?}",
            len_ch as char, line
        )));
    }

    let encoded_len = data_len.div_ceil(3) * 4;
    if bytes.len() < 1 + encoded_len {
        return Err(Error::Codec(format!(
            "line {:?} too short for declared {} bytes",
            line, data_len
        )));
    }
    let body = &bytes[1..1 + encoded_len];

    let mut out = Vec::with_capacity(encoded_len / 4 * 3);
    for group in body.chunks_exact(4) {
        let v = group.iter().fold(0u32, |acc, &c| acc << 6 | dec_val(c));
        out.push((v >> 16) as u8);
        out.push((v >> 8) as u8);
        out.push(v as u8);
    }
    out.truncate(data_len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // classical uuencode of "Cat"
        assert_eq!(encode_line(b"Cat"), "#0V%T");
        assert_eq!(decode_line("#0V%T").unwrap(), b"Cat");
    }

    #[test]
    fn test_round_trip_partial_group() {
        for data in [&b"\x00"[..], &b"\xff\xfe"[..], &b"ISP!"[..], &[0xde; 44][..], &[0xad; 45][..]] {
            let line = encode_line(data);
            assert_eq!(decode_line(&line).unwrap(), data, "line {:?}", line);
        }
    }

    #[test]
    fn test_decode_accepts_space_and_grave_for_zero() {
        // three zero bytes encode as four zero characters in either alphabet
        assert_eq!(decode_line("#    ").unwrap(), [0, 0, 0]);
        assert_eq!(decode_line("#````").unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_decode_trims_overlong_padding() {
        let line = encode_line(b"Cat");
        let padded = format!("{}  ", line);
        assert_eq!(decode_line(&padded).unwrap(), b"Cat");
    }

    #[test]
    fn test_decode_rejects_truncated_line() {
        assert!(decode_line("#0V%").is_err());
        assert!(decode_line("").is_err());
    }

    #[test]
    fn test_checksum_is_plain_byte_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[1, 2, 3]), 6);
        assert_eq!(checksum(&[0xff; 900]), 255 * 900);
    }
}
