//! Image file loading
//!
//! The ISP core only ever sees `(base_address, bytes)`; raw binaries carry
//! their base on the command line and Intel HEX files are flattened here.

use std::fs;
use std::path::Path;

use crate::cli::FileType;

/// Load an image file as `(base_address, bytes)`
pub fn load(
    path: &Path,
    filetype: FileType,
    base_addr: u32,
) -> Result<(u32, Vec<u8>), Box<dyn std::error::Error>> {
    match filetype {
        FileType::Bin => Ok((base_addr, fs::read(path)?)),
        FileType::Ihex => {
            let text = fs::read_to_string(path)?;
            flatten_ihex(&text)
        }
    }
}

/// Flatten Intel HEX records into one contiguous image
///
/// Gaps between records are filled with 0xFF, the same filler the flash
/// erases to. The lowest record address becomes the image base.
fn flatten_ihex(text: &str) -> Result<(u32, Vec<u8>), Box<dyn std::error::Error>> {
    use ihex::Record;

    let mut segments: Vec<(u32, Vec<u8>)> = Vec::new();
    let mut upper: u32 = 0;

    for record in ihex::Reader::new(text) {
        match record? {
            Record::Data { offset, value } => {
                segments.push((upper + u32::from(offset), value));
            }
            Record::ExtendedLinearAddress(hi) => upper = u32::from(hi) << 16,
            Record::ExtendedSegmentAddress(seg) => upper = u32::from(seg) << 4,
            Record::EndOfFile => break,
            Record::StartLinearAddress(_) | Record::StartSegmentAddress { .. } => {}
        }
    }

    if segments.is_empty() {
        return Err("no data records in hex file".into());
    }

    let base = segments.iter().map(|(addr, _)| *addr).min().unwrap();
    let end = segments
        .iter()
        .map(|(addr, data)| addr + data.len() as u32)
        .max()
        .unwrap();

    let mut image = vec![0xff; (end - base) as usize];
    for (addr, data) in &segments {
        let offset = (addr - base) as usize;
        image[offset..offset + data.len()].copy_from_slice(data);
    }

    Ok((base, image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_contiguous() {
        let hex = ":0400000001020304F2\n:00000001FF\n";
        let (base, image) = flatten_ihex(hex).unwrap();
        assert_eq!(base, 0);
        assert_eq!(image, [1, 2, 3, 4]);
    }

    #[test]
    fn test_flatten_fills_gaps_with_ff() {
        let hex = ":0400000001020304F2\n:02001000AABB89\n:00000001FF\n";
        let (base, image) = flatten_ihex(hex).unwrap();
        assert_eq!(base, 0);
        assert_eq!(image.len(), 0x12);
        assert_eq!(&image[..4], [1, 2, 3, 4]);
        assert!(image[4..0x10].iter().all(|&b| b == 0xff));
        assert_eq!(&image[0x10..], [0xaa, 0xbb]);
    }

    #[test]
    fn test_flatten_extended_linear_address() {
        let hex = ":02000004100AE0\n:02000000DEAD73\n:00000001FF\n";
        let (base, image) = flatten_ihex(hex).unwrap();
        assert_eq!(base, 0x100a_0000);
        assert_eq!(image, [0xde, 0xad]);
    }

    #[test]
    fn test_flatten_empty_file_is_an_error() {
        assert!(flatten_ihex(":00000001FF\n").is_err());
    }
}
