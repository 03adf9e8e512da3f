//! Image preparation: boot checksum insertion and buffer-multiple padding
//!
//! The boot ROM only considers an image valid when the first eight vector
//! words sum to zero modulo 2^32; one reserved word (5 on classic ARM parts,
//! 7 on Cortex-M) is rewritten to make that hold.

use crate::chip::ChipSpec;
use crate::error::{Error, Result};

/// Prepare a raw image for programming at `base_addr`
///
/// Inserts the vector-table checksum when the image lands at the start of a
/// flash bank (or at 0 on flat parts), then pads with 0xFF to a multiple of
/// the chip's RAM staging buffer size.
pub fn prepare(mut image: Vec<u8>, base_addr: u32, chip: &ChipSpec) -> Result<Vec<u8>> {
    let bootable = if chip.is_banked() {
        chip.flash_bank_addrs.contains(&base_addr)
    } else {
        base_addr == 0
    };
    if bootable {
        insert_checksum(&mut image, chip)?;
    }

    let rem = image.len() % chip.ram_buffer_size as usize;
    if rem != 0 {
        let pad = chip.ram_buffer_size as usize - rem;
        log::info!("padding image with {} bytes of 0xff", pad);
        image.resize(image.len() + pad, 0xff);
    }

    Ok(image)
}

/// Rewrite the reserved vector word so the first eight words sum to zero
fn insert_checksum(image: &mut [u8], chip: &ChipSpec) -> Result<()> {
    if image.len() < 32 {
        return Err(Error::InvalidImage(format!(
            "{} bytes is shorter than the vector table",
            image.len()
        )));
    }

    let k = chip.csum_vec_index;
    let mut sum = 0u32;
    for i in 0..8 {
        if i == k {
            continue;
        }
        let word = u32::from_le_bytes(image[i * 4..i * 4 + 4].try_into().unwrap());
        sum = sum.wrapping_add(word);
    }
    let csum = sum.wrapping_neg();

    log::info!("inserting vector checksum {:08x} at word {}", csum, k);
    image[k * 4..k * 4 + 4].copy_from_slice(&csum.to_le_bytes());
    Ok(())
}
