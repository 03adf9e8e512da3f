//! List supported CPUs

use nxprog_core::chip::{self, DeviceId};

/// Print every part in the registry
pub fn run_list_chips() {
    println!("Supported CPUs:");
    for chip in chip::all() {
        let flash_kib: u32 = chip.sector_sizes[..chip.sector_count()].iter().sum();
        let devid = match chip.device_id {
            Some(DeviceId::Single(id)) => format!("0x{:08x}", id),
            Some(DeviceId::Dual(w0, w1)) => format!("0x{:08x}/0x{:02x}", w0, w1),
            None => "-".to_owned(),
        };
        println!(
            "  {:10} {:>4} KiB flash, {:2} sectors, devid {}",
            chip.name,
            flash_kib,
            chip.sector_count(),
            devid
        );
    }
}
