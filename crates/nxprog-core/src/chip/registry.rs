//! Static catalog of supported parts
//!
//! Geometry and device IDs per CPU. Sector tables are shared per family;
//! sizes are KiB.

use super::types::{ChipSpec, CpuMode, DeviceId};

// lpc23xx/lpc24xx/lpc214x processors
const SECTORS_LPC23XX: &[u32] = &[
    4, 4, 4, 4, 4, 4, 4, 4, //
    32, 32, 32, 32, 32, 32, 32, //
    32, 32, 32, 32, 32, 32, 32, //
    4, 4, 4, 4, 4, 4,
];

// 64k lpc21xx processors (without bootsector)
const SECTORS_LPC21XX_64: &[u32] = &[8, 8, 8, 8, 8, 8, 8, 8];

// 128k lpc21xx processors (without bootsector)
const SECTORS_LPC21XX_128: &[u32] = &[8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8];

// 256k lpc21xx processors (without bootsector)
const SECTORS_LPC21XX_256: &[u32] = &[
    8, 8, 8, 8, 8, 8, 8, 8, //
    64, 64, //
    8, 8, 8, 8, 8, 8, 8,
];

// lpc17xx processors
const SECTORS_LPC17XX: &[u32] = &[
    4, 4, 4, 4, 4, 4, 4, 4, //
    4, 4, 4, 4, 4, 4, 4, 4, //
    32, 32, 32, 32, 32, 32, 32, //
    32, 32, 32, 32, 32, 32, 32,
];

// lpc11xx processors
const SECTORS_LPC11XX: &[u32] = &[4, 4, 4, 4, 4, 4, 4, 4];

// lpc18xx processors
const SECTORS_LPC18XX: &[u32] = &[8, 8, 8, 8, 8, 8, 8, 8, 64, 64, 64, 64, 64, 64, 64];

const LPC18XX_BANKS: &[u32] = &[0x1a00_0000, 0x1b00_0000];

/// Field defaults shared by every entry
const BASE: ChipSpec = ChipSpec {
    name: "",
    sector_sizes: SECTORS_LPC23XX,
    sector_count: None,
    device_id: None,
    flash_bank_addrs: &[],
    ram_buffer_base: 0x4000_1000,
    ram_buffer_size: 4096,
    csum_vec_index: 5,
    cpu_mode: CpuMode::Arm,
};

const fn lpc17xx(name: &'static str, devid: u32) -> ChipSpec {
    ChipSpec {
        name,
        sector_sizes: SECTORS_LPC17XX,
        device_id: Some(DeviceId::Single(devid)),
        ram_buffer_base: 0x1000_1000,
        csum_vec_index: 7,
        cpu_mode: CpuMode::Thumb,
        ..BASE
    }
}

const fn lpc18xx(name: &'static str, devid: Option<DeviceId>) -> ChipSpec {
    ChipSpec {
        name,
        sector_sizes: SECTORS_LPC18XX,
        device_id: devid,
        flash_bank_addrs: LPC18XX_BANKS,
        ram_buffer_base: 0x1008_1000,
        csum_vec_index: 7,
        cpu_mode: CpuMode::Thumb,
        ..BASE
    }
}

/// Every part the programmer knows about
pub static CHIPS: &[ChipSpec] = &[
    // 128k flash
    ChipSpec {
        name: "lpc2364",
        sector_count: Some(11),
        device_id: Some(DeviceId::Single(369162498)),
        ..BASE
    },
    // 256k flash
    ChipSpec {
        name: "lpc2365",
        sector_count: Some(15),
        device_id: Some(DeviceId::Single(369158179)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2366",
        sector_count: Some(15),
        device_id: Some(DeviceId::Single(369162531)),
        ..BASE
    },
    // 512k flash
    ChipSpec {
        name: "lpc2367",
        device_id: Some(DeviceId::Single(369158181)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2368",
        device_id: Some(DeviceId::Single(369162533)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2377",
        device_id: Some(DeviceId::Single(385935397)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2378",
        device_id: Some(DeviceId::Single(385940773)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2387",
        device_id: Some(DeviceId::Single(402716981)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2388",
        device_id: Some(DeviceId::Single(402718517)),
        ..BASE
    },
    // lpc21xx; the 214x parts share the 23xx sector layout
    ChipSpec {
        name: "lpc2141",
        sector_count: Some(8),
        device_id: Some(DeviceId::Single(196353)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2142",
        sector_count: Some(9),
        device_id: Some(DeviceId::Single(196369)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2144",
        sector_count: Some(11),
        device_id: Some(DeviceId::Single(196370)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2146",
        sector_count: Some(15),
        device_id: Some(DeviceId::Single(196387)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2148",
        sector_count: Some(27),
        device_id: Some(DeviceId::Single(196389)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2109",
        sector_sizes: SECTORS_LPC21XX_64,
        device_id: Some(DeviceId::Single(33685249)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2119",
        sector_sizes: SECTORS_LPC21XX_128,
        device_id: Some(DeviceId::Single(33685266)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2129",
        sector_sizes: SECTORS_LPC21XX_256,
        device_id: Some(DeviceId::Single(33685267)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2114",
        sector_sizes: SECTORS_LPC21XX_128,
        device_id: Some(DeviceId::Single(16908050)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2124",
        sector_sizes: SECTORS_LPC21XX_256,
        device_id: Some(DeviceId::Single(16908051)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2194",
        sector_sizes: SECTORS_LPC21XX_256,
        device_id: Some(DeviceId::Single(50462483)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2292",
        sector_sizes: SECTORS_LPC21XX_256,
        device_id: Some(DeviceId::Single(67239699)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2294",
        sector_sizes: SECTORS_LPC21XX_256,
        device_id: Some(DeviceId::Single(84016915)),
        ..BASE
    },
    // lpc22xx have no readable device id
    ChipSpec {
        name: "lpc2212",
        sector_sizes: SECTORS_LPC21XX_128,
        ..BASE
    },
    ChipSpec {
        name: "lpc2214",
        sector_sizes: SECTORS_LPC21XX_256,
        ..BASE
    },
    // lpc24xx
    ChipSpec {
        name: "lpc2458",
        device_id: Some(DeviceId::Single(352386869)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2468",
        device_id: Some(DeviceId::Single(369164085)),
        ..BASE
    },
    ChipSpec {
        name: "lpc2478",
        device_id: Some(DeviceId::Single(386006837)),
        ..BASE
    },
    // lpc17xx
    lpc17xx("lpc1768", 0x26013f37),
    lpc17xx("lpc1766", 0x26013f33),
    lpc17xx("lpc1765", 0x26013733),
    lpc17xx("lpc1764", 0x26011922),
    lpc17xx("lpc1758", 0x26013f34),
    lpc17xx("lpc1756", 0x26011723),
    lpc17xx("lpc1754", 0x26011722),
    lpc17xx("lpc1752", 0x26001121),
    lpc17xx("lpc1751", 0x26001110),
    ChipSpec {
        name: "lpc1114",
        sector_sizes: SECTORS_LPC11XX,
        device_id: Some(DeviceId::Single(0x0444102b)),
        ram_buffer_base: 0x1000_0400,
        ram_buffer_size: 1024,
        ..BASE
    },
    // lpc18xx
    lpc18xx("lpc1817", Some(DeviceId::Dual(0xf001db3f, 0))),
    ChipSpec {
        flash_bank_addrs: &[0x1a00_0000],
        ..lpc18xx("lpc1832", None)
    },
    ChipSpec {
        sector_count: Some(11),
        ..lpc18xx("lpc1833", Some(DeviceId::Dual(0xf001da30, 0x44)))
    },
    lpc18xx("lpc1837", Some(DeviceId::Dual(0xf001da30, 0))),
    ChipSpec {
        sector_count: Some(11),
        ..lpc18xx("lpc1853", Some(DeviceId::Dual(0xf001d830, 0)))
    },
    lpc18xx("lpc1857", Some(DeviceId::Dual(0xf001d830, 0x44))),
];

/// Look up a chip by name, case-insensitively
pub fn lookup(name: &str) -> Option<&'static ChipSpec> {
    CHIPS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Look up a chip by its device ID word(s)
pub fn by_device_id(word0: u32, word1: Option<u32>) -> Option<&'static ChipSpec> {
    CHIPS
        .iter()
        .find(|c| c.device_id.is_some_and(|id| id.matches(word0, word1)))
}

/// Iterate over every catalog entry
pub fn all() -> impl Iterator<Item = &'static ChipSpec> {
    CHIPS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("lpc1768").unwrap().name, "lpc1768");
        assert_eq!(lookup("LPC1768").unwrap().name, "lpc1768");
        assert!(lookup("lpc9999").is_none());
    }

    #[test]
    fn test_autodetect_lpc1768() {
        // 637926199 == 0x26013f37
        let chip = by_device_id(637926199, None).unwrap();
        assert_eq!(chip.name, "lpc1768");
        assert_eq!(chip.ram_buffer_base, 0x1000_1000);
        assert_eq!(chip.csum_vec_index, 7);
        assert_eq!(chip.cpu_mode, CpuMode::Thumb);
    }

    #[test]
    fn test_autodetect_dual_word() {
        assert_eq!(by_device_id(0xf001da30, Some(0x44)).unwrap().name, "lpc1833");
        assert_eq!(by_device_id(0xf001da30, Some(0)).unwrap().name, "lpc1837");
        assert_eq!(by_device_id(0xf001d830, Some(0x44)).unwrap().name, "lpc1857");
        assert!(by_device_id(0xf001da30, Some(0x99)).is_none());
    }

    #[test]
    fn test_sector_lookup_lpc17xx() {
        let chip = lookup("lpc1768").unwrap();
        // first 16 sectors are 4 KiB; 0x4000 starts sector 4
        assert_eq!(chip.sector_of(0x0000), Some(0));
        assert_eq!(chip.sector_of(0x4000), Some(4));
        assert_eq!(chip.sector_of(0x0fff), Some(0));
        // 64 KiB onwards the sectors are 32 KiB
        assert_eq!(chip.sector_of(0x10000), Some(16));
        assert_eq!(chip.sector_of(0x7ffff), Some(29));
        assert_eq!(chip.sector_of(0x80000), None);
    }

    #[test]
    fn test_sector_lookup_banked() {
        let chip = lookup("lpc1837").unwrap();
        assert_eq!(chip.sector_of(0), None);
        assert_eq!(chip.sector_of(0x1a00_0000), Some(0));
        assert_eq!(chip.sector_of(0x1a00_2000), Some(1));
        assert_eq!(chip.sector_of(0x1a01_0000), Some(8));
    }

    #[test]
    fn test_geometry_invariants() {
        for chip in all() {
            // dense indices: the base of the table maps to sector 0 and the
            // last byte of the populated region to sector_count - 1
            let base = chip.flash_base();
            assert_eq!(chip.sector_of(base), Some(0), "{}", chip.name);

            let count = chip.sector_count();
            assert!(count >= 1 && count <= chip.sector_sizes.len(), "{}", chip.name);
            let populated: u32 = chip.sector_sizes[..count].iter().map(|s| s * 1024).sum();
            assert_eq!(
                chip.sector_of(base + populated - 1),
                Some(count - 1),
                "{}",
                chip.name
            );

            // monotone non-decreasing over every sector boundary
            let mut addr = base;
            let mut prev = 0usize;
            for &size in chip.sector_sizes {
                let idx = chip.sector_of(addr).unwrap();
                assert!(idx >= prev, "{}", chip.name);
                prev = idx;
                addr += size * 1024;
            }
            assert_eq!(chip.sector_of(addr), None, "{}", chip.name);
        }
    }

    #[test]
    fn test_ram_buffer_sizes_are_legal() {
        for chip in all() {
            assert!(
                matches!(chip.ram_buffer_size, 256 | 512 | 1024 | 4096),
                "{}",
                chip.name
            );
            assert!(
                matches!(chip.csum_vec_index, 5 | 7),
                "{}",
                chip.name
            );
        }
    }
}
