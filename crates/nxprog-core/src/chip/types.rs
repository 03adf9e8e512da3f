//! Chip parameter types

/// Execution mode the CPU starts in when handed control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// Classic ARM state (lpc2xxx)
    Arm,
    /// Thumb state (Cortex-M parts)
    Thumb,
}

impl CpuMode {
    /// Mode letter as used by the `G` command
    pub fn letter(self) -> char {
        match self {
            CpuMode::Arm => 'A',
            CpuMode::Thumb => 'T',
        }
    }
}

/// Device identification word(s) returned by the `J` command
///
/// Most parts report a single word; lpc18xx parts report two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceId {
    /// Single-word ID
    Single(u32),
    /// Two-word ID (lpc18xx)
    Dual(u32, u32),
}

impl DeviceId {
    /// Whether a `J` response matches this entry
    ///
    /// Dual-word IDs match only when both words are equal; single-word IDs
    /// match when the second word is absent or zero.
    pub fn matches(&self, word0: u32, word1: Option<u32>) -> bool {
        match *self {
            DeviceId::Single(id) => word0 == id && word1.unwrap_or(0) == 0,
            DeviceId::Dual(id0, id1) => word0 == id0 && word1 == Some(id1),
        }
    }
}

/// Immutable per-CPU parameter record
///
/// Geometry and programming parameters for one supported part. Entries live
/// in the static registry; the session only ever holds `&'static ChipSpec`.
#[derive(Debug, Clone, Copy)]
pub struct ChipSpec {
    /// Canonical (lowercase) part name
    pub name: &'static str,
    /// Flash sector sizes in KiB, in address order
    pub sector_sizes: &'static [u32],
    /// Number of sectors actually present, when fewer than the table length
    pub sector_count: Option<u32>,
    /// Device ID fingerprint for auto-detection
    pub device_id: Option<DeviceId>,
    /// Flash bank base addresses; empty means a flat layout at 0
    pub flash_bank_addrs: &'static [u32],
    /// RAM staging buffer used by copy-to-flash
    pub ram_buffer_base: u32,
    /// Staging buffer size in bytes (256, 512, 1024 or 4096)
    pub ram_buffer_size: u32,
    /// Vector-table word that receives the boot checksum (5 or 7)
    pub csum_vec_index: usize,
    /// Execution mode at chip start
    pub cpu_mode: CpuMode,
}

impl ChipSpec {
    /// Number of flash sectors on this part
    pub fn sector_count(&self) -> usize {
        match self.sector_count {
            Some(n) => n as usize,
            None => self.sector_sizes.len(),
        }
    }

    /// Base address of the active flash bank (0 on flat parts)
    pub fn flash_base(&self) -> u32 {
        self.flash_bank_addrs.first().copied().unwrap_or(0)
    }

    /// Whether this part has addressable flash banks
    pub fn is_banked(&self) -> bool {
        !self.flash_bank_addrs.is_empty()
    }

    /// Map an absolute flash address to its sector index
    ///
    /// Walks the sector table from the active bank base; `None` means the
    /// address is outside the flash region and callers must treat that as
    /// fatal.
    pub fn sector_of(&self, addr: u32) -> Option<usize> {
        let mut base = self.flash_base();
        for (i, &size_kib) in self.sector_sizes.iter().enumerate() {
            let next = base + size_kib * 1024;
            if addr >= base && addr < next {
                return Some(i);
            }
            base = next;
        }
        None
    }
}
