//! Chip parameter catalog for ISP-capable LPC parts

mod registry;
mod types;

pub use registry::{all, by_device_id, lookup, CHIPS};
pub use types::{ChipSpec, CpuMode, DeviceId};
