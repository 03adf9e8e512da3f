//! Small argument-parsing helpers

/// Baud rates the boot ROM's auto-baud handles
const BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115_200, 230_400];

/// Parse a decimal or `0x`-prefixed hexadecimal integer
pub fn parse_int(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", s, e))
}

/// Parse and validate a baud rate
pub fn parse_baud(s: &str) -> Result<u32, String> {
    let baud = parse_int(s)?;
    if BAUD_RATES.contains(&baud) {
        Ok(baud)
    } else {
        Err(format!(
            "unsupported baud rate {} (supported: {:?})",
            baud, BAUD_RATES
        ))
    }
}
