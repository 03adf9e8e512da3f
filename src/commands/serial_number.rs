//! Serial-number command implementation

use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;

/// Run the serial-number command
pub fn run_serial_number(
    session: &mut IspSession<Box<dyn Transport>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let words = session.get_serial_number()?;
    println!(
        "Serial number: {:08X} {:08X} {:08X} {:08X}",
        words[0], words[1], words[2], words[3]
    );
    session.finalize()?;
    Ok(())
}
