//! Start command implementation

use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;

/// Run the start command: hand control to code already in flash
pub fn run_start(
    session: &mut IspSession<Box<dyn Transport>>,
    addr: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    session.start(addr)?;
    println!("Started execution at 0x{:08X}", addr);
    session.finalize()?;
    Ok(())
}
