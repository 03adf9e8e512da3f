//! Bank-select command implementation

use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;

/// Run the bank command: select a flash bank on dual-bank parts
pub fn run_bank(
    session: &mut IspSession<Box<dyn Transport>>,
    bank: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if session.select_bank(bank)? {
        println!("Selected flash bank {}", bank);
    } else {
        return Err(format!("chip refused to select bank {}", bank).into());
    }
    session.finalize()?;
    Ok(())
}
