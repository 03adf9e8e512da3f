//! Read command implementation

use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Run the read command: dump flash to a file or stdout
pub fn run_read(
    session: &mut IspSession<Box<dyn Transport>>,
    addr: u32,
    length: u32,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("reading {} bytes from 0x{:08x}", length, addr);
    let data = session.read_block(addr, length)?;

    match output {
        Some(path) => {
            fs::write(path, &data)?;
            println!("Read {} bytes from 0x{:08X} into {}", data.len(), addr, path.display());
        }
        None => {
            std::io::stdout().write_all(&data)?;
        }
    }

    session.finalize()?;
    Ok(())
}
