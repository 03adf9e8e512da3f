//! Erase command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;
use std::time::Duration;

/// Run the erase command: wipe the whole part
pub fn run_erase(
    session: &mut IspSession<Box<dyn Transport>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chip = session.chip().ok_or("no chip resolved")?;
    let sectors = chip.sector_count();

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(format!(
        "Erasing all {} sectors of {} (this may take a while)...",
        sectors, chip.name
    ));
    bar.enable_steady_tick(Duration::from_millis(100));

    session.erase_all()?;

    bar.finish_with_message(format!("Erased {} sectors", sectors));
    session.finalize()?;
    Ok(())
}
