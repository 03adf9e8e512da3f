//! Flash command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nxprog_core::session::{IspSession, ProgramProgress};
use nxprog_core::transport::Transport;
use std::time::Duration;

/// Progress reporter using indicatif
struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    fn new() -> Self {
        Self { bar: None }
    }

    fn finish(&mut self, message: &'static str) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(message);
        }
    }
}

impl ProgramProgress for IndicatifProgress {
    fn erasing(&mut self, first_sector: usize, last_sector: usize) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!(
            "Erasing sectors {}-{} (this may take a while)...",
            first_sector, last_sector
        ));
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    fn writing(&mut self, total: usize) {
        self.finish("Erase complete");
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) Writing")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(bar);
    }

    fn write_progress(&mut self, done: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn complete(&mut self) {
        self.finish("Write complete");
    }
}

/// Run the flash command: program the image, then start it
pub fn run_flash(
    session: &mut IspSession<Box<dyn Transport>>,
    image: Vec<u8>,
    base_addr: u32,
    erase_all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let chip = session.chip().ok_or("no chip resolved")?;

    println!(
        "Programming {} bytes at 0x{:08X} into {}",
        image.len(),
        base_addr,
        chip.name
    );

    let mut progress = IndicatifProgress::new();
    session.program(image, base_addr, erase_all, &mut progress)?;

    session.start(base_addr)?;
    println!("Started execution at 0x{:08X}", base_addr);

    session.finalize()?;
    Ok(())
}
