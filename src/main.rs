//! nxprog - ISP programmer for NXP LPC microcontrollers
//!
//! Talks the boot ROM's ASCII ISP protocol over a serial port or a Bus
//! Pirate bridge to program, erase, read and start LPC-family parts.

mod cli;
mod commands;
mod imagefile;
mod util;

use clap::Parser;
use cli::{Cli, Commands, ConnectArgs, Programmer};
use nxprog_buspirate::BusPirateTransport;
use nxprog_core::session::IspSession;
use nxprog_core::transport::Transport;
use nxprog_serial::SerialTransport;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Flash {
            connect,
            image,
            filetype,
            addr,
            eraseall,
        } => {
            let (base_addr, data) = imagefile::load(&image, filetype, addr)?;
            log::info!("loaded {} bytes from {}", data.len(), image.display());
            let mut session = connect_session(&connect)?;
            commands::flash::run_flash(&mut session, data, base_addr, eraseall)
        }
        Commands::Erase { connect } => {
            let mut session = connect_session(&connect)?;
            commands::erase::run_erase(&mut session)
        }
        Commands::Read {
            connect,
            addr,
            length,
            output,
        } => {
            let mut session = connect_session(&connect)?;
            commands::read::run_read(&mut session, addr, length, output.as_deref())
        }
        Commands::Start { connect, addr } => {
            let mut session = connect_session(&connect)?;
            commands::start::run_start(&mut session, addr)
        }
        Commands::Bank { connect, bank } => {
            let mut session = connect_session(&connect)?;
            commands::bank::run_bank(&mut session, bank)
        }
        Commands::SerialNumber { connect } => {
            let mut session = connect_session(&connect)?;
            commands::serial_number::run_serial_number(&mut session)
        }
        Commands::ListChips => {
            commands::list::run_list_chips();
            Ok(())
        }
    }
}

/// Open the requested transport, drop the chip into ISP mode, and sync
fn connect_session(
    args: &ConnectArgs,
) -> Result<IspSession<Box<dyn Transport>>, Box<dyn std::error::Error>> {
    let mut transport: Box<dyn Transport> = match args.programmer {
        Programmer::Serial => Box::new(SerialTransport::open(
            &args.port,
            args.baud,
            args.xonxoff,
            args.control,
        )?),
        Programmer::Buspirate => Box::new(BusPirateTransport::open(&args.port)?),
    };

    transport.init()?;
    transport.enter_isp()?;
    transport.post_isp()?;

    log::info!(
        "cpu={} oscfreq={} baud={}",
        args.cpu.as_deref().unwrap_or("autodetect"),
        args.oscfreq,
        args.baud
    );

    let mut session = IspSession::new(transport);
    session.connect(args.oscfreq, args.cpu.as_deref())?;
    Ok(session)
}
