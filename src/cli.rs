//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::util::{parse_baud, parse_int};

#[derive(Parser)]
#[command(name = "nxprog")]
#[command(author, version, about = "ISP programmer for NXP LPC microcontrollers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Programmer backend
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Programmer {
    /// Direct serial port
    Serial,
    /// Bus Pirate in UART bridge mode
    Buspirate,
}

/// Image file format
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FileType {
    /// Raw binary, loaded at --addr
    Bin,
    /// Intel HEX, load address taken from the records
    Ihex,
}

/// Connection options shared by every command that talks to a chip
#[derive(clap::Args, Debug)]
pub struct ConnectArgs {
    /// Serial device (e.g. /dev/ttyUSB0)
    pub port: String,

    /// Programmer to use
    #[arg(short, long, value_enum, default_value_t = Programmer::Serial)]
    pub programmer: Programmer,

    /// Baud rate
    #[arg(long, default_value = "115200", value_parser = parse_baud)]
    pub baud: u32,

    /// CPU name; auto-detected from the device ID when omitted
    #[arg(long)]
    pub cpu: Option<String>,

    /// Crystal frequency in kHz
    #[arg(long, default_value_t = 16000)]
    pub oscfreq: u32,

    /// Use RTS/DTR to reset the chip into ISP mode
    #[arg(long)]
    pub control: bool,

    /// Enable XON/XOFF flow control
    #[arg(long)]
    pub xonxoff: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Program an image into flash and start it
    Flash {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Image file
        image: PathBuf,

        /// Image file format
        #[arg(long, value_enum, default_value_t = FileType::Bin)]
        filetype: FileType,

        /// Base address for raw binaries (decimal or 0x hex)
        #[arg(long, default_value = "0", value_parser = parse_int)]
        addr: u32,

        /// Erase the whole part, not just the range being written
        #[arg(long)]
        eraseall: bool,
    },

    /// Erase the entire flash
    Erase {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Read flash contents
    Read {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Start address (decimal or 0x hex)
        #[arg(long, default_value = "0", value_parser = parse_int)]
        addr: u32,

        /// Number of bytes to read (decimal or 0x hex, multiple of 4)
        #[arg(long, value_parser = parse_int)]
        length: u32,

        /// Output file; raw bytes go to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start execution without programming
    Start {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Address to start at (decimal or 0x hex)
        #[arg(long, default_value = "0", value_parser = parse_int)]
        addr: u32,
    },

    /// Select a flash bank on dual-bank parts
    Bank {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Bank to select
        bank: u32,
    },

    /// Read the device serial number
    SerialNumber {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// List supported CPUs
    ListChips,
}
