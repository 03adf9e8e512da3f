//! nxprog-core - ISP protocol engine for NXP LPC microcontrollers
//!
//! This crate drives the ASCII In-System Programming protocol spoken by the
//! boot ROM of LPC-family parts: synchronization, device auto-detection,
//! sector erase, uuencoded RAM streaming and copy-to-flash cycles.
//!
//! The transport (serial port, Bus Pirate bridge) is pluggable through the
//! [`transport::Transport`] trait; this crate performs no I/O of its own.
//!
//! # Example
//!
//! ```ignore
//! use nxprog_core::session::IspSession;
//!
//! let mut session = IspSession::new(transport);
//! session.connect(16000, None)?;
//! session.program(image, 0, false, &mut progress)?;
//! session.start(0)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip;
pub mod error;
pub mod image;
pub mod session;
pub mod transport;
pub mod uucode;

pub use error::{Error, Result};
