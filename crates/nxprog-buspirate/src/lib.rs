//! Bus Pirate UART-bridge transport
//!
//! Drives a Bus Pirate in binary scripting mode: enter BBIO, switch to the
//! UART peripheral, power the target and sequence its RESET (AUX) and ISP
//! (CS) pins, then drop into transparent bridge mode so the ISP session can
//! talk straight through. Bridge mode is one-way; the Bus Pirate needs a
//! replug afterwards.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use nxprog_core::error::{Error, Result};
use nxprog_core::transport::Transport;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const PIN_HOLD: Duration = Duration::from_millis(100);

// binary-mode UART peripheral commands
const BBIO_RESET: u8 = 0x0f;
const MODE_UART: u8 = 0x03;
const UART_START_ECHO: u8 = 0b0000_0010;
const UART_BRIDGE: u8 = 0b0000_1111;
const UART_BULK: u8 = 0b0001_0000;
const UART_SPEED: u8 = 0b0110_0000;
const UART_CONFIG: u8 = 0b1000_0000;
const UART_PINSET: u8 = 0b0100_0000;

const BAUD_115200: u8 = 0b1001;
// w=1 selects 3.3 V push-pull output
const CONFIG_3V3: u8 = 0b1_0000;

// UART peripheral pin bits (wxyz: power, pull-ups, AUX, CS)
const PIN_POWER: u8 = 0b1000;
const PIN_PULLUP: u8 = 0b0100;
const PIN_AUX: u8 = 0b0010; // wired to RESET
const PIN_CS: u8 = 0b0001; // wired to the ISP-entry pin

/// Largest payload of one binary-mode bulk UART write (4-bit count field)
const BULK_MAX: usize = 16;

fn transport_err(e: serialport::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Bus Pirate transport
pub struct BusPirateTransport {
    port: Box<dyn SerialPort>,
    pinstate: u8,
    bridged: bool,
}

impl BusPirateTransport {
    /// Open the Bus Pirate on `device`
    ///
    /// The Bus Pirate console always runs at 115200 regardless of the
    /// target baud rate; the bridged UART is configured separately.
    pub fn open(device: &str) -> Result<Self> {
        let port = serialport::new(device, 115_200)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DEFAULT_TIMEOUT)
            .open()
            .map_err(transport_err)?;

        log::info!("opened Bus Pirate on {}", device);

        Ok(Self {
            port,
            pinstate: 0,
            bridged: false,
        })
    }

    fn raw_write(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        let _ = self.read_raw(256, Duration::from_millis(100))?;
        Ok(())
    }

    fn read_raw(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let old = self.port.timeout();
        self.port.set_timeout(timeout).map_err(transport_err)?;

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        let outcome = loop {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    filled += n;
                    if filled == len {
                        break Ok(());
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break Ok(()),
                Err(e) => break Err(Error::Io(e)),
            }
        };

        self.port.set_timeout(old).map_err(transport_err)?;
        outcome?;
        buf.truncate(filled);
        Ok(buf)
    }

    /// Set or clear pins in `mask` and let the Bus Pirate acknowledge
    fn set_pins(&mut self, mask: u8, level: bool) -> Result<()> {
        if level {
            self.pinstate |= mask;
        } else {
            self.pinstate &= !mask;
        }
        self.raw_write(&[UART_PINSET | self.pinstate])?;
        let reply = self.read_raw(1, DEFAULT_TIMEOUT)?;
        if reply.first() != Some(&1) {
            return Err(Error::Transport(format!(
                "Bus Pirate rejected pin state {:#04x}",
                self.pinstate
            )));
        }
        Ok(())
    }

    /// One binary-mode bulk UART write of at most [`BULK_MAX`] bytes
    fn bulk_write(&mut self, data: &[u8]) -> Result<()> {
        debug_assert!(!data.is_empty() && data.len() <= BULK_MAX);
        let mut frame = Vec::with_capacity(1 + data.len());
        frame.push(UART_BULK | (data.len() as u8 - 1));
        frame.extend_from_slice(data);
        self.raw_write(&frame)?;
        // one ack for the command plus one per byte
        let _ = self.read_raw(data.len() + 1, DEFAULT_TIMEOUT)?;
        Ok(())
    }
}

impl Transport for BusPirateTransport {
    fn init(&mut self) -> Result<()> {
        self.drain()?;
        // knock it out of any previous binary mode and any console menu
        self.raw_write(&[BBIO_RESET])?;
        self.raw_write(b"\n\n")?;
        thread::sleep(PIN_HOLD);
        self.drain()?;

        self.raw_write(&[0u8; 20])?;
        let banner = self.read_raw(5, DEFAULT_TIMEOUT)?;
        if !banner.windows(4).any(|w| w == b"BBIO") {
            return Err(Error::Transport("Bus Pirate not responding".into()));
        }
        log::info!(
            "Bus Pirate in binary mode v{}",
            char::from(*banner.last().unwrap_or(&b'?'))
        );

        self.raw_write(&[MODE_UART])?;
        let banner = self.read_raw(4, DEFAULT_TIMEOUT)?;
        if !banner.windows(3).any(|w| w == b"ART") {
            return Err(Error::Transport("Bus Pirate refused UART mode".into()));
        }
        log::info!(
            "Bus Pirate in UART mode v{}",
            char::from(*banner.last().unwrap_or(&b'?'))
        );

        self.raw_write(&[UART_SPEED | BAUD_115200])?;
        let _ = self.read_raw(1, DEFAULT_TIMEOUT)?;
        self.raw_write(&[UART_CONFIG | CONFIG_3V3])?;
        let _ = self.read_raw(1, DEFAULT_TIMEOUT)?;

        self.set_pins(PIN_PULLUP, true)?;
        self.set_pins(PIN_POWER, true)?;
        self.set_pins(PIN_AUX | PIN_CS, true)?;
        Ok(())
    }

    fn enter_isp(&mut self) -> Result<()> {
        self.set_pins(PIN_AUX | PIN_CS, false)?;
        thread::sleep(PIN_HOLD);
        self.set_pins(PIN_AUX, true)?;
        thread::sleep(PIN_HOLD);
        self.set_pins(PIN_CS, true)?;
        Ok(())
    }

    fn post_isp(&mut self) -> Result<()> {
        self.raw_write(&[UART_START_ECHO])?;
        let _ = self.read_raw(1, DEFAULT_TIMEOUT)?;

        self.raw_write(&[UART_BRIDGE])?;
        let _ = self.read_raw(1, DEFAULT_TIMEOUT)?;
        self.bridged = true;
        log::info!("bridge mode active; unplug and replug the Bus Pirate to reset it");
        Ok(())
    }

    fn post_prog(&mut self) -> Result<()> {
        log::warn!("bridge mode active; unplug and replug the Bus Pirate to reset it");
        Ok(())
    }

    fn read(&mut self, len: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let t = timeout.unwrap_or_else(|| self.port.timeout());
        self.read_raw(len, t)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.bridged {
            return self.raw_write(data);
        }
        for chunk in data.chunks(BULK_MAX) {
            self.bulk_write(chunk)?;
        }
        Ok(())
    }

    fn data_available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read().map_err(transport_err)? as usize)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port.set_timeout(timeout).map_err(transport_err)
    }

    fn timeout(&self) -> Duration {
        self.port.timeout()
    }
}
