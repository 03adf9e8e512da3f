//! Direct serial port transport
//!
//! Plain UART connection to the chip. When the board wires DTR to reset and
//! RTS to the ISP-entry pin (`--control`), the chip can be dropped into ISP
//! mode without touching it; otherwise the user is prompted to do the
//! button dance.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use nxprog_core::error::{Error, Result};
use nxprog_core::transport::Transport;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// How long each leg of the reset choreography holds its level
const RESET_HOLD: Duration = Duration::from_millis(100);

fn transport_err(e: serialport::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    control: bool,
}

impl SerialTransport {
    /// Open `device` 8N1 at `baud`
    ///
    /// `xonxoff` enables software flow control; `control` enables the
    /// DTR/RTS reset choreography in [`Transport::enter_isp`].
    pub fn open(device: &str, baud: u32, xonxoff: bool, control: bool) -> Result<Self> {
        let flow = if xonxoff {
            FlowControl::Software
        } else {
            FlowControl::None
        };
        let port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(flow)
            .timeout(DEFAULT_TIMEOUT)
            .open()
            .map_err(transport_err)?;

        log::info!("opened serial port {} at {} baud", device, baud);

        Ok(Self { port, control })
    }

    // reset is wired to DTR, which makes int0 RTS
    fn reset(&mut self, level: bool) -> Result<()> {
        self.port
            .write_data_terminal_ready(level)
            .map_err(transport_err)
    }

    fn int0(&mut self, level: bool) -> Result<()> {
        self.port.write_request_to_send(level).map_err(transport_err)
    }
}

impl Transport for SerialTransport {
    fn init(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(transport_err)
    }

    fn enter_isp(&mut self) -> Result<()> {
        if self.control {
            log::info!("resetting into ISP mode via DTR/RTS");
            self.reset(false)?;
            thread::sleep(RESET_HOLD);
            self.reset(true)?;
            self.int0(true)?;
            thread::sleep(RESET_HOLD);
            self.reset(false)?;
            thread::sleep(RESET_HOLD);
            self.int0(false)?;
        } else {
            log::warn!("serial port cannot control ISP mode");
            log::warn!("press both BOOT and RESET buttons");
            thread::sleep(Duration::from_secs(2));
            log::warn!("release the RESET button");
            thread::sleep(Duration::from_secs(2));
            log::warn!("release the BOOT button");
        }
        Ok(())
    }

    fn post_prog(&mut self) -> Result<()> {
        if !self.control {
            log::warn!("reset the board manually to run the new firmware");
        }
        Ok(())
    }

    fn read(&mut self, len: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let old = self.port.timeout();
        if let Some(t) = timeout {
            self.port.set_timeout(t).map_err(transport_err)?;
        }

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

        if timeout.is_some() {
            self.port.set_timeout(old).map_err(transport_err)?;
        }
        outcome?;
        buf.truncate(filled);
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
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
