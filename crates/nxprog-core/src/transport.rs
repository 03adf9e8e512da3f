//! Line-oriented transport abstraction
//!
//! The ISP protocol is half-duplex ASCII over a byte stream. Backends
//! (direct serial, Bus Pirate bridge) implement the byte-level methods;
//! the line discipline is implemented once here.

use std::time::Duration;

use crate::error::Result;

/// A byte stream the ISP session can speak over
///
/// `init` opens and configures the underlying device. `enter_isp` performs
/// whatever reset choreography the hardware supports to drop the chip into
/// ISP mode; `post_isp` runs after entry (the Bus Pirate switches to
/// transparent bridge mode here) and `post_prog` after the session is done.
pub trait Transport {
    /// Open and configure the underlying device
    fn init(&mut self) -> Result<()>;

    /// Put the chip into ISP mode, by wire control or by prompting the user
    fn enter_isp(&mut self) -> Result<()>;

    /// Hook run after ISP entry, before the first protocol byte
    fn post_isp(&mut self) -> Result<()> {
        Ok(())
    }

    /// Hook run once the session is finished with the chip
    fn post_prog(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read up to `len` bytes, blocking up to the timeout
    ///
    /// `timeout` overrides the transport timeout for this call only. May
    /// return fewer bytes than requested (or none) when the timeout expires.
    fn read(&mut self, len: usize, timeout: Option<Duration>) -> Result<Vec<u8>>;

    /// Write raw bytes
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Write a CRLF-terminated line
    fn write_line(&mut self, data: &[u8]) -> Result<()> {
        self.write(data)?;
        self.write(b"\r\n")
    }

    /// Read one logical line
    ///
    /// CR characters are discarded, LF terminates, blank lines are skipped.
    /// Returns an empty string when the timeout expires before a line
    /// arrives; a partial line is returned as-is.
    fn read_line(&mut self, timeout: Option<Duration>) -> Result<String> {
        let mut line = Vec::new();
        loop {
            let chunk = self.read(1, timeout)?;
            let Some(&c) = chunk.first() else {
                break;
            };
            match c {
                b'\r' => continue,
                b'\n' if line.is_empty() => continue,
                b'\n' => break,
                _ => line.push(c),
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Number of bytes buffered and ready to read
    fn data_available(&mut self) -> Result<usize>;

    /// Change the default timeout for subsequent reads
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// The current default timeout
    fn timeout(&self) -> Duration;
}

// lets callers hold any backend as `Box<dyn Transport>` while the session
// stays generic
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn enter_isp(&mut self) -> Result<()> {
        (**self).enter_isp()
    }

    fn post_isp(&mut self) -> Result<()> {
        (**self).post_isp()
    }

    fn post_prog(&mut self) -> Result<()> {
        (**self).post_prog()
    }

    fn read(&mut self, len: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        (**self).read(len, timeout)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn write_line(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_line(data)
    }

    fn read_line(&mut self, timeout: Option<Duration>) -> Result<String> {
        (**self).read_line(timeout)
    }

    fn data_available(&mut self) -> Result<usize> {
        (**self).data_available()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }
}
