//! The ISP session state machine
//!
//! One session owns one transport and drives the half-duplex ASCII protocol:
//! sync handshake, echo discipline, device auto-detection, write unlock, and
//! the erase / RAM-stream / copy-to-flash programming loop.

use std::time::Duration;

use crate::chip::{self, ChipSpec};
use crate::error::{Error, Result};
use crate::image;
use crate::transport::Transport;
use crate::uucode;

const SYNC_STR: &str = "Synchronized";
const OK: &str = "OK";
const RESEND: &str = "RESEND";

/// Code armed by the `U` command to unlock write and erase
const UNLOCK_CODE: u32 = 23130;

/// Attempts per 900-byte chunk before a RESEND loop becomes fatal
const MAX_WRITE_ATTEMPTS: u32 = 3;

// Erase and copy-to-flash run much longer than ordinary commands; the
// optional second device-ID word and serial-number words arrive fast or
// not at all.
const ERASE_STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const COPY_STATUS_TIMEOUT: Duration = Duration::from_secs(1);
const EXTRA_WORD_TIMEOUT: Duration = Duration::from_millis(200);
const BULK_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No handshake yet
    Disconnected,
    /// Baud-rate handshake completed
    Synced,
    /// Write/erase commands unlocked
    Unlocked,
    /// A flash operation is in flight
    Working,
    /// Finalized; the transport ran its post-programming hook
    Closed,
}

/// Outcome of streaming one checksummed chunk to RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Chip acknowledged the chunk
    Ok,
    /// Chip requested a retransmission
    Resend,
    /// No status arrived within the timeout
    Timeout,
}

/// Progress callbacks for the programming loop
///
/// All methods default to no-ops; the CLI hangs progress bars off these.
pub trait ProgramProgress {
    /// Sectors `first..=last` are about to be erased
    fn erasing(&mut self, _first_sector: usize, _last_sector: usize) {}
    /// Programming is starting; `total` bytes will be written
    fn writing(&mut self, _total: usize) {}
    /// `done` bytes have been copied to flash so far
    fn write_progress(&mut self, _done: usize) {}
    /// The image is fully programmed
    fn complete(&mut self) {}
}

/// Progress sink that reports nothing
pub struct NullProgress;

impl ProgramProgress for NullProgress {}

/// A programming session bound to one transport
pub struct IspSession<T> {
    transport: T,
    chip: Option<&'static ChipSpec>,
    echo_on: bool,
    phase: Phase,
}

impl<T: Transport> IspSession<T> {
    /// Create a session over an initialized transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            chip: None,
            echo_on: true,
            phase: Phase::Disconnected,
        }
    }

    /// The resolved chip, once connected
    pub fn chip(&self) -> Option<&'static ChipSpec> {
        self.chip
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn require_chip(&self) -> Result<&'static ChipSpec> {
        self.chip
            .ok_or_else(|| Error::Protocol("no chip resolved; connect() first".into()))
    }

    /// Synchronize with the boot ROM, resolve the chip, unlock writes
    ///
    /// With `explicit_cpu` set the registry entry is used as-is; otherwise
    /// the device ID is read with `J` and matched against the registry.
    pub fn connect(&mut self, osc_khz: u32, explicit_cpu: Option<&str>) -> Result<()> {
        if let Some(name) = explicit_cpu {
            self.chip =
                Some(chip::lookup(name).ok_or_else(|| Error::UnknownChip(name.into()))?);
        }

        self.sync(osc_khz)?;
        self.phase = Phase::Synced;

        if self.chip.is_none() {
            let (word0, word1) = self.get_devid()?;
            let detected = chip::by_device_id(word0, word1)
                .ok_or(Error::AutoDetectFailed { word0, word1 })?;
            log::info!("detected {}", detected.name);
            self.chip = Some(detected);
        }

        self.isp_command(&format!("U {}", UNLOCK_CODE))?;
        self.phase = Phase::Unlocked;
        Ok(())
    }

    /// The `?` / `Synchronized` / oscillator / echo-off handshake
    fn sync(&mut self, osc_khz: u32) -> Result<()> {
        self.transport.write(b"?")?;
        let line = self.transport.read_line(None)?;
        if line.is_empty() {
            return Err(Error::SyncTimeout);
        }
        if line != SYNC_STR {
            return Err(Error::SyncMismatch {
                expected: SYNC_STR,
                got: line,
            });
        }

        self.transport.write_line(SYNC_STR.as_bytes())?;
        // our own echo comes back first
        self.expect_line(SYNC_STR)?;
        self.expect_line(OK)?;

        self.transport.write_line(osc_khz.to_string().as_bytes())?;
        let _echo = self.transport.read_line(None)?;
        self.expect_line(OK)?;

        self.transport.write_line(b"A 0")?;
        let _echo = self.transport.read_line(None)?;
        let status = self.transport.read_line(None)?;
        match status.trim().parse::<u32>() {
            Ok(0) => {}
            Ok(code) => log::warn!("echo disable returned status {}", code),
            Err(_) => log::warn!("unexpected echo disable response {:?}", status),
        }
        self.echo_on = false;
        Ok(())
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<()> {
        let got = self.transport.read_line(None)?;
        if got == expected {
            Ok(())
        } else {
            Err(Error::SyncMismatch { expected, got })
        }
    }

    /// Issue a command and require a zero status
    pub fn isp_command(&mut self, cmd: &str) -> Result<()> {
        self.command_with_timeout(cmd, None)
    }

    fn command_with_timeout(&mut self, cmd: &str, timeout: Option<Duration>) -> Result<()> {
        let code = self.command_status(cmd, timeout)?;
        if code != 0 {
            return Err(Error::Isp {
                cmd: cmd.into(),
                code,
            });
        }
        Ok(())
    }

    /// Issue a command and return the raw status code
    fn command_status(&mut self, cmd: &str, timeout: Option<Duration>) -> Result<u32> {
        log::debug!("isp: {}", cmd);
        self.transport.write_line(cmd.as_bytes())?;
        if self.echo_on {
            self.transport.read_line(None)?;
        }
        let status = self.transport.read_line(timeout)?;
        if status.is_empty() {
            return Err(Error::ReadTimeout(format!("status of '{}'", cmd)));
        }
        status
            .trim()
            .parse()
            .map_err(|_| Error::Protocol(format!("unexpected status {:?} for '{}'", status, cmd)))
    }

    fn parse_word(line: &str, what: &str) -> Result<u32> {
        line.trim()
            .parse()
            .map_err(|_| Error::Protocol(format!("unexpected {} line {:?}", what, line)))
    }

    /// Read the device identification word(s)
    pub fn get_devid(&mut self) -> Result<(u32, Option<u32>)> {
        self.isp_command("J")?;
        let line = self.transport.read_line(None)?;
        if line.is_empty() {
            return Err(Error::ReadTimeout("device id".into()));
        }
        let word0 = Self::parse_word(&line, "device id")?;

        // dual-word parts send a second line; its absence is the only way
        // to tell them apart, hence the short grace timeout
        let second = self.transport.read_line(Some(EXTRA_WORD_TIMEOUT))?;
        let word1 = if second.is_empty() {
            None
        } else {
            Some(Self::parse_word(&second, "device id")?)
        };
        Ok((word0, word1))
    }

    /// Read the 4-word device serial number
    pub fn get_serial_number(&mut self) -> Result<[u32; 4]> {
        self.isp_command("N")?;
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let line = self.transport.read_line(Some(EXTRA_WORD_TIMEOUT))?;
            if line.is_empty() {
                return Err(Error::ReadTimeout(format!("serial number word {}", i)));
            }
            *word = Self::parse_word(&line, "serial number")?;
        }
        Ok(words)
    }

    /// Read `len` bytes of flash starting at `addr`
    ///
    /// `len` must be a multiple of 4; the ROM transfers words. The stream
    /// arrives as uuencoded chunks of up to 20 lines, each closed by a
    /// checksum the host must acknowledge with `OK`. There is no resend on
    /// reads; a bad checksum is fatal.
    pub fn read_block(&mut self, addr: u32, len: u32) -> Result<Vec<u8>> {
        if len % 4 != 0 {
            return Err(Error::InvalidParameter(format!(
                "read length {} is not a multiple of 4",
                len
            )));
        }
        self.phase = Phase::Working;
        self.isp_command(&format!("R {} {}", addr, len))?;

        let mut data = Vec::with_capacity(len as usize);
        let mut remaining = (len as usize).div_ceil(uucode::LINE_SIZE);
        while remaining > 0 {
            let lines = remaining.min(uucode::LINES_PER_BLOCK);
            let mut chunk = Vec::with_capacity(lines * uucode::LINE_SIZE);
            for _ in 0..lines {
                let line = self.transport.read_line(Some(BULK_READ_TIMEOUT))?;
                if line.is_empty() {
                    return Err(Error::ReadTimeout("uuencoded data line".into()));
                }
                chunk.extend_from_slice(&uucode::decode_line(&line)?);
            }

            let line = self.transport.read_line(Some(BULK_READ_TIMEOUT))?;
            if line.is_empty() {
                return Err(Error::ReadTimeout("read checksum line".into()));
            }
            let got = line
                .trim()
                .parse()
                .map_err(|_| Error::Protocol(format!("unexpected checksum line {:?}", line)))?;
            let expected = uucode::checksum(&chunk);
            if got != expected {
                return Err(Error::ChecksumMismatch { got, expected });
            }
            self.transport.write_line(OK.as_bytes())?;

            data.extend_from_slice(&chunk);
            remaining -= lines;
        }
        Ok(data)
    }

    /// Stream one checksummed chunk into RAM at `addr`
    pub fn write_ram_block(&mut self, addr: u32, data: &[u8]) -> Result<WriteStatus> {
        self.isp_command(&format!("W {} {}", addr, data.len()))?;

        for line in data.chunks(uucode::LINE_SIZE) {
            self.transport
                .write_line(uucode::encode_line(line).as_bytes())?;
        }
        self.transport
            .write_line(uucode::checksum(data).to_string().as_bytes())?;

        let status = self.transport.read_line(None)?;
        if status.is_empty() {
            Ok(WriteStatus::Timeout)
        } else if status == OK {
            Ok(WriteStatus::Ok)
        } else if status == RESEND {
            Ok(WriteStatus::Resend)
        } else {
            Err(Error::Protocol(format!(
                "unexpected write status {:?}",
                status
            )))
        }
    }

    /// Write a buffer to RAM, chunked and retried on RESEND
    pub fn write_ram(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let mut addr = addr;
        for chunk in data.chunks(uucode::BLOCK_SIZE) {
            self.write_chunk_with_retry(addr, chunk)?;
            addr += chunk.len() as u32;
        }
        Ok(())
    }

    fn write_chunk_with_retry(&mut self, addr: u32, chunk: &[u8]) -> Result<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            match self.write_ram_block(addr, chunk)? {
                WriteStatus::Ok => return Ok(()),
                WriteStatus::Resend => log::warn!(
                    "chip requested resend of {} bytes at 0x{:x} (attempt {}/{})",
                    chunk.len(),
                    addr,
                    attempt,
                    MAX_WRITE_ATTEMPTS
                ),
                WriteStatus::Timeout => {
                    return Err(Error::ReadTimeout(format!("write status at 0x{:x}", addr)))
                }
            }
        }
        Err(Error::Protocol(format!(
            "chip still requesting resend after {} attempts",
            MAX_WRITE_ATTEMPTS
        )))
    }

    // P and E address sectors within a bank on dual-bank parts; only bank 0
    // can currently be targeted (see DESIGN.md).
    fn sector_command(&self, letter: char, first: usize, last: usize) -> Result<String> {
        Ok(if self.require_chip()?.is_banked() {
            format!("{} {} {} 0", letter, first, last)
        } else {
            format!("{} {} {}", letter, first, last)
        })
    }

    /// Arm sectors `first..=last` for erase or copy (`P`)
    pub fn prepare_sectors(&mut self, first: usize, last: usize) -> Result<()> {
        let cmd = self.sector_command('P', first, last)?;
        self.isp_command(&cmd)
    }

    /// Erase sectors `first..=last`
    pub fn erase_sectors(&mut self, first: usize, last: usize) -> Result<()> {
        self.phase = Phase::Working;
        self.prepare_sectors(first, last)?;
        log::info!("erasing flash sectors {}-{}", first, last);
        let cmd = self.sector_command('E', first, last)?;
        self.command_with_timeout(&cmd, Some(ERASE_STATUS_TIMEOUT))
    }

    /// Erase every sector covering `start_addr..end_addr`
    pub fn erase_flash(&mut self, start_addr: u32, end_addr: u32) -> Result<()> {
        let chip = self.require_chip()?;
        let first = chip
            .sector_of(start_addr)
            .ok_or(Error::OutOfRangeAddress(start_addr))?;
        let last_addr = end_addr.saturating_sub(1).max(start_addr);
        let last = chip
            .sector_of(last_addr)
            .ok_or(Error::OutOfRangeAddress(last_addr))?;
        self.erase_sectors(first, last)
    }

    /// Erase the whole part
    pub fn erase_all(&mut self) -> Result<()> {
        let last = self.require_chip()?.sector_count() - 1;
        self.erase_sectors(0, last)
    }

    /// Program an image at `base_addr`
    ///
    /// Prepares the image (checksum + padding), erases the target range (or
    /// everything with `erase_all_first`), then per RAM buffer: stream the
    /// block (`W`), arm its sectors (`P`), copy (`C`). The ROM clears the
    /// prepare token after each copy, so the W-P-C order per block is load
    /// bearing.
    pub fn program(
        &mut self,
        image: Vec<u8>,
        base_addr: u32,
        erase_all_first: bool,
        progress: &mut dyn ProgramProgress,
    ) -> Result<()> {
        let chip = self.require_chip()?;
        let image = image::prepare(image, base_addr, chip)?;
        if image.is_empty() {
            log::warn!("image is empty, nothing to program");
            return Ok(());
        }
        self.phase = Phase::Working;

        let total = image.len();
        if erase_all_first {
            progress.erasing(0, chip.sector_count() - 1);
            self.erase_all()?;
        } else {
            let first = chip
                .sector_of(base_addr)
                .ok_or(Error::OutOfRangeAddress(base_addr))?;
            let end = base_addr + total as u32 - 1;
            let last = chip.sector_of(end).ok_or(Error::OutOfRangeAddress(end))?;
            progress.erasing(first, last);
            self.erase_sectors(first, last)?;
        }

        progress.writing(total);
        let ram_buffer = chip.ram_buffer_size as usize;
        let mut done = 0usize;
        for block in image.chunks(ram_buffer) {
            let flash_addr = base_addr + done as u32;
            log::info!(
                "writing {} bytes to 0x{:06x} ({}%)",
                block.len(),
                flash_addr,
                done * 100 / total
            );

            self.write_ram(chip.ram_buffer_base, block)?;

            let block_end = flash_addr + block.len() as u32 - 1;
            let first = chip
                .sector_of(flash_addr)
                .ok_or(Error::OutOfRangeAddress(flash_addr))?;
            let last = chip
                .sector_of(block_end)
                .ok_or(Error::OutOfRangeAddress(block_end))?;
            self.prepare_sectors(first, last)?;

            let cmd = format!(
                "C {} {} {}",
                flash_addr,
                chip.ram_buffer_base,
                block.len()
            );
            self.command_with_timeout(&cmd, Some(COPY_STATUS_TIMEOUT))?;

            done += block.len();
            progress.write_progress(done);
        }
        progress.complete();
        Ok(())
    }

    /// Start execution at `addr` in the chip's native mode (`G`)
    pub fn start(&mut self, addr: u32) -> Result<()> {
        let mode = self.require_chip()?.cpu_mode;
        self.isp_command(&format!("G {} {}", addr, mode.letter()))
    }

    /// Select flash bank `bank` (`S`); false when the chip refuses
    pub fn select_bank(&mut self, bank: u32) -> Result<bool> {
        let code = self.command_status(&format!("S {}", bank), None)?;
        if code != 0 {
            log::warn!("bank select returned status {}", code);
        }
        Ok(code == 0)
    }

    /// Run the transport's post-programming hook and close the session
    pub fn finalize(&mut self) -> Result<()> {
        self.transport.post_prog()?;
        self.phase = Phase::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::lookup;
    use std::collections::VecDeque;

    /// Scripted chip: canned reply lines, recorded wire bytes
    struct MockTransport {
        replies: VecDeque<&'static str>,
        wire: Vec<u8>,
    }

    impl MockTransport {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                wire: Vec::new(),
            }
        }

        fn wire_str(&self) -> String {
            String::from_utf8_lossy(&self.wire).into_owned()
        }

        /// Lines written by the host, in order
        fn sent_lines(&self) -> Vec<String> {
            self.wire_str()
                .split("\r\n")
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect()
        }
    }

    impl Transport for MockTransport {
        fn init(&mut self) -> crate::Result<()> {
            Ok(())
        }

        fn enter_isp(&mut self) -> crate::Result<()> {
            Ok(())
        }

        fn read(&mut self, _len: usize, _timeout: Option<Duration>) -> crate::Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn read_line(&mut self, _timeout: Option<Duration>) -> crate::Result<String> {
            Ok(self.replies.pop_front().unwrap_or_default().to_owned())
        }

        fn write(&mut self, data: &[u8]) -> crate::Result<()> {
            self.wire.extend_from_slice(data);
            Ok(())
        }

        fn data_available(&mut self) -> crate::Result<usize> {
            Ok(self.replies.len())
        }

        fn set_timeout(&mut self, _timeout: Duration) -> crate::Result<()> {
            Ok(())
        }

        fn timeout(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn unlocked_session(chip: &str, replies: &[&'static str]) -> IspSession<MockTransport> {
        IspSession {
            transport: MockTransport::new(replies),
            chip: Some(lookup(chip).unwrap()),
            echo_on: false,
            phase: Phase::Unlocked,
        }
    }

    #[test]
    fn test_connect_with_autodetect() {
        // sync handshake with echo on, then J (echo off) with a single-word
        // ID and no second line, then unlock
        let transport = MockTransport::new(&[
            "Synchronized", // reply to '?'
            "Synchronized", // echo of our confirmation
            "OK",
            "16000", // echo of the oscillator frequency
            "OK",
            "A 0", // echo of echo-off
            "0",
            "0",         // J status
            "637926199", // devid word 0 (lpc1768)
            "",          // no second word
            "0",         // U status
        ]);

        let mut session = IspSession::new(transport);
        session.connect(16000, None).unwrap();

        assert_eq!(session.chip().unwrap().name, "lpc1768");
        assert_eq!(session.phase(), Phase::Unlocked);
        assert_eq!(
            session.transport.wire_str(),
            "?Synchronized\r\n16000\r\nA 0\r\nJ\r\nU 23130\r\n"
        );
    }

    #[test]
    fn test_connect_sync_timeout() {
        let mut session = IspSession::new(MockTransport::new(&[]));
        assert!(matches!(session.connect(16000, None), Err(Error::SyncTimeout)));
    }

    #[test]
    fn test_connect_sync_mismatch() {
        let mut session = IspSession::new(MockTransport::new(&["?"]));
        assert!(matches!(
            session.connect(16000, None),
            Err(Error::SyncMismatch { .. })
        ));
    }

    #[test]
    fn test_connect_unknown_explicit_cpu() {
        let mut session = IspSession::new(MockTransport::new(&[]));
        assert!(matches!(
            session.connect(16000, Some("lpc9999")),
            Err(Error::UnknownChip(_))
        ));
    }

    #[test]
    fn test_connect_autodetect_failure() {
        let transport = MockTransport::new(&[
            "Synchronized",
            "Synchronized",
            "OK",
            "16000",
            "OK",
            "A 0",
            "0",
            "0",
            "12345", // unknown device id
            "",
        ]);
        let mut session = IspSession::new(transport);
        assert!(matches!(
            session.connect(16000, None),
            Err(Error::AutoDetectFailed {
                word0: 12345,
                word1: None
            })
        ));
    }

    #[test]
    fn test_dual_word_devid() {
        let mut session =
            unlocked_session("lpc1833", &["0", "4026653232", "68"]);
        // 4026653232 == 0xf001da30
        let (w0, w1) = session.get_devid().unwrap();
        assert_eq!(w0, 0xf001da30);
        assert_eq!(w1, Some(0x44));
    }

    #[test]
    fn test_isp_command_nonzero_status() {
        let mut session = unlocked_session("lpc1768", &["19"]);
        match session.isp_command("C 0 268439552 512") {
            Err(Error::Isp { cmd, code }) => {
                assert_eq!(cmd, "C 0 268439552 512");
                assert_eq!(code, 19);
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn test_write_block_recovers_after_two_resends() {
        let payload = b"vector table goes here";
        let mut session = unlocked_session(
            "lpc1768",
            &["0", "RESEND", "0", "RESEND", "0", "OK"],
        );

        session.write_ram(0x40001000, payload).unwrap();

        let lines = session.transport.sent_lines();
        let w_count = lines
            .iter()
            .filter(|l| l.as_str() == format!("W 1073745920 {}", payload.len()))
            .count();
        let payload_count = lines
            .iter()
            .filter(|l| **l == uucode::encode_line(payload))
            .count();
        assert_eq!(w_count, 3);
        assert_eq!(payload_count, 3);
    }

    #[test]
    fn test_write_block_resend_exhaustion() {
        let mut session = unlocked_session(
            "lpc1768",
            &["0", "RESEND", "0", "RESEND", "0", "RESEND"],
        );
        assert!(matches!(
            session.write_ram(0x40001000, b"data"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_write_block_timeout() {
        let mut session = unlocked_session("lpc1768", &["0"]);
        assert!(matches!(
            session.write_ram(0x40001000, b"data"),
            Err(Error::ReadTimeout(_))
        ));
    }

    #[test]
    fn test_read_block_round_trip() {
        let data = b"\x00\x01\x02\x03\x04\x05\x06\x07";
        let line: &'static str = Box::leak(uucode::encode_line(data).into_boxed_str());
        let csum: &'static str =
            Box::leak(uucode::checksum(data).to_string().into_boxed_str());

        let mut session = unlocked_session("lpc1768", &["0", line, csum]);
        let out = session.read_block(0, 8).unwrap();

        assert_eq!(out, data);
        let lines = session.transport.sent_lines();
        assert_eq!(lines, vec!["R 0 8".to_owned(), "OK".to_owned()]);
    }

    #[test]
    fn test_read_block_checksum_mismatch() {
        let data = b"\x00\x01\x02\x03";
        let line: &'static str = Box::leak(uucode::encode_line(data).into_boxed_str());

        let mut session = unlocked_session("lpc1768", &["0", line, "9999"]);
        assert!(matches!(
            session.read_block(0, 4),
            Err(Error::ChecksumMismatch { got: 9999, .. })
        ));
    }

    #[test]
    fn test_read_block_rejects_unaligned_length() {
        let mut session = unlocked_session("lpc1768", &[]);
        assert!(matches!(
            session.read_block(0, 7),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_erase_sectors_flat() {
        let mut session = unlocked_session("lpc1768", &["0", "0"]);
        session.erase_sectors(0, 2).unwrap();
        assert_eq!(session.transport.wire_str(), "P 0 2\r\nE 0 2\r\n");
    }

    #[test]
    fn test_erase_sectors_banked_suffix() {
        let mut session = unlocked_session("lpc1837", &["0", "0"]);
        session.erase_sectors(0, 2).unwrap();
        assert_eq!(session.transport.wire_str(), "P 0 2 0\r\nE 0 2 0\r\n");
    }

    #[test]
    fn test_erase_all_uses_sector_count_override() {
        // lpc2364 has a 28-entry table but only 11 sectors
        let mut session = unlocked_session("lpc2364", &["0", "0"]);
        session.erase_all().unwrap();
        assert_eq!(session.transport.wire_str(), "P 0 10\r\nE 0 10\r\n");
    }

    #[test]
    fn test_erase_flash_range_is_exclusive_end() {
        // 0x0..0x1000 is exactly sector 0 on the lpc1768
        let mut session = unlocked_session("lpc1768", &["0", "0"]);
        session.erase_flash(0, 0x1000).unwrap();
        assert_eq!(session.transport.wire_str(), "P 0 0\r\nE 0 0\r\n");
    }

    #[test]
    fn test_erase_flash_out_of_range() {
        let mut session = unlocked_session("lpc1768", &[]);
        assert!(matches!(
            session.erase_flash(0, 0x8000_0000),
            Err(Error::OutOfRangeAddress(_))
        ));
    }

    #[test]
    fn test_program_issues_w_p_c_per_block() {
        // lpc1114: 1024-byte RAM buffer at 0x10000400, so a 100-byte image
        // pads to one block streamed as a 900-byte and a 124-byte chunk
        let replies = &[
            "0", "0", // P + E for the erase
            "0", "OK", // W chunk 1
            "0", "OK", // W chunk 2
            "0", // P for the copy
            "0", // C
        ];
        let mut session = unlocked_session("lpc1114", replies);
        session
            .program(vec![0xab; 100], 0, false, &mut NullProgress)
            .unwrap();

        let commands: Vec<String> = session
            .transport
            .sent_lines()
            .into_iter()
            .filter(|l| l.starts_with(['P', 'E', 'W', 'C']))
            .collect();
        assert_eq!(
            commands,
            vec![
                "P 0 0".to_owned(),
                "E 0 0".to_owned(),
                "W 268436480 900".to_owned(),
                "W 268437380 124".to_owned(),
                "P 0 0".to_owned(),
                "C 0 268436480 1024".to_owned(),
            ]
        );
        assert_eq!(session.phase(), Phase::Working);
    }

    #[test]
    fn test_start_uses_chip_mode_letter() {
        let mut thumb = unlocked_session("lpc1768", &["0"]);
        thumb.start(0).unwrap();
        assert_eq!(thumb.transport.wire_str(), "G 0 T\r\n");

        let mut arm = unlocked_session("lpc2368", &["0"]);
        arm.start(0x4000).unwrap();
        assert_eq!(arm.transport.wire_str(), "G 16384 A\r\n");
    }

    #[test]
    fn test_select_bank() {
        let mut session = unlocked_session("lpc1837", &["0"]);
        assert!(session.select_bank(1).unwrap());

        let mut session = unlocked_session("lpc1837", &["5"]);
        assert!(!session.select_bank(1).unwrap());
    }

    #[test]
    fn test_get_serial_number() {
        let mut session =
            unlocked_session("lpc1768", &["0", "1", "2", "3", "4"]);
        assert_eq!(session.get_serial_number().unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_finalize_closes_session() {
        let mut session = unlocked_session("lpc1768", &[]);
        session.finalize().unwrap();
        assert_eq!(session.phase(), Phase::Closed);
    }
}
