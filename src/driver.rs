use log::{debug, warn};

use crate::commands::{Opcode, Register, instruction};
use crate::error::Error;
use crate::settings::{CounterWidth, Mdr0, Mdr1, QuadCountMode};
use crate::status::{Direction, Status};
use crate::transport::Transport;

/// How raw counter bytes become a signed value.
///
/// The two conventions agree for most readings but diverge near the edge
/// of the representable range, because the status register's sign latch is
/// updated when a snapshot is latched while the raw bytes carry their own
/// most-significant bit. For example, a two-byte counter reading `0x8000`
/// decodes to `-32768` under [`TwosComplement`] but to `+32768` under
/// [`StatusFlag`] when the sign latch is clear. Neither is "the" right
/// answer; pick the one whose wrap behaviour your application expects.
///
/// [`TwosComplement`]: SignMode::TwosComplement
/// [`StatusFlag`]: SignMode::StatusFlag
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignMode {
    /// Interpret the raw bytes as a two's-complement integer of the
    /// configured width.
    #[default]
    TwosComplement,
    /// Treat the raw bytes as an unsigned magnitude and negate when the
    /// status register's sign latch is set. Costs one extra STR read per
    /// counter read.
    StatusFlag,
}

/// Construction-time configuration for a counter session.
///
/// The counter byte width is fixed here for the life of the session;
/// there is deliberately no operation that rewrites it afterwards.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Initial MDR0 contents (quadrature, cycle, index and filter fields).
    pub mdr0: Mdr0,
    /// Counter byte width.
    pub width: CounterWidth,
    /// Sign-decode convention for counter reads.
    pub sign_mode: SignMode,
    /// Latch CNTR into OTR before each read (default), so a counter that
    /// is still moving is read as a consistent snapshot. When `false`,
    /// reads go straight to CNTR.
    pub latch_on_read: bool,
}

impl Config {
    /// Set the quadrature multiplication factor.
    pub fn with_quad_mode(mut self, mode: QuadCountMode) -> Self {
        self.mdr0.quad_mode = mode;
        self
    }

    /// Replace the whole initial MDR0 configuration.
    pub fn with_mdr0(mut self, mdr0: Mdr0) -> Self {
        self.mdr0 = mdr0;
        self
    }

    /// Set the counter byte width.
    pub fn with_width(mut self, width: CounterWidth) -> Self {
        self.width = width;
        self
    }

    /// Set the sign-decode convention.
    pub fn with_sign_mode(mut self, sign_mode: SignMode) -> Self {
        self.sign_mode = sign_mode;
        self
    }

    /// Read CNTR directly instead of latching into OTR first.
    pub fn with_direct_reads(mut self) -> Self {
        self.latch_on_read = false;
        self
    }
}

impl Default for Config {
    /// Latched reads of a four-byte counter in x1 quadrature, decoded as
    /// two's complement.
    fn default() -> Self {
        Self {
            mdr0: Mdr0::default(),
            width: CounterWidth::default(),
            sign_mode: SignMode::default(),
            latch_on_read: true,
        }
    }
}

/// Driver for one LS7366R.
///
/// Owns its [`Transport`] (and through it, the chip's lines) for the life
/// of the session. Construction configures the chip; [`Ls7366r::release`]
/// disables counting and hands the transport back.
///
/// Every bus-touching method takes `&mut self`: the exchange mutates the
/// shared transfer buffers and the chip cannot interleave transfers, so
/// exclusive access *is* the locking discipline. To share a session across
/// threads, wrap it in a mutex; independent sessions on separate
/// chip-select lines need no coordination.
pub struct Ls7366r<T> {
    transport: T,
    mdr0: Mdr0,
    mdr1: Mdr1,
    sign_mode: SignMode,
    latch_on_read: bool,
    // One instruction byte plus up to four data bytes, reused for every
    // exchange.
    tx: [u8; 5],
    rx: [u8; 5],
}

impl<T: Transport> Ls7366r<T> {
    /// Configure the chip and return a ready counter session.
    ///
    /// Issues the power-up sequence: clear MDR0, MDR1, STR and CNTR, latch
    /// the cleared counter into OTR, then write the configured MDR0 and
    /// MDR1. The clears come first so the mode writes land on a known
    /// state; do not reorder.
    ///
    /// # Errors
    ///
    /// Any transport failure during the sequence.
    pub fn new(transport: T, config: Config) -> Result<Self, Error<T::Error>> {
        let mdr1 = Mdr1 {
            width: config.width,
            ..Mdr1::default()
        };
        let mut session = Self {
            transport,
            mdr0: config.mdr0,
            mdr1,
            sign_mode: config.sign_mode,
            latch_on_read: config.latch_on_read,
            tx: [0; 5],
            rx: [0; 5],
        };
        let mdr0_byte = u8::from(session.mdr0);
        let mdr1_byte = u8::from(session.mdr1);
        debug!("ls7366r: init, mdr0={mdr0_byte:#04x} mdr1={mdr1_byte:#04x}");
        session.clear(Register::Mdr0)?;
        session.clear(Register::Mdr1)?;
        session.clear(Register::Str)?;
        session.clear(Register::Cntr)?;
        session.load(Register::Otr)?;
        session.write_byte(Register::Mdr0, mdr0_byte)?;
        session.write_byte(Register::Mdr1, mdr1_byte)?;
        Ok(session)
    }

    ////////////////////////////////////////////////////////////////////////
    // Register primitives
    ////////////////////////////////////////////////////////////////////////

    /// Issue a bare CLR instruction.
    fn clear(&mut self, register: Register) -> Result<(), Error<T::Error>> {
        self.tx[0] = instruction(Opcode::Clear, register);
        self.transport
            .transfer(&self.tx[..1], &mut [])
            .map_err(Error::Transport)
    }

    /// Issue a bare LOAD instruction.
    fn load(&mut self, register: Register) -> Result<(), Error<T::Error>> {
        self.tx[0] = instruction(Opcode::Load, register);
        self.transport
            .transfer(&self.tx[..1], &mut [])
            .map_err(Error::Transport)
    }

    /// Write a single-byte register.
    fn write_byte(&mut self, register: Register, value: u8) -> Result<(), Error<T::Error>> {
        self.tx[0] = instruction(Opcode::Write, register);
        self.tx[1] = value;
        self.transport
            .transfer(&self.tx[..2], &mut [])
            .map_err(Error::Transport)
    }

    /// Read a single-byte register.
    ///
    /// The exchange is two bytes long and the first byte of the response
    /// is always discarded: it shifts out during the instruction byte's
    /// own transfer window, before the chip has decoded the instruction.
    fn read_byte(&mut self, register: Register) -> Result<u8, Error<T::Error>> {
        self.tx[0] = instruction(Opcode::Read, register);
        self.tx[1] = 0;
        self.transport
            .transfer(&self.tx[..2], &mut self.rx[..2])
            .map_err(Error::Transport)?;
        Ok(self.rx[1])
    }

    /// Read a counter-width register (CNTR or OTR), big-endian.
    ///
    /// As with [`Ls7366r::read_byte`], the first response byte is the
    /// instruction window's echo and is discarded; bytes `1..=width`
    /// carry the value.
    fn read_wide(&mut self, register: Register) -> Result<u32, Error<T::Error>> {
        let width = self.mdr1.width.bytes();
        self.tx[0] = instruction(Opcode::Read, register);
        self.tx[1..=width].fill(0);
        self.transport
            .transfer(&self.tx[..=width], &mut self.rx[..=width])
            .map_err(Error::Transport)?;
        let mut raw = 0u32;
        for &byte in &self.rx[1..=width] {
            raw = raw << 8 | u32::from(byte);
        }
        Ok(raw)
    }

    ////////////////////////////////////////////////////////////////////////
    // Counter operations
    ////////////////////////////////////////////////////////////////////////

    /// Read the current count.
    ///
    /// With latched reads (the default) this first copies CNTR into OTR in
    /// a single instruction, then reads the snapshot, so a counter that
    /// advances mid-read cannot tear. With direct reads it reads CNTR as
    /// it stands.
    pub fn count(&mut self) -> Result<i32, Error<T::Error>> {
        let raw = if self.latch_on_read {
            self.load(Register::Otr)?;
            self.read_wide(Register::Otr)?
        } else {
            self.read_wide(Register::Cntr)?
        };
        let negative = match self.sign_mode {
            SignMode::TwosComplement => false,
            SignMode::StatusFlag => self.status()?.negative,
        };
        Ok(decode_count(raw, self.mdr1.width, self.sign_mode, negative))
    }

    /// Read the direction of the most recent count from the status
    /// register.
    pub fn direction(&mut self) -> Result<Direction, Error<T::Error>> {
        Ok(self.status()?.direction)
    }

    /// Read and decode the full status register.
    pub fn status(&mut self) -> Result<Status, Error<T::Error>> {
        let byte = self.read_byte(Register::Str)?;
        Ok(Status::from_byte(byte))
    }

    /// Reset the counter to zero.
    pub fn clear_count(&mut self) -> Result<(), Error<T::Error>> {
        self.clear(Register::Cntr)
    }

    /// Clear the latched status flags (carry, borrow, index, power loss,
    /// sign).
    pub fn clear_status(&mut self) -> Result<(), Error<T::Error>> {
        self.clear(Register::Str)
    }

    /// Latch CNTR into OTR without reading it.
    ///
    /// Useful with direct reads disabled elsewhere: snapshot now, read the
    /// snapshot later.
    pub fn latch(&mut self) -> Result<(), Error<T::Error>> {
        self.load(Register::Otr)
    }

    ////////////////////////////////////////////////////////////////////////
    // Mode operations
    ////////////////////////////////////////////////////////////////////////

    /// Change the quadrature multiplication factor.
    ///
    /// When `mode` matches the mode already applied this returns without
    /// any bus traffic. Otherwise MDR0 is rebuilt from the cached base
    /// flags with the new multiplier and rewritten.
    pub fn set_quad_mode(&mut self, mode: QuadCountMode) -> Result<(), Error<T::Error>> {
        if self.mdr0.quad_mode == mode {
            return Ok(());
        }
        self.mdr0.quad_mode = mode;
        let byte = u8::from(self.mdr0);
        debug!("ls7366r: quad mode change, mdr0={byte:#04x}");
        self.write_byte(Register::Mdr0, byte)
    }

    /// The mode register 0 contents currently applied to the chip.
    ///
    /// Served from the driver's cache; no bus traffic.
    pub fn mdr0(&self) -> Mdr0 {
        self.mdr0
    }

    /// The mode register 1 contents currently applied to the chip.
    ///
    /// Served from the driver's cache; no bus traffic.
    pub fn mdr1(&self) -> Mdr1 {
        self.mdr1
    }

    ////////////////////////////////////////////////////////////////////////
    // Preset operations
    ////////////////////////////////////////////////////////////////////////

    /// Write a value into the data transfer register.
    ///
    /// DTR is the staging register for presetting the counter (see
    /// [`Ls7366r::load_preset`]) and the bound for the range-limit and
    /// modulo-n cycle modes. The value is truncated to the configured
    /// counter width on the wire.
    pub fn write_preset(&mut self, value: i32) -> Result<(), Error<T::Error>> {
        let width = self.mdr1.width.bytes();
        let bytes = value.to_be_bytes();
        self.tx[0] = instruction(Opcode::Write, Register::Dtr);
        self.tx[1..=width].copy_from_slice(&bytes[4 - width..]);
        self.transport
            .transfer(&self.tx[..=width], &mut [])
            .map_err(Error::Transport)
    }

    /// Copy DTR into CNTR, presetting the counter.
    pub fn load_preset(&mut self) -> Result<(), Error<T::Error>> {
        self.load(Register::Cntr)
    }

    ////////////////////////////////////////////////////////////////////////
    // Teardown
    ////////////////////////////////////////////////////////////////////////

    /// End the session: disable counting and return the transport.
    ///
    /// The disable is best-effort: if the write fails the transport is
    /// still returned so the caller can recover the lines, and the failure
    /// is logged.
    pub fn release(mut self) -> T {
        let mut stopped = self.mdr1;
        stopped.counting_enabled = false;
        debug!("ls7366r: release, disabling count");
        if self.write_byte(Register::Mdr1, u8::from(stopped)).is_err() {
            warn!("ls7366r: count disable on release failed");
        }
        self.transport
    }
}

/// Turn raw register bytes into a signed count.
fn decode_count(raw: u32, width: CounterWidth, mode: SignMode, negative: bool) -> i32 {
    let bits = width.bytes() as u32 * 8;
    match mode {
        SignMode::TwosComplement => {
            // Sign-extend from the register's own most significant bit.
            let shift = 32 - bits;
            ((raw << shift) as i32) >> shift
        }
        SignMode::StatusFlag => {
            if negative {
                (i64::from(raw) - (1i64 << bits)) as i32
            } else {
                raw as i32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twos_complement_four_bytes() {
        let decode = |raw| decode_count(raw, CounterWidth::Four, SignMode::TwosComplement, false);
        assert_eq!(decode(0x0000_0001), 1);
        assert_eq!(decode(0xFFFF_FFFF), -1);
        assert_eq!(decode(0x7FFF_FFFF), i32::MAX);
        assert_eq!(decode(0x8000_0000), i32::MIN);
    }

    #[test]
    fn twos_complement_narrow_widths() {
        let two = |raw| decode_count(raw, CounterWidth::Two, SignMode::TwosComplement, false);
        assert_eq!(two(0x7FFF), 32_767);
        assert_eq!(two(0x8000), -32_768);
        assert_eq!(two(0xFFFF), -1);
        let one = |raw| decode_count(raw, CounterWidth::One, SignMode::TwosComplement, false);
        assert_eq!(one(0x80), -128);
        assert_eq!(one(0xFF), -1);
    }

    #[test]
    fn status_flag_follows_the_latch() {
        let decode = |raw, neg| decode_count(raw, CounterWidth::Two, SignMode::StatusFlag, neg);
        assert_eq!(decode(0x0001, false), 1);
        assert_eq!(decode(0xFFFF, true), -1);
        assert_eq!(decode(0x8000, true), -32_768);
    }

    #[test]
    fn sign_conventions_diverge_at_the_boundary() {
        // The documented discrepancy: with the sign latch clear, 0x8000
        // reads as +32768 under the status-flag convention but -32768
        // under two's complement.
        let raw = 0x8000;
        assert_eq!(
            decode_count(raw, CounterWidth::Two, SignMode::StatusFlag, false),
            32_768
        );
        assert_eq!(
            decode_count(raw, CounterWidth::Two, SignMode::TwosComplement, false),
            -32_768
        );
    }
}
