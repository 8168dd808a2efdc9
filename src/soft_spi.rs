//! Bit-banged SPI over four GPIO lines.
//!
//! For boards with no free SPI peripheral, [`SoftSpi`] drives the LS7366R's
//! serial interface in software: chip-select, clock and data-out as plain
//! outputs, data-in as a plain input, and a [`DelayNs`] timer pacing the
//! clock. The protocol is SPI mode 0, MSB first: the chip presents its
//! output synchronized to the rising clock edge, so the engine drives
//! data-out *before* raising the clock and samples data-in *after*.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::transport::{DEFAULT_SETTLE_US, Transport};

/// Timing configuration for the bit-banged engine.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftSpiConfig {
    /// Half of one clock period, in nanoseconds.
    pub half_period_ns: u32,
    /// Deselect settle time after the final clock cycle, in microseconds.
    pub settle_us: u32,
}

impl Default for SoftSpiConfig {
    /// ~100 kHz clock, 20 ms settle.
    fn default() -> Self {
        Self {
            half_period_ns: 5_000,
            settle_us: DEFAULT_SETTLE_US,
        }
    }
}

impl SoftSpiConfig {
    /// Set the clock rate in hertz (approximate, via the half-period).
    pub fn with_clock_hz(mut self, hz: u32) -> Self {
        if hz > 0 {
            self.half_period_ns = 500_000_000 / hz;
        }
        self
    }

    /// Override the deselect settle time.
    pub fn with_settle_time_us(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }
}

/// Software SPI engine over four GPIO lines.
///
/// Owns its pins for the lifetime of the session; [`SoftSpi::release`]
/// returns them. All four pins must share one error type, which becomes
/// the transport error.
///
/// The engine is a plain synchronous loop: each transfer blocks the
/// calling thread for eight clock periods per byte plus the settle delay,
/// and always runs to completion. It has no way to detect wiring faults;
/// a stuck data-in line silently yields wrong bits.
pub struct SoftSpi<Cs, Sck, Mosi, Miso, D> {
    cs: Cs,
    sck: Sck,
    mosi: Mosi,
    miso: Miso,
    delay: D,
    config: SoftSpiConfig,
}

impl<Cs, Sck, Mosi, Miso, D, E> SoftSpi<Cs, Sck, Mosi, Miso, D>
where
    Cs: OutputPin<Error = E>,
    Sck: OutputPin<Error = E>,
    Mosi: OutputPin<Error = E>,
    Miso: InputPin<Error = E>,
    D: DelayNs,
{
    /// Take ownership of the four lines and drive them to their idle
    /// levels: chip-select high (deselected), clock low (mode 0), data-out
    /// low.
    pub fn new(
        mut cs: Cs,
        mut sck: Sck,
        mut mosi: Mosi,
        miso: Miso,
        delay: D,
        config: SoftSpiConfig,
    ) -> Result<Self, E> {
        cs.set_high()?;
        sck.set_low()?;
        mosi.set_low()?;
        Ok(Self {
            cs,
            sck,
            mosi,
            miso,
            delay,
            config,
        })
    }

    /// Release the pins and the delay timer.
    pub fn release(self) -> (Cs, Sck, Mosi, Miso, D) {
        (self.cs, self.sck, self.mosi, self.miso, self.delay)
    }

    /// Shift one byte out while shifting one byte in, MSB first.
    fn exchange_byte(&mut self, out: u8) -> Result<u8, E> {
        let mut read = 0u8;
        for bit in (0..8).rev() {
            // Data must be stable before the rising edge.
            if (out >> bit) & 1 == 1 {
                self.mosi.set_high()?;
            } else {
                self.mosi.set_low()?;
            }
            self.delay.delay_ns(self.config.half_period_ns);
            self.sck.set_high()?;
            // The chip presents its next bit on the rising edge.
            read <<= 1;
            if self.miso.is_high()? {
                read |= 1;
            }
            self.delay.delay_ns(self.config.half_period_ns);
            self.sck.set_low()?;
        }
        Ok(read)
    }
}

impl<Cs, Sck, Mosi, Miso, D, E> Transport for SoftSpi<Cs, Sck, Mosi, Miso, D>
where
    Cs: OutputPin<Error = E>,
    Sck: OutputPin<Error = E>,
    Mosi: OutputPin<Error = E>,
    Miso: InputPin<Error = E>,
    D: DelayNs,
{
    type Error = E;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), E> {
        assert!(!tx.is_empty(), "Transfer must carry an instruction byte.");
        log::trace!("soft-spi exchange: {} out, {} in", tx.len(), rx.len());
        self.cs.set_low()?;
        let total = tx.len().max(rx.len());
        for position in 0..total {
            // Past the end of tx, keep clocking with data-out low so the
            // chip can keep shifting its response out.
            let out = tx.get(position).copied().unwrap_or(0);
            let read = self.exchange_byte(out)?;
            if let Some(slot) = rx.get_mut(position) {
                *slot = read;
            }
        }
        // The chip needs its settle time after the final clock cycle
        // before chip-select may rise.
        self.delay.delay_us(self.config.settle_us);
        self.cs.set_high()?;
        Ok(())
    }
}
