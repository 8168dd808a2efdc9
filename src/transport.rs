//! Byte transport between the driver and the chip.
//!
//! The driver is written against the [`Transport`] trait and does not care
//! whether bytes move over a hardware SPI peripheral ([`HardSpi`]) or four
//! bit-banged GPIO lines ([`SoftSpi`]).
//!
//! [`SoftSpi`]: crate::soft_spi::SoftSpi

use embedded_hal::spi::{Operation, SpiDevice};

/// Deselect settle time the LS7366R needs after the final clock cycle,
/// before chip-select may rise.
pub(crate) const DEFAULT_SETTLE_US: u32 = 20_000;

/// A full-duplex byte exchange with the chip.
///
/// One call is one chip-select assertion. Implementations must:
///
/// - clock `max(tx.len(), rx.len())` bytes of eight bits each, MSB first;
/// - clock out `0x00` for byte positions past the end of `tx`, so response
///   bytes keep shifting in;
/// - hold chip-select asserted for the whole exchange and release it only
///   after the chip's deselect settle time has elapsed;
/// - run to completion once started. The chip cannot resume a partial
///   shift, so there is no cancellation point.
///
/// The transport cannot detect a missing or miswired chip; only transport
/// failures (pin or bus errors) are reported.
pub trait Transport {
    /// Error produced by the underlying lines or bus.
    type Error;

    /// Exchange `tx` for `rx` under a single chip-select assertion.
    ///
    /// `tx` must be non-empty. `rx` may be empty for write-only commands.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;
}

/// [`Transport`] over a hardware SPI peripheral.
///
/// Wraps any [`SpiDevice`] (mode 0). The settle delay runs inside the
/// device transaction so it elapses before the device layer releases
/// chip-select, matching the contract of the bit-banged transport.
///
/// Note that `SpiDevice::transaction` pads a short write with
/// implementation-defined filler words. Every `embedded-hal` implementation
/// the author is aware of uses `0x00`, which is what the LS7366R requires
/// during its response window; check yours if readings look shifted.
#[derive(Debug)]
pub struct HardSpi<SPI> {
    spi: SPI,
    settle_ns: u32,
}

impl<SPI> HardSpi<SPI> {
    /// Wrap an SPI device with the default 20 ms deselect settle time.
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            settle_ns: DEFAULT_SETTLE_US.saturating_mul(1_000),
        }
    }

    /// Override the deselect settle time.
    pub fn with_settle_time_us(mut self, settle_us: u32) -> Self {
        self.settle_ns = settle_us.saturating_mul(1_000);
        self
    }

    /// Return the wrapped SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> Transport for HardSpi<SPI> {
    type Error = SPI::Error;

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        assert!(!tx.is_empty(), "Transfer must carry an instruction byte.");
        log::trace!("spi exchange: {} out, {} in", tx.len(), rx.len());
        self.spi.transaction(&mut [
            Operation::Transfer(rx, tx),
            Operation::DelayNs(self.settle_ns),
        ])
    }
}
