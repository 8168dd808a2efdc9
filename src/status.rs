//! Status read from the chip's STR register.

use bit_field::BitField;

/// Direction of the most recent count.
///
/// Derived from the up/down bit of STR on every query; the driver never
/// caches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// The counter last moved up (channel A leading channel B).
    Clockwise,
    /// The counter last moved down (channel B leading channel A).
    CounterClockwise,
}

/// Decoded contents of the status register.
///
/// ## Datasheet
///
/// See the STR register description: CY, BW, CMP, IDX, CEN, PLS, U/D and S
/// in bits B7 down to B0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// The counter overflowed past the top of its range.
    pub carry: bool,
    /// The counter underflowed past zero.
    pub borrow: bool,
    /// CNTR matched DTR.
    pub compare: bool,
    /// An index event was latched.
    pub index: bool,
    /// Counting is currently enabled.
    pub counting_enabled: bool,
    /// Power was lost since the latch was last cleared.
    ///
    /// Set on power-up; cleared by clearing STR.
    pub power_loss: bool,
    /// Direction of the most recent count.
    pub direction: Direction,
    /// Sign latch: set when the latched counter value was negative.
    ///
    /// Latched together with OTR, so it describes the last latched
    /// snapshot, not necessarily the live counter. See
    /// [`SignMode`](crate::SignMode) for where this matters.
    pub negative: bool,
}

impl Status {
    /// Decode the raw STR byte.
    pub(crate) fn from_byte(byte: u8) -> Self {
        Self {
            carry: byte.get_bit(7),
            borrow: byte.get_bit(6),
            compare: byte.get_bit(5),
            index: byte.get_bit(4),
            counting_enabled: byte.get_bit(3),
            power_loss: byte.get_bit(2),
            direction: if byte.get_bit(1) {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            },
            negative: byte.get_bit(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_bit() {
        assert_eq!(Status::from_byte(0x02).direction, Direction::Clockwise);
        assert_eq!(
            Status::from_byte(0x00).direction,
            Direction::CounterClockwise
        );
    }

    #[test]
    fn sign_bit() {
        assert!(Status::from_byte(0x01).negative);
        assert!(!Status::from_byte(0xFE).negative);
    }

    #[test]
    fn flag_bits() {
        let status = Status::from_byte(0b1100_1100);
        assert!(status.carry);
        assert!(status.borrow);
        assert!(!status.compare);
        assert!(!status.index);
        assert!(status.counting_enabled);
        assert!(status.power_loss);
    }
}
