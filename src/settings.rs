//! Typed views of the two mode registers, MDR0 and MDR1.
//!
//! Both registers are single bytes of packed fields. The structs here carry
//! the fields as enums and booleans and convert to and from the register
//! byte; the driver caches the last value written so the active mode can be
//! queried without a bus transfer.

use bit_field::BitField;

/// Quadrature multiplication factor.
///
/// Selects how many counts each full quadrature cycle produces, or disables
/// quadrature decoding entirely (channel A becomes a bare clock and channel
/// B a direction input).
///
/// ## Datasheet
///
/// MDR0 bits B1..B0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QuadCountMode {
    /// Non-quadrature: A is the count clock, B the direction.
    NonQuad,
    /// One count per quadrature cycle.
    #[default]
    X1,
    /// Two counts per quadrature cycle.
    X2,
    /// Four counts per quadrature cycle.
    X4,
}

#[doc(hidden)]
impl From<u8> for QuadCountMode {
    fn from(value: u8) -> Self {
        assert!(value <= 0b11, "Invalid bit pattern for quadrature mode.");
        match value {
            0b00 => Self::NonQuad,
            0b01 => Self::X1,
            0b10 => Self::X2,
            0b11 => Self::X4,
            _ => unreachable!("Precondition assert covers > 3."),
        }
    }
}

#[doc(hidden)]
impl From<QuadCountMode> for u8 {
    fn from(value: QuadCountMode) -> u8 {
        match value {
            QuadCountMode::NonQuad => 0b00,
            QuadCountMode::X1 => 0b01,
            QuadCountMode::X2 => 0b10,
            QuadCountMode::X4 => 0b11,
        }
    }
}

/// Count-limit behaviour of the counter.
///
/// ## Datasheet
///
/// MDR0 bits B3..B2. The range-limit and modulo-n modes take their bounds
/// from DTR (see [`Ls7366r::write_preset`]).
///
/// [`Ls7366r::write_preset`]: crate::Ls7366r::write_preset
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleCountMode {
    /// Count freely over the full register range, wrapping at the ends.
    #[default]
    FreeRunning,
    /// Count once up to the limit (or down to zero), then stop.
    SingleCycle,
    /// Count only between zero and the DTR value.
    RangeLimit,
    /// Count modulo DTR + 1.
    ModuloN,
}

#[doc(hidden)]
impl From<u8> for CycleCountMode {
    fn from(value: u8) -> Self {
        assert!(value <= 0b11, "Invalid bit pattern for cycle count mode.");
        match value {
            0b00 => Self::FreeRunning,
            0b01 => Self::SingleCycle,
            0b10 => Self::RangeLimit,
            0b11 => Self::ModuloN,
            _ => unreachable!("Precondition assert covers > 3."),
        }
    }
}

#[doc(hidden)]
impl From<CycleCountMode> for u8 {
    fn from(value: CycleCountMode) -> u8 {
        match value {
            CycleCountMode::FreeRunning => 0b00,
            CycleCountMode::SingleCycle => 0b01,
            CycleCountMode::RangeLimit => 0b10,
            CycleCountMode::ModuloN => 0b11,
        }
    }
}

/// Effect of a pulse on the index input.
///
/// ## Datasheet
///
/// MDR0 bits B5..B4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndexMode {
    /// Ignore the index input.
    #[default]
    Disabled,
    /// An index pulse copies DTR into CNTR.
    LoadCntr,
    /// An index pulse clears CNTR.
    ResetCntr,
    /// An index pulse copies CNTR into OTR.
    LoadOtr,
}

#[doc(hidden)]
impl From<u8> for IndexMode {
    fn from(value: u8) -> Self {
        assert!(value <= 0b11, "Invalid bit pattern for index mode.");
        match value {
            0b00 => Self::Disabled,
            0b01 => Self::LoadCntr,
            0b10 => Self::ResetCntr,
            0b11 => Self::LoadOtr,
            _ => unreachable!("Precondition assert covers > 3."),
        }
    }
}

#[doc(hidden)]
impl From<IndexMode> for u8 {
    fn from(value: IndexMode) -> u8 {
        match value {
            IndexMode::Disabled => 0b00,
            IndexMode::LoadCntr => 0b01,
            IndexMode::ResetCntr => 0b10,
            IndexMode::LoadOtr => 0b11,
        }
    }
}

/// Division factor applied to the filter clock that debounces the
/// quadrature inputs.
///
/// ## Datasheet
///
/// MDR0 bit B7.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterClockDivision {
    /// Filter clock frequency = fCKi.
    One,
    /// Filter clock frequency = fCKi / 2.
    #[default]
    Two,
}

#[doc(hidden)]
impl From<bool> for FilterClockDivision {
    fn from(value: bool) -> Self {
        if value { Self::Two } else { Self::One }
    }
}

#[doc(hidden)]
impl From<FilterClockDivision> for bool {
    fn from(value: FilterClockDivision) -> bool {
        matches!(value, FilterClockDivision::Two)
    }
}

/// Mode register 0: how the chip counts.
///
/// The default matches the driver's power-up configuration: x1 quadrature,
/// free-running, index ignored, asynchronous index, filter clock divided
/// by two.
///
/// ## Datasheet
///
/// See the MDR0 register description for the field layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mdr0 {
    /// Quadrature multiplication factor.
    pub quad_mode: QuadCountMode,
    /// Count-limit behaviour.
    pub cycle_mode: CycleCountMode,
    /// Index input behaviour.
    pub index_mode: IndexMode,
    /// Synchronise the index input with the filter clock.
    ///
    /// Only meaningful in quadrature modes; the index is always
    /// asynchronous in non-quadrature mode.
    pub synchronous_index: bool,
    /// Filter clock division factor.
    pub filter_division: FilterClockDivision,
}

#[doc(hidden)]
impl From<u8> for Mdr0 {
    fn from(value: u8) -> Self {
        Self {
            quad_mode: value.get_bits(0..=1).into(),
            cycle_mode: value.get_bits(2..=3).into(),
            index_mode: value.get_bits(4..=5).into(),
            synchronous_index: value.get_bit(6),
            filter_division: value.get_bit(7).into(),
        }
    }
}

#[doc(hidden)]
impl From<Mdr0> for u8 {
    fn from(value: Mdr0) -> u8 {
        let mut byte = 0u8;
        byte.set_bits(0..=1, value.quad_mode.into());
        byte.set_bits(2..=3, value.cycle_mode.into());
        byte.set_bits(4..=5, value.index_mode.into());
        byte.set_bit(6, value.synchronous_index);
        byte.set_bit(7, value.filter_division.into());
        byte
    }
}

/// Number of bytes the counter occupies on the wire.
///
/// The width is fixed when the driver is constructed; every CNTR/OTR/DTR
/// transfer moves exactly this many data bytes.
///
/// ## Datasheet
///
/// MDR1 bits B1..B0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterWidth {
    /// One-byte counter.
    One,
    /// Two-byte counter.
    Two,
    /// Three-byte counter.
    Three,
    /// Four-byte counter.
    #[default]
    Four,
}

impl CounterWidth {
    /// Number of data bytes moved per counter transfer.
    pub fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

#[doc(hidden)]
impl From<u8> for CounterWidth {
    fn from(value: u8) -> Self {
        assert!(value <= 0b11, "Invalid bit pattern for counter width.");
        match value {
            0b00 => Self::Four,
            0b01 => Self::Three,
            0b10 => Self::Two,
            0b11 => Self::One,
            _ => unreachable!("Precondition assert covers > 3."),
        }
    }
}

#[doc(hidden)]
impl From<CounterWidth> for u8 {
    fn from(value: CounterWidth) -> u8 {
        match value {
            CounterWidth::Four => 0b00,
            CounterWidth::Three => 0b01,
            CounterWidth::Two => 0b10,
            CounterWidth::One => 0b11,
        }
    }
}

/// Mode register 1: counter width, count enable and flag routing.
///
/// The flag fields route chip events to the FLAG output pin; they do not
/// affect counting.
///
/// ## Datasheet
///
/// See the MDR1 register description for the field layout. B2 is a
/// *disable* bit on the wire; it is inverted here so that the struct reads
/// the way callers think about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mdr1 {
    /// Counter byte width.
    pub width: CounterWidth,
    /// Whether the counter advances on quadrature input.
    pub counting_enabled: bool,
    /// Assert FLAG on an index event.
    pub flag_on_index: bool,
    /// Assert FLAG on a compare (CNTR == DTR) event.
    pub flag_on_compare: bool,
    /// Assert FLAG on borrow (underflow past zero).
    pub flag_on_borrow: bool,
    /// Assert FLAG on carry (overflow past the top of the range).
    pub flag_on_carry: bool,
}

impl Default for Mdr1 {
    fn default() -> Self {
        Self {
            width: CounterWidth::default(),
            counting_enabled: true,
            flag_on_index: false,
            flag_on_compare: false,
            flag_on_borrow: false,
            flag_on_carry: false,
        }
    }
}

#[doc(hidden)]
impl From<u8> for Mdr1 {
    fn from(value: u8) -> Self {
        Self {
            width: value.get_bits(0..=1).into(),
            counting_enabled: !value.get_bit(2),
            flag_on_index: value.get_bit(4),
            flag_on_compare: value.get_bit(5),
            flag_on_borrow: value.get_bit(6),
            flag_on_carry: value.get_bit(7),
        }
    }
}

#[doc(hidden)]
impl From<Mdr1> for u8 {
    fn from(value: Mdr1) -> u8 {
        let mut byte = 0u8;
        byte.set_bits(0..=1, value.width.into());
        byte.set_bit(2, !value.counting_enabled);
        byte.set_bit(4, value.flag_on_index);
        byte.set_bit(5, value.flag_on_compare);
        byte.set_bit(6, value.flag_on_borrow);
        byte.set_bit(7, value.flag_on_carry);
        byte
    }
}
