/// Problems when communicating with the LS7366R.
///
/// The type parameter is the error type of the underlying [`Transport`]:
/// a pin error for the bit-banged transport, the SPI bus error for the
/// hardware transport.
///
/// Note what is *not* here: the chip has no way to signal a failed shift,
/// so a transfer that toggled its lines without a transport fault always
/// "succeeds". An absent or miswired chip surfaces as implausible or stuck
/// readings, which only the caller has enough context to recognise.
///
/// [`Transport`]: crate::transport::Transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport failed to drive or sample its lines.
    Transport(E),
}
