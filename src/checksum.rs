//! CRC-8 used by the HTU21D to protect every data word it returns.
//!
//! The generator polynomial is x^8 + x^5 + x^4 + 1 with a zero initial value.  The checksum is
//! computed bit by bit over the 16-bit word padded with eight zero bits, which is how the
//! datasheet describes it.

#[cfg(feature = "defmt")]
use defmt::Format;

/// x^8 + x^5 + x^4 + 1, aligned with the top bit of the padded 24-bit word
const POLYNOMIAL: u32 = 0x98_8000;
const MSB: u32 = 0x80_0000;
const MASK: u32 = 0xFF_8000;

/// The checksum received from the device does not match the data it accompanies
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CrcMismatch {
    /// checksum computed over the received word
    pub expected: u8,
    /// checksum sent by the device
    pub received: u8,
}

/// Compute the checksum of a 16-bit word
pub fn compute(value: u16) -> u8 {
    let mut polynomial = POLYNOMIAL;
    let mut msb = MSB;
    let mut mask = MASK;
    let mut result = (value as u32) << 8;

    while msb != 0x80 {
        if result & msb != 0 {
            result = ((result ^ polynomial) & mask) | (result & !mask);
        }
        msb >>= 1;
        mask >>= 1;
        polynomial >>= 1;
    }
    // all bits above the low byte have been divided out
    result as u8
}

/// Check a received word against the checksum sent with it
pub fn check(value: u16, crc: u8) -> Result<(), CrcMismatch> {
    let expected = compute(value);
    if expected == crc {
        Ok(())
    } else {
        Err(CrcMismatch { expected, received: crc })
    }
}
