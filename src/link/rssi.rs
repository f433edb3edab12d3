use bitfields::bitfield;

/// Gain correction per gain mode, in half-dB steps.
pub const GAIN_CORRECTION: [u8; 16] = [86, 0, 0, 0, 58, 38, 24, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// RSSI readback word of the transceiver.
#[bitfield(u16)]
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiReadback {
    /// Raw signal strength (LSB = 0.5 dB)
    #[bits(7)]
    raw_rssi: u8,
    /// Gain mode the receiver was in, indexes `GAIN_CORRECTION`
    #[bits(4)]
    gain_mode: u8,
    #[bits(5)]
    _reserved: u8,
}

impl RssiReadback {
    /// Signal strength in dBm, rounded half away from zero.
    pub fn dbm(&self) -> i16 {
        let correction = GAIN_CORRECTION[usize::from(self.gain_mode())];
        // Twice the dBm value: raw + correction in half dB, minus 130 dB
        let half_db = i16::from(self.raw_rssi()) + i16::from(correction) - 260;
        if half_db < 0 {
            (half_db - 1) / 2
        } else {
            (half_db + 1) / 2
        }
    }
}
