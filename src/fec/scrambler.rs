//! CCSDS pseudo-randomizer.
//!
//! The sequence comes from the polynomial h(x) = x^8 + x^7 + x^5 + x^3 + 1 with the register
//! seeded to all ones. Scrambling XORs a buffer with the sequence, so applying it twice gives the
//! original bytes back.

use crate::MAX_FEC_LEN;

/// Length of the sequence held by a [`Scrambler`], one byte per frame byte.
pub const SEQUENCE_LEN: usize = MAX_FEC_LEN;

/// Generates the first `N` bytes of the pseudo-random sequence, MSB first.
pub const fn generate<const N: usize>() -> [u8; N] {
    let mut sequence = [0u8; N];
    // Bit 0 is the output tap, new bits enter at bit 7
    let mut lfsr: u8 = 0xff;

    let mut i = 0;
    while i < N * 8 {
        sequence[i / 8] |= (lfsr & 1) << (7 - i % 8);
        let feedback = (lfsr >> 7) ^ (lfsr >> 5) ^ (lfsr >> 3) ^ lfsr;
        lfsr = (lfsr >> 1) | ((feedback & 1) << 7);
        i += 1;
    }

    sequence
}

/// Owns the pseudo-random sequence and applies it to frames.
#[derive(Clone)]
pub struct Scrambler {
    sequence: [u8; SEQUENCE_LEN],
}

impl Scrambler {
    /// Creates a new `Scrambler`. The sequence is computed at compile time.
    pub const fn new() -> Self {
        Self {
            sequence: generate(),
        }
    }

    /// The sequence this scrambler XORs with.
    pub fn sequence(&self) -> &[u8; SEQUENCE_LEN] {
        &self.sequence
    }

    /// XORs the first `len` bytes of `buf` with the sequence, in place.
    ///
    /// `len` is clamped to the buffer and to [`SEQUENCE_LEN`].
    pub fn apply(&self, buf: &mut [u8], len: usize) {
        buf.iter_mut()
            .take(len)
            .zip(self.sequence.iter())
            .for_each(|(byte, mask)| *byte ^= mask);
    }
}

impl Default for Scrambler {
    fn default() -> Self {
        Self::new()
    }
}
