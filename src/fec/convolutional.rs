//! Rate 1/2, constraint length 7 convolutional code with a hard-decision Viterbi decoder.
//!
//! The encoder takes the new bit into the low end of a 7-bit shift register and emits two
//! symbols per bit: the parity of the register under [`POLY_A`], then the inverted parity under
//! [`POLY_B`]. Every frame is flushed with [`TAIL`] zero bytes, so a frame of `n` bytes goes out
//! as `(n + TAIL) * RATE` bytes.
//!
//! Decoding is a three-phase protocol on a [`ViterbiDecoder`]: [`reset`](ViterbiDecoder::reset),
//! [`accumulate`](ViterbiDecoder::accumulate), then [`traceback`](ViterbiDecoder::traceback).
//! [`decode`] runs all three on a fresh decoder and is what the frame codec uses.

use crate::{FecError, MAX_FEC_LEN};

/// Output symbols per input bit.
pub const RATE: usize = 2;
/// Zero bytes appended by the encoder to flush the shift register.
pub const TAIL: usize = 1;
/// Number of input bits the encoder output depends on.
pub const CONSTRAINT: usize = 7;
/// Generator for the first symbol of each pair.
pub const POLY_A: u8 = 0x4f;
/// Generator for the second symbol of each pair. That symbol is sent inverted.
pub const POLY_B: u8 = 0x6d;

const STATES: usize = 1 << (CONSTRAINT - 1);
const FLUSH_BITS: usize = CONSTRAINT - 1;
/// Largest number of trellis steps one decode can hold.
pub const MAX_DECODE_BITS: usize = MAX_FEC_LEN * 8 + FLUSH_BITS;

// Start metric for states the encoder cannot be in yet. Leaves room for every step to add 2.
const UNREACHABLE: u32 = u32::MAX / 4;

/// Encoded length of a frame of `len` bytes.
pub const fn encoded_len(len: usize) -> usize {
    (len + TAIL) * RATE
}

/// Frame length carried by `len` received bytes, or `None` if there is no room for the tail.
pub const fn decoded_len(len: usize) -> Option<usize> {
    (len / RATE).checked_sub(TAIL)
}

#[inline]
const fn parity(x: u8) -> u8 {
    (x.count_ones() & 1) as u8
}

/// The symbol pair emitted for a 7-bit register value.
#[inline]
const fn branch_symbols(reg: u8) -> (u8, u8) {
    (parity(reg & POLY_A), parity(reg & POLY_B) ^ 1)
}

#[inline]
fn bit_at(data: &[u8], idx: usize) -> u8 {
    (data[idx / 8] >> (7 - idx % 8)) & 1
}

#[inline]
fn set_bit(data: &mut [u8], idx: usize) {
    data[idx / 8] |= 0x80 >> (idx % 8);
}

/// Convolutionally encodes `input` into `output`, tail included. Returns the encoded length.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize, FecError> {
    let needed = encoded_len(input.len());
    let available = output.len();
    let output = output
        .get_mut(..needed)
        .ok_or(FecError::BufferTooSmall { needed, available })?;
    output.fill(0);

    let bits = input
        .iter()
        .chain(&[0u8; TAIL])
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1));

    let mut reg = 0u8;
    for (i, bit) in bits.enumerate() {
        reg = ((reg << 1) | bit) & 0x7f;
        let (a, b) = branch_symbols(reg);
        if a != 0 {
            set_bit(output, 2 * i);
        }
        if b != 0 {
            set_bit(output, 2 * i + 1);
        }
    }

    Ok(needed)
}

/// Decodes a received frame into `output`, returning the frame length and the number of
/// channel bit errors the decoder corrected.
///
/// The trellis lives on the stack for the duration of the call (about 16 KiB).
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<(usize, u32), FecError> {
    let len = decoded_len(input.len()).ok_or(FecError::TruncatedFrame {
        len: input.len(),
        min: encoded_len(0),
    })?;
    if len > MAX_FEC_LEN {
        return Err(FecError::OversizedInput {
            len,
            max: MAX_FEC_LEN,
        });
    }
    let available = output.len();
    let output = output.get_mut(..len).ok_or(FecError::BufferTooSmall {
        needed: len,
        available,
    })?;

    let mut decoder = ViterbiDecoder::new();
    decoder.accumulate(input, len * 8 + FLUSH_BITS)?;
    let corrected = decoder.traceback(len * 8, output);

    Ok((len, corrected))
}

/// Trellis state for one Viterbi decode.
///
/// Holds a path metric per encoder state and one decision word per trellis step. A decoder is
/// not re-entrant: finish (or abandon) one frame before feeding the next.
#[derive(Clone)]
pub struct ViterbiDecoder {
    metrics: [u32; STATES],
    // Bit `s` of step `t` is the high bit of the predecessor chosen for state `s`
    decisions: [u64; MAX_DECODE_BITS],
    steps: usize,
}

impl ViterbiDecoder {
    /// Creates a decoder in the reset state.
    pub const fn new() -> Self {
        let mut metrics = [UNREACHABLE; STATES];
        metrics[0] = 0;
        Self {
            metrics,
            decisions: [0; MAX_DECODE_BITS],
            steps: 0,
        }
    }

    /// Clears the path metrics. The encoder is assumed to start in state 0.
    pub fn reset(&mut self) {
        self.metrics = [UNREACHABLE; STATES];
        self.metrics[0] = 0;
        self.steps = 0;
    }

    /// Number of trellis steps accumulated since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Runs `bit_count` trellis steps over the symbol pairs at the start of `symbols`.
    ///
    /// Fails with `OversizedInput` if the steps would exceed [`MAX_DECODE_BITS`], and with
    /// `TruncatedFrame` if `symbols` holds fewer than `2 * bit_count` bits. Nothing is consumed
    /// on failure.
    pub fn accumulate(&mut self, symbols: &[u8], bit_count: usize) -> Result<(), FecError> {
        let total = self.steps + bit_count;
        if total > MAX_DECODE_BITS {
            return Err(FecError::OversizedInput {
                len: total,
                max: MAX_DECODE_BITS,
            });
        }
        let min = (bit_count * RATE).div_ceil(8);
        if symbols.len() < min {
            return Err(FecError::TruncatedFrame {
                len: symbols.len(),
                min,
            });
        }

        for t in 0..bit_count {
            let r0 = bit_at(symbols, 2 * t);
            let r1 = bit_at(symbols, 2 * t + 1);
            let branch_cost = |reg: u8| {
                let (a, b) = branch_symbols(reg);
                u32::from(a != r0) + u32::from(b != r1)
            };

            let mut next = [0u32; STATES];
            let mut decision = 0u64;
            for (state, metric) in next.iter_mut().enumerate() {
                // Both predecessors share the low five bits, the bit shifted out differs
                let low = state >> 1;
                let high = low | (STATES >> 1);
                let m0 = self.metrics[low] + branch_cost(state as u8);
                let m1 = self.metrics[high] + branch_cost(state as u8 | 0x40);
                if m1 < m0 {
                    *metric = m1;
                    decision |= 1u64 << state;
                } else {
                    *metric = m0;
                }
            }

            self.metrics = next;
            self.decisions[self.steps] = decision;
            self.steps += 1;
        }

        Ok(())
    }

    /// Follows the best path back from the most likely final state and writes the first
    /// `bit_count` decoded bits into `output`, MSB first.
    ///
    /// Returns the path metric of that state, which is the number of received symbols that
    /// disagree with the decoded sequence. Without a preceding [`accumulate`](Self::accumulate)
    /// the output is meaningless.
    pub fn traceback(&self, bit_count: usize, output: &mut [u8]) -> u32 {
        let bit_count = bit_count.min(self.steps).min(output.len() * 8);
        output[..bit_count.div_ceil(8)].fill(0);

        // Ties go to the lowest state, which is where a flushed encoder ends up
        let (mut state, corrected) = self
            .metrics
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, metric)| metric)
            .unwrap_or((0, 0));

        for t in (0..self.steps).rev() {
            if t < bit_count && state & 1 != 0 {
                set_bit(output, t);
            }
            let high = ((self.decisions[t] >> state) & 1) as usize;
            state = (state >> 1) | (high << (CONSTRAINT - 2));
        }

        corrected
    }
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, decoded_len, encode, encoded_len, ViterbiDecoder, MAX_DECODE_BITS};
    use crate::{FecError, MAX_FEC_LEN};

    const SAMPLE: [u8; 6] = [0x00, 0x01, 0xa5, 0x5a, 0xff, 0x80];

    #[test]
    fn test_lengths() {
        assert_eq!(encoded_len(0), 2);
        assert_eq!(encoded_len(MAX_FEC_LEN), 512);
        assert_eq!(decoded_len(512), Some(MAX_FEC_LEN));
        assert_eq!(decoded_len(3), Some(0));
        assert_eq!(decoded_len(1), None);
    }

    #[test]
    fn test_encode_known_vector() {
        let mut out = [0u8; 4];
        // A single one bit walks through the generator taps, then the register runs flat
        let len = encode(&[0x80], &mut out).unwrap();
        assert_eq!(len, 4);
        assert_eq!(out, [0xba, 0x49, 0x55, 0x55]);

        let len = encode(&[0x00], &mut out).unwrap();
        assert_eq!(len, 4);
        // All-zero input still toggles every second symbol
        assert_eq!(out, [0x55; 4]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut out = [0u8; 5];
        assert_eq!(
            encode(&SAMPLE, &mut out),
            Err(FecError::BufferTooSmall {
                needed: 14,
                available: 5
            })
        );
    }

    #[test]
    fn test_decode_clean() {
        let mut wire = [0u8; 14];
        encode(&SAMPLE, &mut wire).unwrap();

        let mut out = [0u8; 8];
        let (len, corrected) = decode(&wire, &mut out).unwrap();
        assert_eq!(len, SAMPLE.len());
        assert_eq!(&out[..len], &SAMPLE);
        assert_eq!(corrected, 0);
    }

    #[test]
    fn test_decode_single_bit_error() {
        let mut wire = [0u8; 14];
        encode(&SAMPLE, &mut wire).unwrap();

        for bit in [0, 9, 37, 80, 100] {
            let mut noisy = wire;
            noisy[bit / 8] ^= 0x80 >> (bit % 8);

            let mut out = [0u8; 6];
            let (len, corrected) = decode(&noisy, &mut out).unwrap();
            assert_eq!(&out[..len], &SAMPLE);
            assert_eq!(corrected, 1);
        }
    }

    #[test]
    fn test_decode_scattered_errors() {
        let data: [u8; 64] = core::array::from_fn(|i| (i * 37 + 11) as u8);
        let mut wire = [0u8; 130];
        encode(&data, &mut wire).unwrap();

        // Errors far apart compared to the constraint length
        for bit in (5..1000).step_by(97) {
            wire[bit / 8] ^= 0x80 >> (bit % 8);
        }

        let mut out = [0u8; 64];
        let (len, corrected) = decode(&wire, &mut out).unwrap();
        assert_eq!(len, 64);
        assert_eq!(out, data);
        assert_eq!(corrected, 11);
    }

    #[test]
    fn test_decode_buffer_too_small() {
        let mut wire = [0u8; 14];
        encode(&SAMPLE, &mut wire).unwrap();

        let mut out = [0u8; 4];
        assert_eq!(
            decode(&wire, &mut out),
            Err(FecError::BufferTooSmall {
                needed: 6,
                available: 4
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        let mut out = [0u8; 600];
        assert_eq!(
            decode(&[0x55], &mut out),
            Err(FecError::TruncatedFrame { len: 1, min: 2 })
        );
        assert_eq!(
            decode(&[0u8; 514], &mut out),
            Err(FecError::OversizedInput {
                len: 256,
                max: MAX_FEC_LEN
            })
        );
    }

    #[test]
    fn test_three_phase_protocol() {
        let mut wire = [0u8; 14];
        encode(&SAMPLE, &mut wire).unwrap();

        let mut decoder = ViterbiDecoder::new();
        let mut out = [0u8; 6];

        for _ in 0..2 {
            decoder.reset();
            decoder.accumulate(&wire, SAMPLE.len() * 8 + 6).unwrap();
            assert_eq!(decoder.steps(), 54);
            assert_eq!(decoder.traceback(SAMPLE.len() * 8, &mut out), 0);
            assert_eq!(out, SAMPLE);
        }
    }

    #[test]
    fn test_accumulate_in_pieces() {
        let mut wire = [0u8; 14];
        encode(&SAMPLE, &mut wire).unwrap();

        let mut decoder = ViterbiDecoder::new();
        decoder.accumulate(&wire[..4], 16).unwrap();
        decoder.accumulate(&wire[4..], 38).unwrap();

        let mut out = [0u8; 6];
        assert_eq!(decoder.traceback(48, &mut out), 0);
        assert_eq!(out, SAMPLE);
    }

    #[test]
    fn test_accumulate_capacity() {
        let mut decoder = ViterbiDecoder::new();
        let symbols = [0u8; 520];
        assert_eq!(
            decoder.accumulate(&symbols, MAX_DECODE_BITS + 1),
            Err(FecError::OversizedInput {
                len: MAX_DECODE_BITS + 1,
                max: MAX_DECODE_BITS
            })
        );
        assert_eq!(
            decoder.accumulate(&symbols[..3], 16),
            Err(FecError::TruncatedFrame { len: 3, min: 4 })
        );
        assert_eq!(decoder.steps(), 0);
    }
}
