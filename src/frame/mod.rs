use crate::fec::{convolutional, reed_solomon, Scrambler};
use crate::{FecError, FrameBuf, WireBuf, MAX_PAYLOAD_LEN};

mod trailer;
pub use trailer::*;

/// Struct for selecting which stages a `FrameCodec` runs.
///
/// Both ends of a link must use the same configuration.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FecConfig {
    /// Rate 1/2 convolutional code. Default is `true`.
    pub viterbi: bool,
    /// Reed-Solomon parity. Default is `true`.
    pub reed_solomon: bool,
    /// CCSDS randomizer. Default is `true`.
    pub randomize: bool,
}

impl FecConfig {
    pub const fn new(viterbi: bool, reed_solomon: bool, randomize: bool) -> Self {
        Self {
            viterbi,
            reed_solomon,
            randomize,
        }
    }

    pub const fn default() -> Self {
        Self::new(true, true, true)
    }

    /// Every stage off. Frames pass through unchanged.
    pub const fn disabled() -> Self {
        Self::new(false, false, false)
    }
}

/// Correction counters from a successful deframe. A stage that did not run reports `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeStats {
    /// Channel bits corrected by the Viterbi decoder.
    pub bit_corrections: Option<u32>,
    /// Symbols corrected by the Reed-Solomon decoder.
    pub symbol_corrections: Option<usize>,
}

/// A recovered payload together with the correction counters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deframed {
    pub payload: FrameBuf,
    pub stats: DecodeStats,
}

/// Applies and removes the forward error correction stages of a frame.
///
/// Encoding order is Reed-Solomon, randomizer, convolutional code; decoding runs the mirror
/// image. The codec holds only the immutable randomizer sequence, so one instance can serve any
/// number of callers.
#[derive(Clone, Default)]
pub struct FrameCodec {
    scrambler: Scrambler,
}

impl FrameCodec {
    /// Creates a new `FrameCodec`.
    pub const fn new() -> Self {
        Self {
            scrambler: Scrambler::new(),
        }
    }

    /// Encodes `payload` into a wire frame.
    ///
    /// Fails with `OversizedInput` if `payload` is longer than [`MAX_PAYLOAD_LEN`], whatever
    /// stages are enabled.
    pub fn frame(&self, payload: &[u8], config: FecConfig) -> Result<WireBuf, FecError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FecError::OversizedInput {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut block = FrameBuf::from_slice(payload)?;

        if config.reed_solomon {
            let mut parity = [0u8; reed_solomon::PARITY_LEN];
            reed_solomon::encode(&block, &mut parity);
            block.push_bytes(&parity)?;
        }

        if config.randomize {
            let len = block.len();
            self.scrambler.apply(block.as_mut_slice(), len);
        }

        let mut wire = WireBuf::new();
        if config.viterbi {
            let len = convolutional::encode(&block, wire.storage_mut())?;
            wire.set_len(len);
        } else {
            wire.push_bytes(&block)?;
        }

        Ok(wire)
    }

    /// Decodes a wire frame back into its payload.
    ///
    /// The Reed-Solomon parity is trimmed from the end of the frame. Correction counters are
    /// returned with the payload.
    pub fn deframe(&self, wire: &[u8], config: FecConfig) -> Result<Deframed, FecError> {
        let mut stats = DecodeStats::default();

        let mut block = if config.viterbi {
            let mut block = FrameBuf::new();
            let (len, corrected) = convolutional::decode(wire, block.storage_mut())?;
            block.set_len(len);
            stats.bit_corrections = Some(corrected);
            block
        } else {
            FrameBuf::from_slice(wire)?
        };

        if config.randomize {
            let len = block.len();
            self.scrambler.apply(block.as_mut_slice(), len);
        }

        if config.reed_solomon {
            let corrected = match reed_solomon::decode(block.as_mut_slice()) {
                Ok(corrected) => corrected,
                Err(err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Dropping frame of {=usize} bytes: {}", block.len(), err);
                    return Err(err);
                }
            };
            block.truncate(block.len() - reed_solomon::PARITY_LEN);
            stats.symbol_corrections = Some(corrected);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Deframed {=usize} bytes, {}", block.len(), stats);

        Ok(Deframed {
            payload: block,
            stats,
        })
    }
}
