use snafu::Snafu;

/// Enum of codec errors.
///
/// Every stage of the frame codec reports its failures through this type; a block that the
/// Reed-Solomon stage cannot repair is an ordinary value here, not a panic.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FecError {
    #[snafu(display("Input of {len} bytes exceeds the capacity of {max} bytes"))]
    OversizedInput { len: usize, max: usize },
    #[snafu(display("Frame of {len} bytes is shorter than the minimum of {min} bytes"))]
    TruncatedFrame { len: usize, min: usize },
    #[snafu(display("Reed-Solomon block has more symbol errors than can be corrected"))]
    UncorrectableBlock,
    #[snafu(display("Buffer of {len} bytes cannot carry a length prefix and trailer"))]
    MalformedTrailer { len: usize },
    #[snafu(display("Output buffer too small: need {needed} bytes, have {available}"))]
    BufferTooSmall { needed: usize, available: usize },
}
