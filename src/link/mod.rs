//! Contract with the radio-link driver that moves frames to and from the transceiver.
//!
//! The codec itself never touches a transport. A driver implements [`RadioLink`], and
//! [`transmit_payload`] / [`receive_payload`] run frames through the codec on top of it. The
//! control vocabulary and register helpers below describe what such a driver sends over the
//! control endpoint.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use snafu::Snafu;

use crate::buffer::BytesReader;
use crate::{Deframed, FecConfig, FecError, FrameCodec};

mod bulk;
pub use bulk::*;

mod rssi;
pub use rssi::*;

/// Control requests understood by the transceiver firmware.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ControlRequest {
    Register = 0x01,
    Frequency = 0x02,
    ModIndex = 0x03,
    CsmaRssi = 0x04,
    Power = 0x05,
    Afc = 0x06,
    IfBandwidth = 0x07,
    Training = 0x08,
    SyncWord = 0x09,
    RxTxMode = 0x0A,
    Bitrate = 0x0B,
    Reset = 0xFE,
    Dfu = 0xFF,
}

/// Transceiver registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    N = 0,
    VcoOsc = 1,
    TxMod = 2,
    TxRxClock = 3,
    Demod = 4,
    IfFilter = 5,
    IfFineCal = 6,
    Readback = 7,
    PowerDown = 8,
    Agc = 9,
    Afc = 10,
    SyncWord = 11,
    SyncWordThreshold = 12,
    Fsk3Fsk4 = 13,
    TestDac = 14,
    TestMode = 15,
}

/// Values read back through the readback register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ReadbackSelect {
    Rssi = 0x0014,
    Afc = 0x0016,
    Version = 0x001c,
}

/// A transceiver setting together with its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
    /// Carrier frequency in Hz
    Frequency(u32),
    /// Bits per second
    Bitrate(u16),
    Power(u8),
    ModIndex(u8),
    /// Preamble length in bytes, see [`training_bytes`]
    Training(u8),
    /// Carrier-sense threshold
    CsmaRssi(i16),
}

impl Setting {
    /// The control request that reads or writes this setting.
    pub const fn request(&self) -> ControlRequest {
        match self {
            Self::Frequency(_) => ControlRequest::Frequency,
            Self::Bitrate(_) => ControlRequest::Bitrate,
            Self::Power(_) => ControlRequest::Power,
            Self::ModIndex(_) => ControlRequest::ModIndex,
            Self::Training(_) => ControlRequest::Training,
            Self::CsmaRssi(_) => ControlRequest::CsmaRssi,
        }
    }

    /// Writes the value payload into `buf` and returns the number of bytes used.
    pub fn encode(&self, buf: &mut [u8; 4]) -> usize {
        let (bytes, len) = match *self {
            Self::Frequency(hz) => (hz.to_le_bytes(), 4),
            Self::Bitrate(bps) => (u32::from(bps).to_le_bytes(), 2),
            Self::Power(v) | Self::ModIndex(v) | Self::Training(v) => ([v, 0, 0, 0], 1),
            Self::CsmaRssi(level) => (i32::from(level).to_le_bytes(), 2),
        };
        buf.copy_from_slice(&bytes);
        len
    }

    /// Parses the value payload returned for `request`.
    ///
    /// Returns `None` if `request` is not a setting or the payload is too short.
    pub fn decode(request: ControlRequest, data: &[u8]) -> Option<Self> {
        let mut reader = BytesReader::new(data);
        let setting = match request {
            ControlRequest::Frequency => Self::Frequency(u32::from_le_bytes(reader.next_array()?)),
            ControlRequest::Bitrate => Self::Bitrate(u16::from_le_bytes(reader.next_array()?)),
            ControlRequest::Power => Self::Power(reader.next_u8()?),
            ControlRequest::ModIndex => Self::ModIndex(reader.next_u8()?),
            ControlRequest::Training => Self::Training(reader.next_u8()?),
            ControlRequest::CsmaRssi => Self::CsmaRssi(reader.next_i16_le()?),
            _ => return None,
        };
        Some(setting)
    }
}

/// Payload of a register write: the register index replaces the low byte of `value`.
pub fn register_write_word(register: Register, value: u32) -> [u8; 4] {
    ((value & !0xff) | u32::from(u8::from(register))).to_le_bytes()
}

/// Register value from the payload of a register read.
pub fn register_read_value(word: [u8; 4]) -> u16 {
    (u32::from_le_bytes(word) & 0xffff) as u16
}

/// Preamble bytes needed to train the receiver for `ms` milliseconds at `bitrate` bits/s.
///
/// Returns `None` if the preamble does not fit the one-byte [`Setting::Training`] value.
pub fn training_bytes(ms: u32, bitrate: u16) -> Option<u8> {
    let bytes = u64::from(ms) * u64::from(bitrate) / 1000 / 8;
    u8::try_from(bytes).ok()
}

/// Duration of `bytes` preamble bytes at `bitrate` bits/s, in milliseconds.
///
/// Returns `None` for a zero bitrate or if the duration overflows.
pub fn training_ms(bytes: u32, bitrate: u16) -> Option<u32> {
    bytes
        .checked_mul(8 * 1000)?
        .checked_div(u32::from(bitrate))
}

/// Enum of driver-level failures. These never come from the codec.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    #[snafu(display("Timed out waiting for the transceiver"))]
    Timeout,
    #[snafu(display("Malformed bulk frame of {len} bytes"))]
    MalformedFrame { len: usize },
    #[snafu(display("Frame of {len} bytes does not fit the {max} byte endpoint"))]
    Oversized { len: usize, max: usize },
    #[snafu(display("Transceiver I/O failure"))]
    Device,
}

/// Failure of a send or receive through a [`RadioLink`], keeping link and codec failures apart.
///
/// New kinds of failure may be added, so matches outside this crate need a wildcard arm:
/// ```compile_fail
/// use radiofec::link::ExchangeError;
///
/// fn is_link(err: ExchangeError) -> bool {
///     match err {
///         ExchangeError::Link { .. } => true,
///         ExchangeError::Fec { .. } => false,
///     }
/// }
/// ```
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExchangeError {
    #[snafu(display("Link error: {source}"))]
    Link { source: LinkError },
    #[snafu(display("Codec error: {source}"))]
    Fec { source: FecError },
}

impl From<LinkError> for ExchangeError {
    fn from(source: LinkError) -> Self {
        Self::Link { source }
    }
}

impl From<FecError> for ExchangeError {
    fn from(source: FecError) -> Self {
        Self::Fec { source }
    }
}

/// Raw byte transport to the transceiver.
pub trait RadioLink {
    /// Queues wire bytes for transmission.
    fn transmit(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Waits for the next received record.
    fn receive(&mut self) -> Result<BulkFrame, LinkError>;
}

/// Encodes `payload` and hands it to `link`.
pub fn transmit_payload<L: RadioLink>(
    link: &mut L,
    codec: &FrameCodec,
    payload: &[u8],
    config: FecConfig,
) -> Result<(), ExchangeError> {
    let wire = codec.frame(payload, config)?;
    link.transmit(&wire)?;
    Ok(())
}

/// Receives the next record from `link` and decodes it.
///
/// The record is returned as well, for its RSSI and frequency fields.
pub fn receive_payload<L: RadioLink>(
    link: &mut L,
    codec: &FrameCodec,
    config: FecConfig,
) -> Result<(Deframed, BulkFrame), ExchangeError> {
    let frame = link.receive()?;
    let deframed = codec.deframe(frame.data(), config)?;
    Ok((deframed, frame))
}

#[cfg(test)]
mod tests {
    use super::{
        receive_payload, register_read_value, register_write_word, training_bytes, training_ms,
        transmit_payload, BulkFrame, ControlRequest, ExchangeError, LinkError, RadioLink,
        ReadbackSelect, Register, Setting,
    };
    use crate::{FecConfig, FecError, FrameCodec};

    /// Link that hands every transmitted record back on the next receive.
    struct Loopback {
        pending: Option<BulkFrame>,
        flip_bit: Option<usize>,
    }

    impl RadioLink for Loopback {
        fn transmit(&mut self, data: &[u8]) -> Result<(), LinkError> {
            let mut frame = BulkFrame::new(data)?;
            if let Some(bit) = self.flip_bit {
                frame.data_mut()[bit / 8] ^= 0x80 >> (bit % 8);
            }
            self.pending = Some(frame);
            Ok(())
        }

        fn receive(&mut self) -> Result<BulkFrame, LinkError> {
            self.pending.take().ok_or(LinkError::Timeout)
        }
    }

    #[test]
    fn test_control_request_codes() {
        assert_eq!(u8::from(ControlRequest::Bitrate), 0x0b);
        assert_eq!(ControlRequest::try_from(0xff), Ok(ControlRequest::Dfu));
        assert!(ControlRequest::try_from(0x0c).is_err());
        assert_eq!(u16::from(ReadbackSelect::Version), 0x1c);
        assert_eq!(Register::try_from(15), Ok(Register::TestMode));
    }

    #[test]
    fn test_register_words() {
        assert_eq!(
            register_write_word(Register::TestMode, 5 << 8),
            [0x0f, 0x05, 0x00, 0x00]
        );
        // The low byte of the value is replaced by the register index
        assert_eq!(
            register_write_word(Register::Agc, 0x1234_56ff),
            [0x09, 0x56, 0x34, 0x12]
        );
        assert_eq!(register_read_value([0x34, 0x12, 0xff, 0xff]), 0x1234);
    }

    #[test]
    fn test_setting_payloads() {
        let mut buf = [0xff; 4];
        let setting = Setting::Frequency(437_525_000);
        assert_eq!(setting.encode(&mut buf), 4);
        assert_eq!(buf, [0x08, 0x1a, 0x14, 0x1a]);
        assert_eq!(Setting::decode(setting.request(), &buf), Some(setting));

        assert_eq!(Setting::Bitrate(9600).encode(&mut buf), 2);
        assert_eq!(&buf[..2], &[0x80, 0x25]);

        assert_eq!(Setting::CsmaRssi(-90).encode(&mut buf), 2);
        assert_eq!(&buf[..2], &[0xa6, 0xff]);
        assert_eq!(
            Setting::decode(ControlRequest::CsmaRssi, &buf[..2]),
            Some(Setting::CsmaRssi(-90))
        );

        assert_eq!(Setting::Training(30).encode(&mut buf), 1);
        assert_eq!(Setting::Training(30).request(), ControlRequest::Training);
        assert_eq!(Setting::decode(ControlRequest::Bitrate, &[0x80]), None);
        assert_eq!(Setting::decode(ControlRequest::Reset, &buf), None);
    }

    #[test]
    fn test_training_conversions() {
        assert_eq!(training_bytes(100, 2400), Some(30));
        assert_eq!(training_ms(30, 2400), Some(100));
        assert_eq!(training_ms(30, 0), None);

        let bytes = training_bytes(100, 2400).unwrap();
        assert_eq!(
            Setting::Training(bytes).request(),
            ControlRequest::Training
        );
    }

    #[test]
    fn test_training_conversions_at_limits() {
        // Largest preamble the one-byte setting can hold
        assert_eq!(training_bytes(851, 2400), Some(255));
        assert_eq!(training_bytes(854, 2400), None);
        // The product would overflow 32 bits
        assert_eq!(training_bytes(70_000, 65_535), None);

        assert_eq!(training_ms(536_870, 9600), Some(447_391));
        assert_eq!(training_ms(600_000, 9600), None);
    }

    #[test]
    fn test_exchange_over_loopback() {
        let codec = FrameCodec::new();
        let mut link = Loopback {
            pending: None,
            flip_bit: Some(77),
        };
        let payload = [0x00, 0x06, 0x10, 0x20, 0x30, 0x40, 0x00, 0x00];

        transmit_payload(&mut link, &codec, &payload, FecConfig::default()).unwrap();
        let (deframed, frame) = receive_payload(&mut link, &codec, FecConfig::default()).unwrap();

        assert_eq!(deframed.payload.as_slice(), &payload);
        assert_eq!(deframed.stats.bit_corrections, Some(1));
        assert_eq!(frame.data().len(), (payload.len() + 32 + 1) * 2);
    }

    #[test]
    fn test_exchange_errors_stay_apart() {
        let codec = FrameCodec::new();
        let mut link = Loopback {
            pending: None,
            flip_bit: None,
        };

        assert_eq!(
            receive_payload(&mut link, &codec, FecConfig::default()),
            Err(ExchangeError::Link {
                source: LinkError::Timeout
            })
        );

        link.pending = Some(BulkFrame::new(&[0x42]).unwrap());
        assert_eq!(
            receive_payload(&mut link, &codec, FecConfig::default()),
            Err(ExchangeError::Fec {
                source: FecError::TruncatedFrame { len: 1, min: 2 }
            })
        );
    }
}
