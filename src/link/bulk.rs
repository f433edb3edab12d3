//! Frames exchanged with the transceiver over its bulk data endpoints.
//!
//! Every transfer is a fixed 512-byte record, little-endian:
//!
//! +------+----------+------+------+-------+----------+-----------+
//! | size | progress | rssi | freq | flags | training | data[502] |
//! | u16  |   u16    | i16  | i16  |  u8   |    u8    |           |
//! +------+----------+------+------+-------+----------+-----------+

use crate::buffer::BytesReader;
use crate::link::LinkError;

/// Length of a bulk record.
pub const BULK_FRAME_LEN: usize = 512;
/// Room for frame bytes in a bulk record.
pub const BULK_DATA_LEN: usize = 502;
const HEADER_LEN: usize = BULK_FRAME_LEN - BULK_DATA_LEN;

/// One bulk endpoint record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BulkFrame {
    pub progress: u16,
    /// Raw RSSI of the received frame
    pub rssi: i16,
    /// Frequency offset reported by the AFC loop
    pub freq: i16,
    pub flags: u8,
    pub training: u8,
    size: u16,
    data: [u8; BULK_DATA_LEN],
}

impl BulkFrame {
    /// Wraps frame bytes for transmission. Header fields other than `size` are zero.
    pub fn new(data: &[u8]) -> Result<Self, LinkError> {
        let mut buf = [0u8; BULK_DATA_LEN];
        buf.get_mut(..data.len())
            .ok_or(LinkError::Oversized {
                len: data.len(),
                max: BULK_DATA_LEN,
            })?
            .copy_from_slice(data);

        Ok(Self {
            progress: 0,
            rssi: 0,
            freq: 0,
            flags: 0,
            training: 0,
            size: data.len() as u16,
            data: buf,
        })
    }

    /// Parses a record read from the data endpoint.
    ///
    /// The record may be cut short after the last data byte, but not earlier.
    pub fn parse(buf: &[u8]) -> Result<Self, LinkError> {
        let malformed = LinkError::MalformedFrame { len: buf.len() };
        let mut reader = BytesReader::new(buf);

        let (Some(size), Some(progress), Some(rssi), Some(freq), Some(flags), Some(training)) = (
            reader.next_u16_le(),
            reader.next_u16_le(),
            reader.next_i16_le(),
            reader.next_i16_le(),
            reader.next_u8(),
            reader.next_u8(),
        ) else {
            return Err(malformed);
        };

        let len = usize::from(size);
        let payload = reader.next_n(len);
        if len > BULK_DATA_LEN || payload.len() < len {
            return Err(malformed);
        }

        let mut data = [0u8; BULK_DATA_LEN];
        data[..len].copy_from_slice(payload);

        Ok(Self {
            progress,
            rssi,
            freq,
            flags,
            training,
            size,
            data,
        })
    }

    /// Frame bytes carried by this record.
    pub fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.size)]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..usize::from(self.size)]
    }

    /// Serializes the record.
    pub fn dump(&self, buf: &mut [u8; BULK_FRAME_LEN]) {
        let (header, data) = buf.split_at_mut(HEADER_LEN);
        header[0..2].copy_from_slice(&self.size.to_le_bytes());
        header[2..4].copy_from_slice(&self.progress.to_le_bytes());
        header[4..6].copy_from_slice(&self.rssi.to_le_bytes());
        header[6..8].copy_from_slice(&self.freq.to_le_bytes());
        header[8] = self.flags;
        header[9] = self.training;
        data.copy_from_slice(&self.data);
    }
}
