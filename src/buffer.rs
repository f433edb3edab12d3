use core::fmt;
use core::ops::Deref;

use crate::FecError;

/// Cursor over a byte slice, used to pull fixed-width fields out of received buffers.
pub(crate) struct BytesReader<'a> {
    buf: &'a [u8],
    idx: usize,
}

impl<'a> BytesReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, idx: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.idx..]
    }

    pub fn next_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, _) = self.remaining().split_first_chunk::<N>()?;
        self.idx += N;
        Some(*head)
    }

    pub fn next_u8(&mut self) -> Option<u8> {
        self.next_array::<1>().map(|[b]| b)
    }

    pub fn next_u16_le(&mut self) -> Option<u16> {
        self.next_array().map(u16::from_le_bytes)
    }

    pub fn next_i16_le(&mut self) -> Option<i16> {
        self.next_array().map(i16::from_le_bytes)
    }

    pub fn next_n(&mut self, n: usize) -> &'a [u8] {
        let end_idx = (self.idx + n).min(self.buf.len());
        let data = &self.buf[self.idx..end_idx];
        self.idx = end_idx;
        data
    }
}

/// Fixed-capacity byte buffer holding a frame at one stage of the codec.
#[derive(Clone, Copy)]
pub struct Buf<const C: usize> {
    buf: [u8; C],
    len: usize,
}

impl<const C: usize> Buf<C> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; C],
            len: 0,
        }
    }

    /// Creates a buffer holding a copy of `data`. Fails if `data` does not fit.
    pub fn from_slice(data: &[u8]) -> Result<Self, FecError> {
        let mut buf = Self::new();
        buf.push_bytes(data)?;
        Ok(buf)
    }

    pub const fn capacity(&self) -> usize {
        C
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }

    /// Appends `data`, failing without modifying the buffer if it would overflow.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<(), FecError> {
        let end = self.len + data.len();
        let dst = self.buf.get_mut(self.len..end).ok_or(FecError::OversizedInput {
            len: end,
            max: C,
        })?;
        dst.copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Shortens the buffer, keeping the first `len` bytes. No-op if `len` is not smaller.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Whole backing storage, for stages that write their output in place.
    pub(crate) fn storage_mut(&mut self) -> &mut [u8; C] {
        &mut self.buf
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= C);
        self.len = len.min(C);
    }
}

impl<const C: usize> Default for Buf<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> Deref for Buf<C> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const C: usize> AsRef<[u8]> for Buf<C> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<const C: usize> PartialEq for Buf<C> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const C: usize> Eq for Buf<C> {}

impl<const C: usize> fmt::Debug for Buf<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(feature = "defmt")]
impl<const C: usize> defmt::Format for Buf<C> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:x}", self.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::{Buf, BytesReader};
    use crate::FecError;

    #[test]
    fn test_buf_push_bytes_overflow() {
        let mut buf = Buf::<4>::new();
        buf.push_bytes(&[1, 2, 3]).unwrap();

        assert_eq!(
            buf.push_bytes(&[4, 5]),
            Err(FecError::OversizedInput { len: 5, max: 4 })
        );
        // A failed push leaves the contents alone
        assert_eq!(buf.as_slice(), &[1, 2, 3]);

        buf.push_bytes(&[4]).unwrap();
        assert_eq!(&*buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_buf_truncate() {
        let mut buf = Buf::<8>::from_slice(&[9; 6]).unwrap();
        buf.truncate(10);
        assert_eq!(buf.len(), 6);
        buf.truncate(2);
        assert_eq!(buf.as_slice(), &[9, 9]);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bytes_reader_fields() {
        let data = [0x34, 0x12, 0xfe, 0xff, 0x07, 1, 2, 3];
        let mut reader = BytesReader::new(&data);

        assert_eq!(reader.next_u16_le(), Some(0x1234));
        assert_eq!(reader.next_i16_le(), Some(-2));
        assert_eq!(reader.next_u8(), Some(7));
        assert_eq!(reader.next_n(10), &[1, 2, 3]);
        assert_eq!(reader.next_u8(), None);
        assert!(reader.remaining().is_empty());
    }
}
