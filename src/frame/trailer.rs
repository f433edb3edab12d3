//! The trailer field reserved at the end of every payload.
//!
//! The trailer is meant to carry an authentication tag, but no tag is computed: it is always
//! written as zeros and never checked. [`verify_trailer`] only strips it. A successful call says
//! nothing about where the frame came from.

use crate::{FecError, FrameBuf};

/// Length of the big-endian length field at the start of a payload.
pub const LENGTH_FIELD_LEN: usize = 2;
/// Length of the trailer.
pub const TRAILER_LEN: usize = 2;

const PLACEHOLDER: [u8; TRAILER_LEN] = [0; TRAILER_LEN];

fn length_field(data: &[u8]) -> Option<u16> {
    let (field, _) = data.split_first_chunk::<LENGTH_FIELD_LEN>()?;
    Some(u16::from_be_bytes(*field))
}

/// Appends the (zero) trailer and adds its length to the length field.
pub fn append_trailer(data: &[u8]) -> Result<FrameBuf, FecError> {
    let malformed = FecError::MalformedTrailer { len: data.len() };
    let length = length_field(data)
        .and_then(|len| len.checked_add(TRAILER_LEN as u16))
        .ok_or(malformed)?;

    let mut out = FrameBuf::new();
    out.push_bytes(&length.to_be_bytes())?;
    out.push_bytes(&data[LENGTH_FIELD_LEN..])?;
    out.push_bytes(&PLACEHOLDER)?;
    Ok(out)
}

/// Strips the trailer and subtracts its length from the length field.
///
/// The trailer content is not inspected.
pub fn verify_trailer(data: &[u8]) -> Result<FrameBuf, FecError> {
    let malformed = FecError::MalformedTrailer { len: data.len() };
    if data.len() < LENGTH_FIELD_LEN + TRAILER_LEN {
        return Err(malformed);
    }
    let length = length_field(data)
        .and_then(|len| len.checked_sub(TRAILER_LEN as u16))
        .ok_or(malformed)?;

    let mut out = FrameBuf::new();
    out.push_bytes(&length.to_be_bytes())?;
    out.push_bytes(&data[LENGTH_FIELD_LEN..data.len() - TRAILER_LEN])?;
    Ok(out)
}
