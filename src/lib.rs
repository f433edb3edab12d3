//! This crate provides a `no-std` forward error correction codec for narrowband packet radio
//! frames: Reed-Solomon (255,223) parity, the CCSDS randomizer and a K=7 rate 1/2 convolutional
//! code with Viterbi decoding.
//! # Usage
//! ### Framing
//! ```rust
//! use radiofec::{FecConfig, FrameCodec, append_trailer};
//!
//! let codec = FrameCodec::new();
//! // Big-endian length field followed by the message
//! let payload = append_trailer(&[0x00, 0x03, 0xde, 0xad, 0xbf]).unwrap();
//!
//! let wire = codec.frame(&payload, FecConfig::default()).unwrap();
//! assert_eq!(wire.len(), (payload.len() + 32 + 1) * 2);
//! // ...
//! ```
//! ### Deframing
//! ```rust
//! use radiofec::{FecConfig, FrameCodec, verify_trailer};
//!
//! let codec = FrameCodec::new();
//! let mut wire = codec.frame(&[0x00, 0x02, 0x01, 0x02], FecConfig::default()).unwrap();
//! wire.as_mut_slice()[3] ^= 0x10;
//!
//! let deframed = codec.deframe(&wire, FecConfig::default()).unwrap();
//! assert_eq!(deframed.payload.as_slice(), &[0x00, 0x02, 0x01, 0x02]);
//! assert_eq!(deframed.stats.bit_corrections, Some(1));
//!
//! let message = verify_trailer(&deframed.payload).unwrap();
//! assert_eq!(message.as_slice(), &[0x00, 0x00]);
//! ```

#![no_std]

mod buffer;
pub use buffer::Buf;

mod error;
pub use error::*;

pub mod fec;

mod frame;
pub use frame::*;

pub mod link;

/// Largest block handled by the Reed-Solomon and randomizer stages.
pub const MAX_FEC_LEN: usize = 255;
/// Largest wire frame, the rate 1/2 encoding of a full block plus tail.
pub const MAX_WIRE_LEN: usize = 512;
/// Largest payload accepted by [`FrameCodec::frame`].
pub const MAX_PAYLOAD_LEN: usize = MAX_FEC_LEN - fec::reed_solomon::PARITY_LEN - TRAILER_LEN;

/// Buffer holding a payload or a Reed-Solomon block.
pub type FrameBuf = Buf<MAX_FEC_LEN>;
/// Buffer holding a wire frame.
pub type WireBuf = Buf<MAX_WIRE_LEN>;
