pub mod convolutional;
pub mod reed_solomon;
pub mod scrambler;

pub use convolutional::ViterbiDecoder;
pub use scrambler::Scrambler;
