//! Small byte-level helpers shared by the workspace crates.

pub mod utf8;

pub use utf8::Utf8Decoder;
