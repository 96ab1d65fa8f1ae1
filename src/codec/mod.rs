//! Codec module - Color quantization, LZW compression and GIF89a assembly.

mod byte_vector;
mod encoder;
pub mod format;
mod lzw;
mod quantizer;

pub use byte_vector::ByteVector;
pub use encoder::{EncoderState, GifEncoder};
pub use format::DisposalMethod;
pub use lzw::LzwPacker;
pub use quantizer::{ColorMap, ColorQuantizer, NETSIZE};

use crate::schema::ConfigError;

/// Error type for encoding operations.
///
/// Every failing call leaves the output buffer exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame buffer has {actual} bytes, expected {expected} (width * height * 4)")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("Cannot call {operation}() while encoder is {state}")]
    Sequence {
        operation: &'static str,
        state: EncoderState,
    },

    #[error("Cannot finish an animation with no frames")]
    NoFrames,
}

/// Convenience alias for encoder results.
pub type EncodeResult<T> = Result<T, EncodeError>;
