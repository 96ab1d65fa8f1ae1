//! GIF Encoder - Animated GIF89a output from raw RGBA frames.
//!
//! Each frame is reduced to a 256-color palette by a NeuQuant self-organizing
//! map, mapped to palette indices, compressed with variable-width LZW and
//! framed into GIF89a blocks.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Serializable encoder configuration and its validation
//! - `codec`: Quantization, LZW compression and GIF block assembly
//!
//! # Example
//!
//! ```rust
//! use gif_encoder::{GifEncoder, schema::EncoderConfig};
//!
//! let config = EncoderConfig {
//!     width: 16,
//!     height: 16,
//!     repeat: 0,
//!     frame_rate: Some(10.0),
//!     ..Default::default()
//! };
//!
//! let mut encoder = GifEncoder::from_config(&config)?;
//! encoder.start()?;
//!
//! for shade in [0u8, 128, 255] {
//!     let frame = [shade, 64, 255 - shade, 255].repeat(config.pixel_count());
//!     encoder.add_frame(&frame)?;
//! }
//!
//! let gif = encoder.finish()?;
//! println!("Encoded {} bytes", gif.len());
//! # Ok::<(), gif_encoder::EncodeError>(())
//! ```

pub mod codec;
pub mod schema;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use codec::{EncodeError, EncodeResult, EncoderState, GifEncoder};
pub use schema::{ConfigError, EncoderConfig};
