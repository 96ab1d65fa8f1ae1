//! Configuration types for GIF encoding sessions.

use serde::{Deserialize, Serialize};

/// Default repeat count: play once, no loop extension.
fn default_repeat() -> i32 {
    -1
}

/// Default quantizer sample interval.
fn default_quality() -> i32 {
    10
}

/// Largest width or height a GIF can declare.
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Top-level encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Loop count: -1 plays once, 0 loops forever, N plays N extra times.
    #[serde(default = "default_repeat")]
    pub repeat: i32,
    /// Quantizer sample interval (1 = best, 10 = default, clamped to >= 1).
    #[serde(default = "default_quality")]
    pub quality: i32,
    /// Frames per second. Takes precedence over `delay_ms`.
    #[serde(default)]
    pub frame_rate: Option<f64>,
    /// Delay between frames in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u32>,
    /// Transparent color as 0xRRGGBB.
    #[serde(default)]
    pub transparent: Option<u32>,
    /// Explicit disposal method (0-7), overriding the default.
    #[serde(default)]
    pub dispose: Option<u8>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            repeat: default_repeat(),
            quality: default_quality(),
            frame_rate: None,
            delay_ms: None,
            transparent: None,
            dispose: None,
        }
    }
}

impl EncoderConfig {
    /// Number of pixels in one frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Expected RGBA frame length in bytes, saturating where `usize` is too narrow.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.pixel_count().saturating_mul(4)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        if let Some(fps) = self.frame_rate {
            validate_frame_rate(fps)?;
        }
        Ok(())
    }
}

/// Check that a canvas size is representable in a GIF.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConfigError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Check that a frame rate is finite and positive.
pub fn validate_frame_rate(fps: f64) -> Result<(), ConfigError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(ConfigError::InvalidFrameRate(fps));
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Canvas dimensions {width}x{height} must be between 1 and 65535")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f64),
}
