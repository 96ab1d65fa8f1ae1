//! Animated GIF encoder driving quantization, compression and block assembly.

use std::fmt;
use std::io::{self, Write};

use log::{debug, warn};

use super::format::{
    COLOR_TABLE_BYTES, DisposalMethod, GraphicControl, ImageDescriptor, LoopExtension,
    SIGNATURE, ScreenDescriptor, TRAILER, write_color_table,
};
use super::{ByteVector, ColorQuantizer, EncodeError, EncodeResult, LzwPacker, NETSIZE};
use crate::schema::{EncoderConfig, validate_dimensions, validate_frame_rate};

/// Bits per palette index.
const COLOR_DEPTH: u8 = 8;

/// Lifecycle of an encoding session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Constructed, header not yet written.
    Unstarted,
    /// Header written, accepting frames.
    Started,
    /// Trailer written, output complete.
    Finished,
}

impl fmt::Display for EncoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderState::Unstarted => "unstarted",
            EncoderState::Started => "started",
            EncoderState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Encoder that turns a sequence of RGBA frames into an animated GIF89a stream.
///
/// Every frame is quantized to its own 256-color palette. The first frame's palette
/// becomes the global color table; later frames carry a local table.
///
/// Usage:
/// ```
/// use gif_encoder::GifEncoder;
///
/// let mut encoder = GifEncoder::new(2, 2)?;
/// encoder.start()?;
/// encoder.set_repeat(0);
/// encoder.add_frame(&[255u8; 2 * 2 * 4])?;
/// let gif = encoder.finish()?;
/// assert_eq!(&gif[..6], b"GIF89a");
/// assert_eq!(gif.last(), Some(&0x3B));
/// # Ok::<(), gif_encoder::EncodeError>(())
/// ```
pub struct GifEncoder {
    width: u16,
    height: u16,
    /// -1 = no loop extension, otherwise the loop count.
    repeat: i32,
    /// Frame delay in hundredths of a second.
    delay: u16,
    /// Transparent color as 0xRRGGBB.
    transparent: Option<u32>,
    transparent_index: u8,
    dispose: Option<u8>,
    sample: u32,
    state: EncoderState,
    frame_count: u64,
    palette: [u8; COLOR_TABLE_BYTES],
    /// Palette entries referenced by any frame so far.
    used_entries: [bool; NETSIZE],
    /// RGB buffer for the frame being encoded, grown by the first frame and reused.
    pixels: Vec<u8>,
    /// Palette index buffer for the frame being encoded, reused like `pixels`.
    indexed_pixels: Vec<u8>,
    packer: LzwPacker,
    out: ByteVector,
}

impl GifEncoder {
    /// Create an encoder for frames of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> EncodeResult<Self> {
        validate_dimensions(width, height)?;

        Ok(Self {
            width: width as u16,
            height: height as u16,
            repeat: -1,
            delay: 0,
            transparent: None,
            transparent_index: 0,
            dispose: None,
            sample: 10,
            state: EncoderState::Unstarted,
            frame_count: 0,
            palette: [0; COLOR_TABLE_BYTES],
            used_entries: [false; NETSIZE],
            pixels: Vec::new(),
            indexed_pixels: Vec::new(),
            packer: LzwPacker::new(COLOR_DEPTH),
            out: ByteVector::new(),
        })
    }

    /// Create an encoder with every setting taken from `config`.
    pub fn from_config(config: &EncoderConfig) -> EncodeResult<Self> {
        config.validate()?;

        let mut encoder = Self::new(config.width, config.height)?;
        encoder.set_repeat(config.repeat);
        encoder.set_quality(config.quality);
        if let Some(fps) = config.frame_rate {
            encoder.set_frame_rate(fps)?;
        } else if let Some(ms) = config.delay_ms {
            encoder.set_delay(ms);
        }
        encoder.set_transparent(config.transparent);
        encoder.set_dispose(config.dispose);

        Ok(encoder)
    }

    /// Set the loop count: any negative value plays once without a loop
    /// extension, 0 loops forever, N plays N extra times.
    pub fn set_repeat(&mut self, count: i32) {
        self.repeat = if count < 0 {
            -1
        } else if count > i32::from(u16::MAX) {
            warn!("Repeat count {} clamped to {}", count, u16::MAX);
            i32::from(u16::MAX)
        } else {
            count
        };
    }

    /// Set the quantizer sample interval. Lower is better and slower; values
    /// below 1 are clamped to 1.
    pub fn set_quality(&mut self, quality: i32) {
        if quality < 1 {
            warn!("Quality {} clamped to 1", quality);
        }
        self.sample = quality.max(1) as u32;
    }

    /// Set the delay from a frame rate: `round(100 / fps)` hundredths of a second.
    pub fn set_frame_rate(&mut self, fps: f64) -> EncodeResult<()> {
        validate_frame_rate(fps)?;
        self.delay = clamp_delay((100.0 / fps).round());
        Ok(())
    }

    /// Set the delay between frames in milliseconds, rounded to hundredths of a second.
    pub fn set_delay(&mut self, milliseconds: u32) {
        self.delay = clamp_delay((f64::from(milliseconds) / 10.0).round());
    }

    /// Set the transparent color as 0xRRGGBB, or disable transparency.
    pub fn set_transparent(&mut self, color: Option<u32>) {
        self.transparent = color.map(|c| c & 0x00FF_FFFF);
    }

    /// Override the disposal method (masked to 3 bits), or restore the default.
    pub fn set_dispose(&mut self, dispose: Option<u8>) {
        self.dispose = dispose.map(|d| d & 0x07);
    }

    /// Write the GIF89a header.
    pub fn start(&mut self) -> EncodeResult<()> {
        if self.state != EncoderState::Unstarted {
            return Err(EncodeError::Sequence {
                operation: "start",
                state: self.state,
            });
        }

        self.out.write_text(SIGNATURE);
        self.state = EncoderState::Started;
        Ok(())
    }

    /// Quantize, compress and append one RGBA frame.
    ///
    /// `rgba` must hold exactly `width * height * 4` bytes. On error nothing is written.
    pub fn add_frame(&mut self, rgba: &[u8]) -> EncodeResult<()> {
        if self.state != EncoderState::Started {
            return Err(EncodeError::Sequence {
                operation: "add_frame",
                state: self.state,
            });
        }

        // No buffer of width * height * 4 bytes can exist when this overflows
        let expected = self.pixel_count().checked_mul(4);
        if expected != Some(rgba.len()) {
            return Err(EncodeError::InputSizeMismatch {
                expected: expected.unwrap_or(usize::MAX),
                actual: rgba.len(),
            });
        }

        let first_frame = self.frame_count == 0;
        let offset = self.out.len();

        self.read_pixels(rgba);
        self.analyze_pixels(rgba);

        if first_frame {
            ScreenDescriptor {
                width: self.width,
                height: self.height,
            }
            .write_to(&mut self.out);
            write_color_table(&self.palette, &mut self.out);

            if self.repeat >= 0 {
                LoopExtension {
                    repeat: self.repeat as u16,
                }
                .write_to(&mut self.out);
            }
        }

        self.graphic_control().write_to(&mut self.out);
        ImageDescriptor {
            width: self.width,
            height: self.height,
            local_table: !first_frame,
        }
        .write_to(&mut self.out);
        if !first_frame {
            write_color_table(&self.palette, &mut self.out);
        }

        self.packer.encode(&self.indexed_pixels, &mut self.out);
        self.frame_count += 1;

        debug!(
            "Frame {} ({}x{}): {} bytes, {} palette entries in use",
            self.frame_count,
            self.width,
            self.height,
            self.out.len() - offset,
            self.used_entries.iter().filter(|&&used| used).count()
        );

        Ok(())
    }

    /// Append the trailer and return the complete GIF.
    ///
    /// No frames may be added afterwards.
    pub fn finish(&mut self) -> EncodeResult<&[u8]> {
        if self.state != EncoderState::Started {
            return Err(EncodeError::Sequence {
                operation: "finish",
                state: self.state,
            });
        }
        if self.frame_count == 0 {
            return Err(EncodeError::NoFrames);
        }

        self.out.write_byte(TRAILER);
        self.state = EncoderState::Finished;

        debug!(
            "GIF finished: {} frames, {} bytes",
            self.frame_count,
            self.out.len()
        );

        Ok(self.out.data())
    }

    /// Drop the alpha channel into the reusable RGB buffer.
    fn read_pixels(&mut self, rgba: &[u8]) {
        self.pixels.clear();
        for px in rgba.chunks_exact(4) {
            self.pixels.extend_from_slice(&px[..3]);
        }
    }

    /// Build the frame palette and map every pixel to it.
    fn analyze_pixels(&mut self, rgba: &[u8]) {
        let map = ColorQuantizer::new(&self.pixels, self.sample).build_colormap();
        self.palette.copy_from_slice(map.palette());

        self.indexed_pixels.clear();
        for px in self.pixels.chunks_exact(3) {
            let index = map.lookup_rgb(px[0], px[1], px[2]);
            self.used_entries[index as usize] = true;
            self.indexed_pixels.push(index);
        }

        if let Some(color) = self.transparent {
            let transparent_index = self.find_closest(color);
            self.transparent_index = transparent_index;

            // Fully transparent source pixels must use the transparent index
            for (index, px) in self.indexed_pixels.iter_mut().zip(rgba.chunks_exact(4)) {
                if px[3] == 0 {
                    *index = transparent_index;
                }
            }
        }
    }

    /// Index of the used palette entry closest to `color` (0xRRGGBB).
    ///
    /// Squared RGB distance; the first entry scanned wins ties.
    fn find_closest(&self, color: u32) -> u8 {
        let r = ((color >> 16) & 0xFF) as i32;
        let g = ((color >> 8) & 0xFF) as i32;
        let b = (color & 0xFF) as i32;

        let mut min_pos = 0;
        let mut d_min = 256 * 256 * 256;

        for (index, entry) in self.palette.chunks_exact(3).enumerate() {
            let dr = r - i32::from(entry[0]);
            let dg = g - i32::from(entry[1]);
            let db = b - i32::from(entry[2]);
            let d = dr * dr + dg * dg + db * db;
            if self.used_entries[index] && d < d_min {
                d_min = d;
                min_pos = index;
            }
        }

        min_pos as u8
    }

    fn graphic_control(&self) -> GraphicControl {
        let default = if self.transparent.is_some() {
            // Clear the frame so transparent areas do not show the previous one
            DisposalMethod::Background
        } else {
            DisposalMethod::Unspecified
        };

        GraphicControl {
            disposal: self.dispose.unwrap_or(default.into()),
            delay: self.delay,
            transparent_index: self.transparent.map(|_| self.transparent_index),
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Pixels per frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Frame delay in hundredths of a second.
    pub fn delay(&self) -> u16 {
        self.delay
    }

    /// Loop count, -1 when no loop extension is written.
    pub fn repeat(&self) -> i32 {
        self.repeat
    }

    /// Quantizer sample interval.
    pub fn quality(&self) -> u32 {
        self.sample
    }

    /// Transparent color as 0xRRGGBB, if set.
    pub fn transparent(&self) -> Option<u32> {
        self.transparent
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Everything written so far.
    pub fn data(&self) -> &[u8] {
        self.out.data()
    }

    /// Consume the encoder, returning the output bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.out.into_inner()
    }

    /// Copy the output written so far to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.out.data())?;
        w.flush()
    }
}

impl fmt::Debug for GifEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GifEncoder")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("repeat", &self.repeat)
            .field("delay", &self.delay)
            .field("transparent", &self.transparent)
            .field("dispose", &self.dispose)
            .field("sample", &self.sample)
            .field("state", &self.state)
            .field("frame_count", &self.frame_count)
            .field("bytes", &self.out.len())
            .finish_non_exhaustive()
    }
}

fn clamp_delay(hundredths: f64) -> u16 {
    if hundredths > f64::from(u16::MAX) {
        warn!("Frame delay {} clamped to {}", hundredths, u16::MAX);
    }
    hundredths.clamp(0.0, f64::from(u16::MAX)) as u16
}
