//! GIF89a block layouts.
//!
//! ```text
//! Header:                  "GIF89a" (6 bytes)
//! Logical screen descr.:   width u16, height u16, packed, background, aspect (7 bytes)
//! Global color table:      256 * RGB (768 bytes)
//! Loop extension:          0x21 0xFF 11 "NETSCAPE2.0" 3 1 count:u16 0 (19 bytes)
//! Per frame:
//!   Graphic control ext.:  0x21 0xF9 4 packed delay:u16 transparent 0 (8 bytes)
//!   Image descriptor:      0x2C left:u16 top:u16 width:u16 height:u16 packed (10 bytes)
//!   Local color table:     256 * RGB (768 bytes, all frames but the first)
//!   Image data:            code size, LZW sub-blocks, 0
//! Trailer:                 0x3B
//! ```
//!
//! All multi-byte fields are little-endian.

use super::ByteVector;

/// File signature and version.
pub const SIGNATURE: &str = "GIF89a";

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub const APPLICATION_LABEL: u8 = 0xFF;
pub const IMAGE_SEPARATOR: u8 = 0x2C;
pub const TRAILER: u8 = 0x3B;
pub const BLOCK_TERMINATOR: u8 = 0x00;

/// Application identifier and authentication code of the looping extension.
pub const NETSCAPE_ID: &str = "NETSCAPE2.0";

/// Color table size field: 2^(7 + 1) = 256 entries.
pub const TABLE_SIZE_FIELD: u8 = 7;

/// Bytes in a full 256-entry color table.
pub const COLOR_TABLE_BYTES: usize = 3 * 256;

/// Frame disposal methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisposalMethod {
    /// No disposal specified.
    #[default]
    Unspecified = 0,
    /// Leave the frame in place.
    Keep = 1,
    /// Restore the frame area to the background.
    Background = 2,
    /// Restore the canvas to its previous state.
    Previous = 3,
}

impl From<DisposalMethod> for u8 {
    fn from(method: DisposalMethod) -> Self {
        method as u8
    }
}

/// Logical screen descriptor announcing a 256-entry global color table.
#[derive(Debug, Clone, Copy)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
}

impl ScreenDescriptor {
    pub const SIZE: usize = 7;

    pub fn write_to(&self, out: &mut ByteVector) {
        out.write_le_u16(self.width);
        out.write_le_u16(self.height);
        out.write_byte(
            0x80 // global color table present
            | (7 << 4) // color resolution
            // sort flag = 0
            | TABLE_SIZE_FIELD,
        );
        out.write_byte(0); // background color index
        out.write_byte(0); // pixel aspect ratio
    }
}

/// NETSCAPE2.0 application extension carrying the loop count.
#[derive(Debug, Clone, Copy)]
pub struct LoopExtension {
    /// Extra plays after the first; 0 loops forever.
    pub repeat: u16,
}

impl LoopExtension {
    pub const SIZE: usize = 19;

    pub fn write_to(&self, out: &mut ByteVector) {
        out.write_byte(EXTENSION_INTRODUCER);
        out.write_byte(APPLICATION_LABEL);
        out.write_byte(NETSCAPE_ID.len() as u8);
        out.write_text(NETSCAPE_ID);
        out.write_byte(3); // sub-block size
        out.write_byte(1); // loop sub-block id
        out.write_le_u16(self.repeat);
        out.write_byte(BLOCK_TERMINATOR);
    }
}

/// Graphic control extension preceding every image.
#[derive(Debug, Clone, Copy)]
pub struct GraphicControl {
    /// Disposal method, 3 bits.
    pub disposal: u8,
    /// Delay in hundredths of a second.
    pub delay: u16,
    /// Transparent palette index, if transparency is enabled.
    pub transparent_index: Option<u8>,
}

impl GraphicControl {
    pub const SIZE: usize = 8;

    /// Packed field: reserved (3 bits), disposal (3 bits), user input (1 bit),
    /// transparency flag (1 bit).
    pub fn packed(&self) -> u8 {
        ((self.disposal & 0x07) << 2) | u8::from(self.transparent_index.is_some())
    }

    pub fn write_to(&self, out: &mut ByteVector) {
        out.write_byte(EXTENSION_INTRODUCER);
        out.write_byte(GRAPHIC_CONTROL_LABEL);
        out.write_byte(4); // data block size
        out.write_byte(self.packed());
        out.write_le_u16(self.delay);
        out.write_byte(self.transparent_index.unwrap_or(0));
        out.write_byte(BLOCK_TERMINATOR);
    }
}

/// Image descriptor covering the whole logical screen.
#[derive(Debug, Clone, Copy)]
pub struct ImageDescriptor {
    pub width: u16,
    pub height: u16,
    /// A 256-entry local color table follows the descriptor.
    pub local_table: bool,
}

impl ImageDescriptor {
    pub const SIZE: usize = 10;

    pub fn write_to(&self, out: &mut ByteVector) {
        out.write_byte(IMAGE_SEPARATOR);
        out.write_le_u16(0); // left
        out.write_le_u16(0); // top
        out.write_le_u16(self.width);
        out.write_le_u16(self.height);
        if self.local_table {
            // local table, not interlaced, not sorted
            out.write_byte(0x80 | TABLE_SIZE_FIELD);
        } else {
            out.write_byte(0);
        }
    }
}

/// Write `palette` as a color table, zero-padded to 256 entries.
pub fn write_color_table(palette: &[u8], out: &mut ByteVector) {
    let len = palette.len().min(COLOR_TABLE_BYTES);
    out.write_bytes(&palette[..len]);
    for _ in len..COLOR_TABLE_BYTES {
        out.write_byte(0);
    }
}
