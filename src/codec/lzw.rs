//! Variable-width LZW compression with GIF sub-block framing.
//!
//! Classic `compress`-style encoder: the dictionary is an open-addressing hash
//! table over `(prefix code, next symbol)` pairs with an XOR first probe and a
//! relatively prime secondary probe (after G. Knott). Codes start one bit wider
//! than the initial code size and grow to at most 12 bits; when the table is
//! full a CLEAR code is emitted and the dictionary starts over.
//!
//! Codes are packed LSB-first and framed into sub-blocks of at most 254 bytes,
//! each prefixed by its length.

use log::trace;

use super::ByteVector;

/// Maximum code width in bits.
const BITS: u32 = 12;

/// Hash table size, a prime giving ~80% occupancy at 4096 entries.
const HSIZE: usize = 5003;

/// Shift applied to the symbol for the first hash probe.
const HASH_SHIFT: u32 = hash_shift();

/// Sub-blocks are flushed once they reach this many bytes.
const BLOCK_FLUSH: usize = 254;

const fn hash_shift() -> u32 {
    let mut shift = 0;
    let mut fcode = HSIZE;
    while fcode < 65536 {
        fcode *= 2;
        shift += 1;
    }
    8 - shift
}

#[inline]
const fn max_code(n_bits: u32) -> u32 {
    (1 << n_bits) - 1
}

/// Buffers packed bytes and writes them out as length-prefixed sub-blocks.
struct SubBlocks {
    buf: [u8; 256],
    len: usize,
}

impl SubBlocks {
    fn new() -> Self {
        Self {
            buf: [0; 256],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, byte: u8, out: &mut ByteVector) {
        self.buf[self.len] = byte;
        self.len += 1;
        if self.len >= BLOCK_FLUSH {
            self.flush(out);
        }
    }

    fn flush(&mut self, out: &mut ByteVector) {
        if self.len > 0 {
            out.write_byte(self.len as u8);
            out.write_bytes(&self.buf[..self.len]);
            self.len = 0;
        }
    }
}

/// GIF LZW encoder for a stream of palette indices.
///
/// The hash tables are owned by the packer and reset on every [`LzwPacker::encode`]
/// call, so one packer can be reused across frames.
pub struct LzwPacker {
    init_code_size: u8,
    htab: Vec<i32>,
    codetab: Vec<u16>,
    block: SubBlocks,

    cur_accum: u32,
    cur_bits: u32,
    n_bits: u32,
    maxcode: u32,
    free_ent: u32,
    clear_flg: bool,
    g_init_bits: u32,
    clear_code: u32,
    eof_code: u32,
}

impl LzwPacker {
    /// Create a packer for indices of `color_depth` bits.
    ///
    /// The initial code size is `color_depth` clamped to `2..=8`.
    pub fn new(color_depth: u8) -> Self {
        Self {
            init_code_size: color_depth.clamp(2, 8),
            htab: vec![-1; HSIZE],
            codetab: vec![0; HSIZE],
            block: SubBlocks::new(),
            cur_accum: 0,
            cur_bits: 0,
            n_bits: 0,
            maxcode: 0,
            free_ent: 0,
            clear_flg: false,
            g_init_bits: 0,
            clear_code: 0,
            eof_code: 0,
        }
    }

    /// Initial code size written ahead of the compressed data.
    pub fn init_code_size(&self) -> u8 {
        self.init_code_size
    }

    /// Write the initial code size, the compressed sub-blocks and the
    /// zero-length block terminator for `indices`.
    ///
    /// Every index must be below `1 << init_code_size`.
    pub fn encode(&mut self, indices: &[u8], out: &mut ByteVector) {
        debug_assert!(
            indices
                .iter()
                .all(|&i| u32::from(i) < 1 << self.init_code_size),
            "index exceeds initial code size"
        );

        out.write_byte(self.init_code_size);
        self.compress(indices, out);
        out.write_byte(0);
    }

    fn compress(&mut self, indices: &[u8], out: &mut ByteVector) {
        let init_bits = u32::from(self.init_code_size) + 1;

        self.g_init_bits = init_bits;
        self.clear_flg = false;
        self.n_bits = init_bits;
        self.maxcode = max_code(init_bits);
        self.clear_code = 1 << (init_bits - 1);
        self.eof_code = self.clear_code + 1;
        self.free_ent = self.clear_code + 2;
        self.cur_accum = 0;
        self.cur_bits = 0;
        self.block.len = 0;
        self.clear_hash();

        let mut symbols = indices.iter().map(|&i| u32::from(i));

        let Some(mut ent) = symbols.next() else {
            self.output(self.clear_code, out);
            self.output(self.eof_code, out);
            return;
        };

        self.output(self.clear_code, out);

        'symbols: for c in symbols {
            let fcode = ((c << BITS) + ent) as i32;
            let mut i = ((c << HASH_SHIFT) ^ ent) as usize;

            if self.htab[i] == fcode {
                ent = u32::from(self.codetab[i]);
                continue;
            }

            if self.htab[i] >= 0 {
                // Secondary probe
                let disp = if i == 0 { 1 } else { HSIZE - i };
                loop {
                    i = if i < disp { i + HSIZE - disp } else { i - disp };
                    if self.htab[i] == fcode {
                        ent = u32::from(self.codetab[i]);
                        continue 'symbols;
                    }
                    if self.htab[i] < 0 {
                        break;
                    }
                }
            }

            self.output(ent, out);
            ent = c;

            if self.free_ent < 1 << BITS {
                self.codetab[i] = self.free_ent as u16;
                self.htab[i] = fcode;
                self.free_ent += 1;
            } else {
                self.clear_block(out);
            }
        }

        self.output(ent, out);
        self.output(self.eof_code, out);
    }

    /// Reset the dictionary and tell the decoder to do the same.
    fn clear_block(&mut self, out: &mut ByteVector) {
        trace!("LZW dictionary full, emitting clear code");
        self.clear_hash();
        self.free_ent = self.clear_code + 2;
        self.clear_flg = true;
        self.output(self.clear_code, out);
    }

    fn clear_hash(&mut self) {
        self.htab.fill(-1);
    }

    /// Append `code` to the bit accumulator, emitting whole bytes.
    fn output(&mut self, code: u32, out: &mut ByteVector) {
        self.cur_accum &= max_code(self.cur_bits);
        if self.cur_bits > 0 {
            self.cur_accum |= code << self.cur_bits;
        } else {
            self.cur_accum = code;
        }
        self.cur_bits += self.n_bits;

        while self.cur_bits >= 8 {
            self.block.push((self.cur_accum & 0xFF) as u8, out);
            self.cur_accum >>= 8;
            self.cur_bits -= 8;
        }

        // Widen codes once the next entry no longer fits, or reset after a clear
        if self.free_ent > self.maxcode || self.clear_flg {
            if self.clear_flg {
                self.n_bits = self.g_init_bits;
                self.maxcode = max_code(self.n_bits);
                self.clear_flg = false;
            } else {
                self.n_bits += 1;
                self.maxcode = if self.n_bits == BITS {
                    1 << BITS
                } else {
                    max_code(self.n_bits)
                };
            }
        }

        if code == self.eof_code {
            while self.cur_bits > 0 {
                self.block.push((self.cur_accum & 0xFF) as u8, out);
                self.cur_accum >>= 8;
                self.cur_bits = self.cur_bits.saturating_sub(8);
            }
            self.block.flush(out);
        }
    }
}
