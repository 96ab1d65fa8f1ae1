//! WebAssembly bindings for the GIF encoder.
//!
//! Provides a thin wrapper around `GifEncoder` for browser environments.

use wasm_bindgen::prelude::*;

use crate::codec::{EncodeError, GifEncoder};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    // Initialize WASM logger
    wasm_logger::init(wasm_logger::Config::default());
}

fn to_js(err: EncodeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WebAssembly wrapper for the animated GIF encoder.
#[wasm_bindgen]
pub struct WasmGifEncoder {
    encoder: GifEncoder,
}

#[wasm_bindgen]
impl WasmGifEncoder {
    /// Create an encoder for frames of `width` x `height` pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Result<WasmGifEncoder, JsValue> {
        let encoder = GifEncoder::new(width, height).map_err(to_js)?;
        Ok(WasmGifEncoder { encoder })
    }

    /// Write the GIF header.
    #[wasm_bindgen]
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.encoder.start().map_err(to_js)
    }

    /// Set the loop count (-1 = play once, 0 = forever).
    #[wasm_bindgen(js_name = setRepeat)]
    pub fn set_repeat(&mut self, count: i32) {
        self.encoder.set_repeat(count);
    }

    /// Set the quantizer sample interval (1 = best, 10 = default).
    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&mut self, quality: i32) {
        self.encoder.set_quality(quality);
    }

    /// Set the frame delay from a frame rate.
    #[wasm_bindgen(js_name = setFrameRate)]
    pub fn set_frame_rate(&mut self, fps: f64) -> Result<(), JsValue> {
        self.encoder.set_frame_rate(fps).map_err(to_js)
    }

    /// Set the frame delay in milliseconds.
    #[wasm_bindgen(js_name = setDelay)]
    pub fn set_delay(&mut self, milliseconds: u32) {
        self.encoder.set_delay(milliseconds);
    }

    /// Set the transparent color (0xRRGGBB), or `undefined` to disable.
    #[wasm_bindgen(js_name = setTransparent)]
    pub fn set_transparent(&mut self, color: Option<u32>) {
        self.encoder.set_transparent(color);
    }

    /// Append one frame of RGBA bytes.
    #[wasm_bindgen(js_name = addFrame)]
    pub fn add_frame(&mut self, rgba: &[u8]) -> Result<(), JsValue> {
        self.encoder.add_frame(rgba).map_err(to_js)
    }

    /// Write the trailer and return the finished GIF.
    #[wasm_bindgen]
    pub fn finish(&mut self) -> Result<Vec<u8>, JsValue> {
        self.encoder.finish().map(<[u8]>::to_vec).map_err(to_js)
    }

    /// Number of frames written so far.
    #[wasm_bindgen(js_name = frameCount)]
    pub fn frame_count(&self) -> u32 {
        self.encoder.frame_count() as u32
    }
}
