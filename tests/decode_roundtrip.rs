//! Conformance tests: encoder output decoded by the `gif` crate.

use gif::{ColorOutput, DecodeOptions, DisposalMethod, Repeat};
use gif_encoder::{EncodeError, GifEncoder, schema::EncoderConfig};

/// A decoded frame as RGBA plus its control fields.
struct DecodedFrame {
    rgba: Vec<u8>,
    delay: u16,
    dispose: DisposalMethod,
    transparent: Option<u8>,
    local_palette: bool,
}

struct DecodedGif {
    width: u16,
    height: u16,
    repeat: Repeat,
    frames: Vec<DecodedFrame>,
}

fn decode(bytes: &[u8]) -> DecodedGif {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    let mut decoder = options.read_info(bytes).expect("invalid GIF header");

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().expect("invalid frame") {
        frames.push(DecodedFrame {
            rgba: frame.buffer.to_vec(),
            delay: frame.delay,
            dispose: frame.dispose,
            transparent: frame.transparent,
            local_palette: frame.palette.is_some(),
        });
    }

    DecodedGif {
        width: decoder.width(),
        height: decoder.height(),
        repeat: decoder.repeat(),
        frames,
    }
}

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    [rgb[0], rgb[1], rgb[2], 255].repeat((width * height) as usize)
}

fn encode(width: u32, height: u32, repeat: i32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut encoder = GifEncoder::new(width, height).unwrap();
    encoder.set_repeat(repeat);
    encoder.start().unwrap();
    for frame in frames {
        encoder.add_frame(frame).unwrap();
    }
    encoder.finish().unwrap().to_vec()
}

#[test]
fn uniform_frames_decode_exactly() {
    let colors = [
        [200, 30, 90],
        [12, 200, 99],
        [254, 1, 255],
        [0, 0, 0],
        [255, 255, 255],
    ];

    for (width, height) in [(1, 1), (5, 3), (16, 16), (40, 25), (100, 100)] {
        for color in colors {
            let frame = solid(width, height, color);
            let gif = decode(&encode(width, height, -1, &[frame.clone()]));

            assert_eq!(u32::from(gif.width), width);
            assert_eq!(u32::from(gif.height), height);
            assert_eq!(gif.frames.len(), 1);
            assert_eq!(gif.frames[0].rgba, frame, "{width}x{height} {color:?}");
        }
    }
}

#[test]
fn four_color_checkerboard_decodes_exactly() {
    let colors: [[u8; 4]; 4] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 255, 255],
    ];
    let mut frame: Vec<u8> = Vec::with_capacity(8 * 8 * 4);
    for y in 0..8 {
        for x in 0..8 {
            frame.extend_from_slice(&colors[(x % 2) + 2 * (y % 2)]);
        }
    }

    for quality in [1, 10] {
        let mut encoder = GifEncoder::new(8, 8).unwrap();
        encoder.set_quality(quality);
        encoder.start().unwrap();
        encoder.add_frame(&frame).unwrap();
        let gif = decode(encoder.finish().unwrap());

        assert_eq!(gif.frames[0].rgba, frame);
    }
}

#[test]
fn corner_pixels_scenario_is_valid() {
    let frame = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 0, 255, 255, // blue
        255, 255, 255, 255, // white
    ];
    let bytes = encode(2, 2, -1, &[frame.to_vec()]);
    let gif = decode(&bytes);

    assert_eq!((gif.width, gif.height), (2, 2));
    assert_eq!(gif.frames.len(), 1);
    assert_eq!(gif.repeat, Repeat::Finite(0));

    let rgba = &gif.frames[0].rgba;
    assert_eq!(&rgba[0..4], &[255, 0, 0, 255]);
    assert_eq!(&rgba[12..16], &[255, 255, 255, 255]);
}

#[test]
fn looping_animation_keeps_every_frame() {
    let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 0]];
    let frames: Vec<Vec<u8>> = colors.iter().map(|&c| solid(16, 16, c)).collect();

    let mut encoder = GifEncoder::new(16, 16).unwrap();
    encoder.set_repeat(0);
    encoder.set_frame_rate(25.0).unwrap();
    encoder.start().unwrap();
    for frame in &frames {
        encoder.add_frame(frame).unwrap();
    }
    let gif = decode(encoder.finish().unwrap());

    assert_eq!(gif.repeat, Repeat::Infinite);
    assert_eq!(gif.frames.len(), frames.len());
    for (i, (decoded, frame)) in gif.frames.iter().zip(&frames).enumerate() {
        assert_eq!(&decoded.rgba, frame, "frame {i}");
        assert_eq!(decoded.delay, 4);
        assert_eq!(decoded.dispose, DisposalMethod::Any);
        assert_eq!(decoded.transparent, None);
        // Only the first frame relies on the global table
        assert_eq!(decoded.local_palette, i > 0);
    }
}

#[test]
fn finite_repeat_count() {
    let frame = solid(4, 4, [10, 20, 30]);
    let gif = decode(&encode(4, 4, 3, &[frame.clone(), frame]));

    assert_eq!(gif.repeat, Repeat::Finite(3));
    assert_eq!(gif.frames.len(), 2);
}

#[test]
fn transparent_pixels_decode_with_zero_alpha() {
    // Left half fully transparent green, right half opaque red
    let mut frame: Vec<u8> = Vec::with_capacity(16 * 16 * 4);
    for _ in 0..16 {
        for x in 0..16 {
            if x < 8 {
                frame.extend_from_slice(&[0, 255, 0, 0]);
            } else {
                frame.extend_from_slice(&[255, 0, 0, 255]);
            }
        }
    }

    let mut encoder = GifEncoder::new(16, 16).unwrap();
    encoder.set_transparent(Some(0x00FF00));
    encoder.start().unwrap();
    encoder.add_frame(&frame).unwrap();
    let gif = decode(encoder.finish().unwrap());

    let decoded = &gif.frames[0];
    assert!(decoded.transparent.is_some());
    assert_eq!(decoded.dispose, DisposalMethod::Background);

    for (i, px) in decoded.rgba.chunks_exact(4).enumerate() {
        if i % 16 < 8 {
            assert_eq!(px[3], 0, "pixel {i} should be transparent");
        } else {
            assert_eq!(px, &[255, 0, 0, 255], "pixel {i}");
        }
    }
}

#[test]
fn dispose_override_is_decoded() {
    let mut encoder = GifEncoder::new(4, 4).unwrap();
    encoder.set_dispose(Some(3));
    encoder.start().unwrap();
    encoder.add_frame(&solid(4, 4, [1, 2, 3])).unwrap();
    let gif = decode(encoder.finish().unwrap());

    assert_eq!(gif.frames[0].dispose, DisposalMethod::Previous);
}

#[test]
fn gradient_stays_close_to_source() {
    let size = 64u32;
    let mut frame: Vec<u8> = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            frame.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
    }

    let gif = decode(&encode(size, size, -1, &[frame.clone()]));
    let decoded = &gif.frames[0].rgba;

    let total: u64 = decoded
        .chunks_exact(4)
        .zip(frame.chunks_exact(4))
        .map(|(a, b)| {
            (0..3)
                .map(|c| u64::from(a[c].abs_diff(b[c])))
                .sum::<u64>()
        })
        .sum();
    let mean = total as f64 / f64::from(size * size);
    assert!(mean < 32.0, "mean channel error {mean}");
}

#[test]
fn config_driven_session() {
    let config: EncoderConfig = serde_json::from_str(
        r#"{"width": 6, "height": 4, "repeat": 0, "delay_ms": 120, "transparent": 16711680}"#,
    )
    .unwrap();

    let mut encoder = GifEncoder::from_config(&config).unwrap();
    encoder.start().unwrap();
    encoder.add_frame(&solid(6, 4, [255, 0, 0])).unwrap();
    encoder.add_frame(&solid(6, 4, [0, 0, 255])).unwrap();
    let gif = decode(encoder.finish().unwrap());

    assert_eq!(gif.repeat, Repeat::Infinite);
    assert_eq!(gif.frames.len(), 2);
    assert!(gif.frames.iter().all(|f| f.delay == 12));
    assert!(gif.frames.iter().all(|f| f.dispose == DisposalMethod::Background));
    // Every pixel of the first frame is opaque red, the transparent color
    assert!(gif.frames[0].rgba.chunks_exact(4).all(|px| px[..3] == [255, 0, 0]));
}

#[test]
fn sequence_errors_leave_output_intact() {
    let mut encoder = GifEncoder::new(3, 3).unwrap();
    assert!(matches!(
        encoder.add_frame(&solid(3, 3, [0, 0, 0])),
        Err(EncodeError::Sequence { .. })
    ));

    encoder.start().unwrap();
    assert!(matches!(
        encoder.add_frame(&[0u8; 4]),
        Err(EncodeError::InputSizeMismatch { expected: 36, actual: 4 })
    ));
    encoder.add_frame(&solid(3, 3, [9, 9, 9])).unwrap();
    let finished = encoder.finish().unwrap().to_vec();

    assert!(encoder.add_frame(&solid(3, 3, [0, 0, 0])).is_err());
    assert_eq!(encoder.data(), &finished[..]);
    assert_eq!(decode(&finished).frames.len(), 1);
}
