//! Encode a short looping gradient animation and report timings

use gif_encoder::GifEncoder;
use std::time::Instant;

const FRAMES: usize = 24;

/// Plasma-like RGBA frame shifted by `phase`.
fn render(size: u32, phase: f32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let u = x as f32 / size as f32;
            let v = y as f32 / size as f32;
            let t = phase * std::f32::consts::TAU;
            rgba.push((127.5 * (1.0 + (u * 6.0 + t).sin())) as u8);
            rgba.push((127.5 * (1.0 + (v * 5.0 - t).cos())) as u8);
            rgba.push((127.5 * (1.0 + ((u + v) * 4.0 + t).sin())) as u8);
            rgba.push(255);
        }
    }
    rgba
}

fn main() {
    println!("=== Animated Gradient ===\n");

    for quality in [1, 10, 30] {
        let size = 128;
        println!("Quality: {} ({}x{}, {} frames)", quality, size, size, FRAMES);

        let frames: Vec<Vec<u8>> = (0..FRAMES)
            .map(|i| render(size, i as f32 / FRAMES as f32))
            .collect();

        let start = Instant::now();
        let mut encoder = GifEncoder::new(size, size).unwrap();
        encoder.set_repeat(0);
        encoder.set_frame_rate(12.0).unwrap();
        encoder.set_quality(quality);
        encoder.start().unwrap();
        for frame in &frames {
            encoder.add_frame(frame).unwrap();
        }
        let bytes = encoder.finish().unwrap().len();
        let elapsed = start.elapsed();

        let path = std::env::temp_dir().join(format!("animated_gradient_q{}.gif", quality));
        let mut file = std::fs::File::create(&path).unwrap();
        encoder.write_to(&mut file).unwrap();

        println!("  Size:           {} bytes", bytes);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!(
            "  Frames/sec:     {:.1}",
            FRAMES as f64 / elapsed.as_secs_f64()
        );
        println!("  Written to:     {}", path.display());
        println!();
    }
}
