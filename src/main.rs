//! GIF Encoder CLI - Encode raw RGBA frames from a JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use gif_encoder::{GifEncoder, schema::EncoderConfig};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 4 {
        eprintln!("Usage: {} <config.json> <output.gif> <frame.rgba>...", args[0]);
        eprintln!();
        eprintln!("Encode raw RGBA frames into an animated GIF.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to encoder configuration file");
        eprintln!("  output.gif   Path of the GIF to write");
        eprintln!("  frame.rgba   Raw frames, width * height * 4 bytes each, in order");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);
    let frame_paths = &args[3..];

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EncoderConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let mut encoder = GifEncoder::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error creating encoder: {}", e);
        std::process::exit(1);
    });

    println!("GIF Encoder");
    println!("===========");
    println!("Canvas: {}x{}", encoder.width(), encoder.height());
    println!("Frames: {}", frame_paths.len());
    println!("Delay: {}/100 s", encoder.delay());
    println!("Quality: {}", encoder.quality());
    match encoder.repeat() {
        -1 => println!("Loop: none"),
        0 => println!("Loop: forever"),
        n => println!("Loop: {} times", n),
    }
    println!();

    if let Err(e) = encoder.start() {
        eprintln!("Error starting encoder: {}", e);
        std::process::exit(1);
    }

    let start = Instant::now();

    for (i, path) in frame_paths.iter().enumerate() {
        let frame = fs::read(path).unwrap_or_else(|e| {
            eprintln!("Error reading frame {}: {}", path, e);
            std::process::exit(1);
        });

        let before = encoder.data().len();
        if let Err(e) = encoder.add_frame(&frame) {
            eprintln!("Error encoding frame {}: {}", path, e);
            std::process::exit(1);
        }

        println!(
            "  Frame {}/{}: {} bytes",
            i + 1,
            frame_paths.len(),
            encoder.data().len() - before
        );
    }

    let total = match encoder.finish() {
        Ok(gif) => gif.len(),
        Err(e) => {
            eprintln!("Error finishing GIF: {}", e);
            std::process::exit(1);
        }
    };

    let elapsed = start.elapsed();

    if let Err(e) = fs::write(&output_path, encoder.data()) {
        eprintln!("Error writing {}: {}", output_path.display(), e);
        std::process::exit(1);
    }

    println!();
    println!("Wrote {} ({} bytes)", output_path.display(), total);
    println!(
        "Time: {:.2}s ({:.1} frames/s)",
        elapsed.as_secs_f32(),
        frame_paths.len() as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = EncoderConfig {
        repeat: 0,
        frame_rate: Some(25.0),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
