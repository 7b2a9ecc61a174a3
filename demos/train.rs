use fractal_glyph::{tokenize, GlyphSession, TrainOptions};
use std::env;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Trains a layered glyph dictionary on a text file and verifies the roundtrip.
///
/// Usage: cargo run --example train <filename> [depth] [dictionary.json]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <filename> [depth] [dictionary.json]", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let depth: u32 = match args.get(2).map(|d| d.parse()) {
        None => 2,
        Some(Ok(depth)) => depth,
        Some(Err(_)) => {
            eprintln!("Depth must be a non-negative integer.");
            std::process::exit(1);
        }
    };

    let text = fs::read_to_string(filename).unwrap_or_else(|_| {
        eprintln!("File \"{}\" not found.", filename);
        std::process::exit(1);
    });

    let mut session = GlyphSession::new(TrainOptions::default());
    if let Err(e) = session.train_layered(&text, depth) {
        eprintln!("Training failed: {e}");
        std::process::exit(1);
    }

    // Verify by decoding
    let tokens = tokenize(&text);
    let encoded = session.encode_text(&text);
    let decoded = session.decode(&encoded);
    if let Some(position) = tokens.iter().zip(&decoded).position(|(a, b)| a != b) {
        eprintln!(
            "Mismatch at token {}: input={}, decoded={}",
            position, tokens[position], decoded[position]
        );
    } else if tokens.len() != decoded.len() {
        eprintln!(
            "Length mismatch: input={}, decoded={}",
            tokens.len(),
            decoded.len()
        );
    }

    if let Some(out) = args.get(3) {
        if let Err(e) = session.dictionary().save(Path::new(out)) {
            eprintln!("Cannot write dictionary: {e}");
            std::process::exit(1);
        }
    }

    let stats = session.stats(&text);

    println!("\n=== Statistics ===");
    println!("Input tokens: {}", stats.input_tokens);
    println!("Encoded tokens: {}", stats.encoded_tokens);
    println!("Layers: {}", session.layer_depth());
    println!("Dictionary entries: {}", stats.dictionary_entries);
    println!("Compression ratio: {:.2}%", stats.compression_ratio());
}
