use fractal_glyph::{
    address_to_point, address_triangle, min_depth_for_slots, point_to_address, prefix_range,
    tokenize, GlyphSession, Ingestor, MemorySink, TrainOptions,
};

/// Places an encoded text on the Sierpinski address space and prints where
/// each token lands.
///
/// Usage: cargo run --example addresses
fn main() -> fractal_glyph::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let docs = [
        "the cat sat on the mat and the cat sat on the hat",
        "the dog sat on the log and the dog sat on the mat",
    ];

    let mut session = GlyphSession::new(TrainOptions::default());
    session.train(&docs.join(" "))?;

    let encoded: Vec<Vec<String>> = docs.iter().map(|d| session.encode_text(d)).collect();
    let total: usize = encoded.iter().map(Vec::len).sum();
    let depth = min_depth_for_slots(total as u64).max(1);

    let mut ingestor = Ingestor::new(depth)?;
    let mut sink = MemorySink::default();
    for (doc_id, tokens) in encoded.iter().enumerate() {
        ingestor.ingest(doc_id as u64, tokens, &mut sink)?;
    }

    println!("=== Addresses (depth {depth}) ===");
    for (address, token) in &sink.tokens {
        let code = fractal_glyph::to_base3(*address, depth)?;
        let point = address_to_point(&code)?;
        let back = point_to_address(point, depth)?;
        println!(
            "{code} ({:.4}, {:.4}) {token} -> {}",
            point.x,
            point.y,
            session.decode(std::slice::from_ref(token)).join(" "),
        );
        assert_eq!(back, code);
    }

    println!("\n=== Documents ===");
    for bounds in &sink.bounds {
        println!("doc {}: {}..={}", bounds.doc_id, bounds.start, bounds.end);
    }

    let (lo, hi) = prefix_range("0", depth)?;
    let region = address_triangle("0")?;
    println!("\nPrefix \"0\" covers addresses {lo}..{hi}");
    println!(
        "Region corners: ({:.3}, {:.3}) ({:.3}, {:.3}) ({:.3}, {:.3})",
        region.a.x, region.a.y, region.b.x, region.b.y, region.c.x, region.c.y
    );
    println!("Input tokens: {}", tokenize(&docs.join(" ")).len());

    Ok(())
}
