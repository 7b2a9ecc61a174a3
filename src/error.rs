//! Error type shared by every codec component.

/// Errors surfaced by the glyph codec.
///
/// Empty mining or induction results are not errors; neither is an unknown
/// glyph at decode time, which passes through as a literal.
#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error("no free address at depth {depth}")]
    AddressExhausted { depth: usize },

    #[error("address depth would exceed the limit of {limit}")]
    DepthLimit { limit: usize },

    #[error("malformed dictionary: {0}")]
    MalformedDictionary(String),

    #[error("grammar cycle through symbol {symbol}")]
    CycleDetected { symbol: String },

    #[error("undefined symbol {symbol}")]
    UndefinedSymbol { symbol: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("point ({x}, {y}) is off the lattice at level {level}")]
    OffLattice { x: f64, y: f64, level: usize },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GlyphError>;
