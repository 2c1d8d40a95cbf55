//! Error types for Huffman coding.

use thiserror::Error;

/// Error variants for modeling, encoding, decoding and artifact I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// The input contained no symbols, so no model can be built.
    #[error("empty input: no symbols to model")]
    EmptyInput,

    /// A code table assigns an empty code to its only symbol.
    #[error("degenerate model: symbol {0:?} has an empty code")]
    DegenerateModel(String),

    /// A symbol was encountered that the code table has no code for.
    #[error("unknown symbol: {0:?}")]
    UnknownSymbol(String),

    /// The bit stream does not decode cleanly against the code table.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// The code table is not a valid prefix-free table.
    #[error("invalid code table: {0}")]
    InvalidTable(String),

    /// The artifact bytes do not follow the container format.
    #[error("invalid artifact: {0}")]
    InvalidFormat(String),

    /// An I/O error occurred while reading input or writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for Huffman operations.
pub type Result<T> = std::result::Result<T, Error>;
