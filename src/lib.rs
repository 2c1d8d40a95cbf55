//! # Static Huffman Coding
//!
//! *Prefix-free codes from a symbol histogram, for characters or words.*
//!
//! ## Intuition First
//!
//! Morse code gives `E` a single dot and `Q` four symbols: frequent letters get
//! short codes, rare letters get long ones. Huffman coding does the same thing
//! optimally. Count how often each symbol occurs, then repeatedly glue the two
//! rarest groups together until one group is left. Each glue step adds one bit
//! to every code in the two groups, so rare symbols collect many bits and
//! frequent symbols few.
//!
//! ## The Problem
//!
//! A fixed-width alphabet wastes bits on skewed text. Over English prose a few
//! characters (space, `e`, `t`) dominate, and over words a handful of function
//! words do. A static Huffman code built from the whole input exploits that
//! skew with one table, at the cost of storing the table next to the data.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon     Entropy as the fundamental limit
//! 1949  Fano        Top-down splitting (Shannon-Fano codes)
//! 1952  Huffman     Bottom-up greedy merge: optimal prefix codes
//! 1973  Vitter      Adaptive Huffman (not implemented here)
//! 1996  DEFLATE     Huffman over LZ77 literals/lengths
//! ```
//!
//! ## Mathematical Formulation
//!
//! Given symbols $s$ with probabilities $p_s$, Huffman's algorithm finds code
//! lengths $\ell_s$ minimizing the expected length
//!
//! ```text
//! L = Σ p_s · ℓ_s,    with    H(p) ≤ L < H(p) + 1
//! ```
//!
//! subject to the Kraft inequality $\sum 2^{-\ell_s} \le 1$.
//!
//! ## Complexity Analysis
//!
//! - **Model**: $O(N)$ over $N$ input symbols.
//! - **Tree**: $O(n \log n)$ over $n$ distinct symbols (binary heap).
//! - **Encode/decode**: $O(B)$ over $B$ output bits.
//!
//! ## Failure Modes
//!
//! 1. **Table overhead**: in word mode a short text may have nearly as many
//!    distinct symbols as symbols, and the stored table outweighs the savings.
//! 2. **Rounding**: probabilities are rounded to six decimal digits, so symbols
//!    rarer than one in two million are indistinguishable from each other.
//!
//! ## Implementation Notes
//!
//! The pipeline is [`token`] → [`model`] → [`tree`] → [`code`] → [`codec`],
//! and [`container`] stores the result. Probabilities are fixed-point (see
//! [`model::Probability`]), the tree is an index arena walked with an explicit
//! stack, and the artifact records the exact bit length so padding in the last
//! byte is never decoded.
//!
//! ```
//! use huff::{compress, decompress, Artifact, Granularity};
//!
//! let artifact = compress("Hi, world!", Granularity::Word)?;
//! let bytes = artifact.to_bytes();
//! let restored = decompress(&Artifact::from_bytes(&bytes)?)?;
//! assert_eq!(restored, "Hi, world!");
//! # Ok::<(), huff::Error>(())
//! ```
//!
//! ## References
//!
//! - Huffman, D. A. (1952). "A Method for the Construction of Minimum-Redundancy Codes."
//! - Cover, T. M., & Thomas, J. A. (2006). *Elements of Information Theory*, ch. 5.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod code;
pub mod codec;
pub mod container;
pub mod error;
pub mod model;
pub mod token;
pub mod tree;

pub use code::{Code, CodeTable};
pub use codec::{Encoded, HuffmanDecoder, HuffmanEncoder};
pub use container::{compress, compress_reader, decompress, Artifact};
pub use error::Error;
pub use model::{FrequencyModel, Probability};
pub use token::{Granularity, Tokenizer};
pub use tree::HuffmanTree;
