//! The compressed artifact: packed codes plus everything needed to unpack them.
//!
//! # Format (version 1)
//!
//! All integers are little-endian.
//!
//! ```text
//! magic        4 bytes  "HUFF"
//! version      u8       1
//! granularity  u8       0 = char, 1 = word
//! symbol_count u64      number of encoded symbols
//! bit_len      u64      meaningful bits in the payload
//! entry_count  u32      code table entries
//! entries      entry_count x {
//!                sym_len  u32, sym bytes (UTF-8)
//!                code_len u32, ceil(code_len / 8) bytes, MSB-first
//!              }
//! payload_len  u64      must equal ceil(bit_len / 8)
//! payload      payload_len bytes
//! ```
//!
//! Entries are written in code order (shorter codes first, then by bits), so
//! the same input always produces the same bytes.

use std::io::{self, BufRead, Read, Write};

use tracing::debug;

use crate::bits::{padding_bits, BitReader, BitWriter};
use crate::code::{Code, CodeTable};
use crate::codec::{Encoded, HuffmanDecoder, HuffmanEncoder};
use crate::error::{Error, Result};
use crate::model::FrequencyModel;
use crate::token::Granularity;
use crate::tree::HuffmanTree;

/// Leading bytes of every artifact.
pub const MAGIC: [u8; 4] = *b"HUFF";

/// Current format version.
pub const VERSION: u8 = 1;

/// A self-contained compressed artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Granularity the input was tokenized with.
    pub granularity: Granularity,
    /// Code table used to pack the payload.
    pub table: CodeTable,
    /// Packed payload and its bit/symbol counts.
    pub encoded: Encoded,
}

impl Artifact {
    /// Padding bits at the end of the payload's last byte.
    pub fn padding_bits(&self) -> u8 {
        padding_bits(self.encoded.bit_len)
    }

    /// Serialize to the version 1 format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.encoded.bytes.len());
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.push(self.granularity.tag());
        out.extend_from_slice(&self.encoded.symbol_count.to_le_bytes());
        out.extend_from_slice(&self.encoded.bit_len.to_le_bytes());
        out.extend_from_slice(&(self.table.len() as u32).to_le_bytes());

        for (symbol, code) in self.table.iter() {
            out.extend_from_slice(&(symbol.len() as u32).to_le_bytes());
            out.extend_from_slice(symbol.as_bytes());

            let mut bits = BitWriter::new();
            bits.push_bits(code.bits());
            let (packed, len) = bits.finish();
            out.extend_from_slice(&(len as u32).to_le_bytes());
            out.extend_from_slice(&packed);
        }

        out.extend_from_slice(&(self.encoded.bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&self.encoded.bytes);
        out
    }

    /// Parse the version 1 format.
    ///
    /// # Errors
    /// - `Error::InvalidFormat` for a bad header, truncation or trailing bytes.
    /// - `Error::InvalidTable` / `Error::DegenerateModel` for an unusable table.
    /// - `Error::CorruptStream` if the payload length disagrees with `bit_len`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor { buf: bytes, pos: 0 };

        if r.take(4, "magic")? != MAGIC {
            return Err(Error::InvalidFormat("bad magic".into()));
        }
        let version = r.u8("version")?;
        if version != VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported version {version}"
            )));
        }
        let granularity = Granularity::from_tag(r.u8("granularity")?)?;
        let symbol_count = r.u64("symbol count")?;
        let bit_len = r.u64("bit length")?;

        let entry_count = r.u32("entry count")?;
        let mut entries = Vec::new();
        for _ in 0..entry_count {
            let sym_len = r.u32("symbol length")? as usize;
            let symbol = std::str::from_utf8(r.take(sym_len, "symbol")?)
                .map_err(|e| Error::InvalidFormat(format!("symbol is not UTF-8: {e}")))?
                .to_owned();
            let code_len = r.u32("code length")? as u64;
            let packed = r.take(code_len.div_ceil(8) as usize, "code")?;
            let code = Code::from_bits(BitReader::new(packed, code_len)?);
            entries.push((symbol, code));
        }
        let table = CodeTable::from_entries(entries)?;

        let payload_len = r.u64("payload length")?;
        if payload_len != bit_len.div_ceil(8) {
            return Err(Error::CorruptStream(format!(
                "payload of {payload_len} bytes cannot hold exactly {bit_len} bits"
            )));
        }
        let payload = r.take(payload_len as usize, "payload")?.to_vec();
        if r.pos != bytes.len() {
            return Err(Error::InvalidFormat(format!(
                "{} trailing bytes",
                bytes.len() - r.pos
            )));
        }

        Ok(Self {
            granularity,
            table,
            encoded: Encoded {
                bytes: payload,
                bit_len,
                symbol_count,
            },
        })
    }

    /// Write the serialized artifact to `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        w.flush()?;
        Ok(())
    }

    /// Read a whole artifact from `r`.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::InvalidFormat(format!("truncated {what}")))?;
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut a = [0u8; N];
        a.copy_from_slice(self.take(N, what)?);
        Ok(a)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }
}

/// Compress in-memory text.
///
/// # Errors
/// Returns `Error::EmptyInput` if `text` has no symbols.
pub fn compress(text: &str, granularity: Granularity) -> Result<Artifact> {
    let model = FrequencyModel::from_text(text, granularity)?;
    let table = CodeTable::from_tree(&HuffmanTree::build(&model));
    let encoded = HuffmanEncoder::new(&table).encode_text(text, granularity)?;
    log_ratio(&model, &table, &encoded);
    Ok(Artifact {
        granularity,
        table,
        encoded,
    })
}

/// Compress a re-readable stream in two passes without buffering it whole.
///
/// `open` is called twice: once to build the model and once to encode.
///
/// # Errors
/// Returns `Error::Io` if `open` or reading fails, `Error::EmptyInput` for an
/// empty stream, and `Error::UnknownSymbol` if the second pass sees a symbol
/// the first did not.
pub fn compress_reader<R, F>(mut open: F, granularity: Granularity) -> Result<Artifact>
where
    R: BufRead,
    F: FnMut() -> io::Result<R>,
{
    let model = FrequencyModel::from_reader(open()?, granularity)?;
    let table = CodeTable::from_tree(&HuffmanTree::build(&model));
    let encoded = HuffmanEncoder::new(&table).encode_reader(open()?, granularity)?;
    log_ratio(&model, &table, &encoded);
    Ok(Artifact {
        granularity,
        table,
        encoded,
    })
}

/// Reconstruct the original text.
///
/// # Errors
/// Returns `Error::CorruptStream` if the payload does not decode cleanly or
/// decodes to a different number of symbols than was recorded.
pub fn decompress(artifact: &Artifact) -> Result<String> {
    let Encoded {
        bytes,
        bit_len,
        symbol_count,
    } = &artifact.encoded;
    let symbols = HuffmanDecoder::new(&artifact.table).decode_symbols(bytes, *bit_len)?;
    if symbols.len() as u64 != *symbol_count {
        return Err(Error::CorruptStream(format!(
            "decoded {} symbols, artifact records {symbol_count}",
            symbols.len()
        )));
    }
    Ok(symbols.concat())
}

fn log_ratio(model: &FrequencyModel, table: &CodeTable, encoded: &Encoded) {
    debug!(
        symbols = table.len(),
        avg_bits = table.average_code_length(model),
        payload_bytes = encoded.bytes.len(),
        "compressed"
    );
}
