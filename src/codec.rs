//! Huffman bit packer and unpacker.

use std::io::BufRead;

use tracing::debug;

use crate::bits::{BitReader, BitWriter};
use crate::code::{CodeTable, DecodeTrie, Step};
use crate::error::{Error, Result};
use crate::token::{Granularity, Tokenizer};

/// Output of the encoder: packed codes plus the bookkeeping needed to unpack them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Codes concatenated in input order and packed MSB-first.
    pub bytes: Vec<u8>,
    /// Number of meaningful bits in `bytes`.
    pub bit_len: u64,
    /// Number of symbols encoded.
    pub symbol_count: u64,
}

/// Huffman encoder.
pub struct HuffmanEncoder<'t> {
    table: &'t CodeTable,
}

impl<'t> HuffmanEncoder<'t> {
    /// Create an encoder over a code table.
    pub fn new(table: &'t CodeTable) -> Self {
        Self { table }
    }

    /// Encode a symbol sequence.
    ///
    /// # Errors
    /// Returns `Error::UnknownSymbol` for the first symbol without a code.
    pub fn encode_symbols<'a, I>(&self, symbols: I) -> Result<Encoded>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut packer = Packer::new(self.table);
        for symbol in symbols {
            packer.push(symbol)?;
        }
        Ok(packer.finish())
    }

    /// Tokenize `text` and encode its symbols.
    pub fn encode_text(&self, text: &str, granularity: Granularity) -> Result<Encoded> {
        self.encode_symbols(Tokenizer::new(granularity).symbols(text))
    }

    /// Tokenize a stream line by line and encode its symbols.
    pub fn encode_reader<R: BufRead>(&self, reader: R, granularity: Granularity) -> Result<Encoded> {
        let mut packer = Packer::new(self.table);
        Tokenizer::new(granularity).for_each_symbol(reader, |symbol| packer.push(symbol))?;
        Ok(packer.finish())
    }
}

struct Packer<'t> {
    table: &'t CodeTable,
    writer: BitWriter,
    symbols: u64,
}

impl<'t> Packer<'t> {
    fn new(table: &'t CodeTable) -> Self {
        Self {
            table,
            writer: BitWriter::new(),
            symbols: 0,
        }
    }

    fn push(&mut self, symbol: &str) -> Result<()> {
        let code = self
            .table
            .get(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_owned()))?;
        self.writer.push_bits(code.bits());
        self.symbols += 1;
        Ok(())
    }

    fn finish(self) -> Encoded {
        let (bytes, bit_len) = self.writer.finish();
        debug!(
            symbols = self.symbols,
            bit_len,
            bytes = bytes.len(),
            "packed symbol stream"
        );
        Encoded {
            bytes,
            bit_len,
            symbol_count: self.symbols,
        }
    }
}

/// Huffman decoder.
pub struct HuffmanDecoder<'t> {
    table: &'t CodeTable,
}

impl<'t> HuffmanDecoder<'t> {
    /// Create a decoder over a code table.
    pub fn new(table: &'t CodeTable) -> Self {
        Self { table }
    }

    /// Decode the first `bit_len` bits of `bytes` into symbols.
    ///
    /// Bits are matched greedily: a symbol is emitted as soon as the bits
    /// gathered since the last symbol equal its code.
    ///
    /// # Errors
    /// Returns `Error::CorruptStream` if `bytes` does not hold exactly
    /// `bit_len` bits, a bit sequence matches no code, or bits are left over.
    pub fn decode_symbols(&self, bytes: &[u8], bit_len: u64) -> Result<Vec<&'t str>> {
        let trie = self.table.trie();
        let mut out = Vec::new();
        let mut at = DecodeTrie::ROOT;
        let mut pending = 0u64;

        for (pos, bit) in BitReader::new(bytes, bit_len)?.enumerate() {
            match trie.step(at, bit) {
                Step::Partial(next) => {
                    at = next;
                    pending += 1;
                }
                Step::Symbol(entry) => {
                    out.push(self.table.symbol(entry));
                    at = DecodeTrie::ROOT;
                    pending = 0;
                }
                Step::Invalid => {
                    return Err(Error::CorruptStream(format!(
                        "bits {}..={pos} match no code",
                        pos as u64 - pending
                    )));
                }
            }
        }

        if pending > 0 {
            return Err(Error::CorruptStream(format!(
                "{pending} trailing bits do not complete a code"
            )));
        }
        debug!(symbols = out.len(), bit_len, "unpacked symbol stream");
        Ok(out)
    }

    /// Decode and concatenate the symbols back into text.
    pub fn decode_text(&self, bytes: &[u8], bit_len: u64) -> Result<String> {
        Ok(self.decode_symbols(bytes, bit_len)?.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::model::FrequencyModel;
    use crate::tree::HuffmanTree;

    fn table(text: &str, granularity: Granularity) -> CodeTable {
        let model = FrequencyModel::from_text(text, granularity).unwrap();
        CodeTable::from_tree(&HuffmanTree::build(&model))
    }

    #[test]
    fn test_huffman_roundtrip() {
        let data = "abracadabra";
        let t = table(data, Granularity::Char);

        let encoded = HuffmanEncoder::new(&t)
            .encode_text(data, Granularity::Char)
            .unwrap();
        let decoded = HuffmanDecoder::new(&t)
            .decode_text(&encoded.bytes, encoded.bit_len)
            .unwrap();

        assert_eq!(data, decoded);
        assert_eq!(encoded.symbol_count, 11);
    }

    #[test]
    fn test_aaab_is_four_bits() {
        let t = table("aaab", Granularity::Char);
        let encoded = HuffmanEncoder::new(&t)
            .encode_text("aaab", Granularity::Char)
            .unwrap();
        // a = 1, b = 0
        assert_eq!(encoded.bit_len, 4);
        assert_eq!(encoded.bytes, vec![0b1110_0000]);
    }

    #[test]
    fn test_padding_not_decoded() {
        // "b" alone would be a 0 bit; the seven zero padding bits must not
        // decode to seven more b's.
        let t = table("aaab", Granularity::Char);
        let encoded = HuffmanEncoder::new(&t)
            .encode_text("b", Granularity::Char)
            .unwrap();
        assert_eq!(encoded.bytes, vec![0]);
        let decoded = HuffmanDecoder::new(&t)
            .decode_text(&encoded.bytes, encoded.bit_len)
            .unwrap();
        assert_eq!(decoded, "b");
    }

    #[test]
    fn test_word_roundtrip() {
        let text = "Hi, world!";
        let t = table(text, Granularity::Word);
        assert_eq!(t.len(), 5);
        let encoded = HuffmanEncoder::new(&t)
            .encode_text(text, Granularity::Word)
            .unwrap();
        let symbols = HuffmanDecoder::new(&t)
            .decode_symbols(&encoded.bytes, encoded.bit_len)
            .unwrap();
        assert_eq!(symbols, vec!["Hi", ",", " ", "world", "!"]);
    }

    #[test]
    fn test_reader_matches_text() {
        let text = "line one\nline two\n";
        let t = table(text, Granularity::Word);
        let enc = HuffmanEncoder::new(&t);
        assert_eq!(
            enc.encode_text(text, Granularity::Word).unwrap(),
            enc.encode_reader(text.as_bytes(), Granularity::Word).unwrap()
        );
    }

    #[test]
    fn test_unknown_symbol() {
        let t = table("abc", Granularity::Char);
        let err = HuffmanEncoder::new(&t)
            .encode_text("abz", Granularity::Char)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(s) if s == "z"));
    }

    #[test]
    fn test_trailing_partial_code() {
        let t = CodeTable::from_entries([
            ("a".to_string(), "0".parse::<Code>().unwrap()),
            ("b".to_string(), "10".parse::<Code>().unwrap()),
            ("c".to_string(), "11".parse::<Code>().unwrap()),
        ])
        .unwrap();
        // "0 1" ends half way through b or c.
        let err = HuffmanDecoder::new(&t)
            .decode_symbols(&[0b0100_0000], 2)
            .unwrap_err();
        assert!(matches!(err, Error::CorruptStream(_)));
    }

    #[test]
    fn test_unreachable_path() {
        let t = CodeTable::from_entries([
            ("a".to_string(), "0".parse::<Code>().unwrap()),
            ("b".to_string(), "10".parse::<Code>().unwrap()),
        ])
        .unwrap();
        // 11 is not a code and no code starts with it.
        let err = HuffmanDecoder::new(&t)
            .decode_symbols(&[0b1100_0000], 2)
            .unwrap_err();
        assert!(matches!(err, Error::CorruptStream(_)));
    }

    #[test]
    fn test_single_symbol_roundtrip() {
        let t = table("x", Granularity::Char);
        let encoded = HuffmanEncoder::new(&t)
            .encode_text("xxx", Granularity::Char)
            .unwrap();
        assert_eq!(encoded.bit_len, 3);
        let decoded = HuffmanDecoder::new(&t)
            .decode_text(&encoded.bytes, encoded.bit_len)
            .unwrap();
        assert_eq!(decoded, "xxx");
    }
}
