//! Code tables: the symbol to bit-string mapping read off a Huffman tree.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::FrequencyModel;
use crate::tree::{HuffmanTree, Node};

/// A variable-length bit string. `false` is 0, `true` is 1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    /// Empty code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a bit sequence.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Self {
            bits: bits.into_iter().collect(),
        }
    }

    /// Append one bit.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// The bits, first bit first.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the code has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// True if `self` is a prefix of `other` (including equality).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.bits.starts_with(&self.bits)
    }

    /// Shorter codes first, then lexicographic by bits.
    pub fn code_order(&self, other: &Code) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.bits.cmp(&other.bits))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        f.pad(&s)
    }
}

impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::InvalidTable(format!(
                    "invalid bit {other:?} in code {s:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(|bits| Code { bits })
    }
}

/// Prefix-free mapping from symbol to [`Code`].
///
/// Entries are kept in code order (see [`Code::code_order`]), which is also the
/// order they are serialized in.
#[derive(Clone, Debug)]
pub struct CodeTable {
    entries: Vec<(String, Code)>,
    index: HashMap<String, usize>,
    trie: DecodeTrie,
}

impl CodeTable {
    /// Read the codes off a tree: 0 for each left descent, 1 for each right.
    ///
    /// When the root is a leaf its symbol gets the one-bit code `0`, so every
    /// code is non-empty and a one-symbol input still decodes.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut entries = Vec::with_capacity(tree.leaf_count());
        let mut stack = vec![(tree.root(), Code::new())];

        while let Some((id, code)) = stack.pop() {
            match tree.node(id) {
                Node::Leaf { symbol, .. } => {
                    let code = if code.is_empty() {
                        Code::from_bits([false])
                    } else {
                        code
                    };
                    entries.push((symbol.clone(), code));
                }
                Node::Internal { left, right, .. } => {
                    let mut right_code = code.clone();
                    right_code.push(true);
                    stack.push((*right, right_code));

                    let mut left_code = code;
                    left_code.push(false);
                    stack.push((*left, left_code));
                }
            }
        }

        // Models reject the empty symbol, and tree codes are non-empty and prefix-free.
        let table = Self::from_entries(entries)
            .expect("codes read off a huffman tree are prefix-free and non-empty");
        debug!(
            symbols = table.len(),
            max_len = table.max_code_len(),
            "derived code table"
        );
        table
    }

    /// Build a table from explicit entries, checking that it can be decoded.
    ///
    /// # Errors
    /// - `Error::DegenerateModel` if any code is empty.
    /// - `Error::InvalidTable` if a symbol is empty or repeats, or a code is a
    ///   prefix of another.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Code)>,
    {
        let mut entries: Vec<(String, Code)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(Error::InvalidTable("no entries".into()));
        }
        entries.sort_by(|a, b| a.1.code_order(&b.1));

        let mut index = HashMap::with_capacity(entries.len());
        let mut trie = DecodeTrie::new();
        for (i, (symbol, code)) in entries.iter().enumerate() {
            if symbol.is_empty() {
                return Err(Error::InvalidTable("empty symbol".into()));
            }
            if code.is_empty() {
                return Err(Error::DegenerateModel(symbol.clone()));
            }
            if index.insert(symbol.clone(), i).is_some() {
                return Err(Error::InvalidTable(format!("duplicate symbol {symbol:?}")));
            }
            trie.insert(code, i)?;
        }

        Ok(Self {
            entries,
            index,
            trie,
        })
    }

    /// Code for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<&Code> {
        self.index.get(symbol).map(|&i| &self.entries[i].1)
    }

    /// Entries in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Code)> {
        self.entries.iter().map(|(s, c)| (s.as_str(), c))
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: an empty table cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the longest code.
    pub fn max_code_len(&self) -> usize {
        self.entries.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Expected bits per symbol when coding the input `model` was built from.
    ///
    /// Symbols of `model` missing from the table are ignored.
    pub fn average_code_length(&self, model: &FrequencyModel) -> f64 {
        let bits: u64 = model
            .entries()
            .filter_map(|(s, count)| self.get(s).map(|c| count * c.len() as u64))
            .sum();
        bits as f64 / model.total() as f64
    }

    pub(crate) fn symbol(&self, entry: usize) -> &str {
        &self.entries[entry].0
    }

    pub(crate) fn trie(&self) -> &DecodeTrie {
        &self.trie
    }
}

/// Result of feeding one bit to a [`DecodeTrie`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The bits so far are a proper prefix of some code.
    Partial(usize),
    /// The bits so far are exactly the code of this table entry.
    Symbol(usize),
    /// No code starts with the bits so far.
    Invalid,
}

#[derive(Clone, Copy, Debug)]
enum TrieNode {
    Branch([Option<usize>; 2]),
    Leaf(usize),
}

/// Binary trie over the codes of a table, used as the reverse lookup when decoding.
#[derive(Clone, Debug)]
pub(crate) struct DecodeTrie {
    nodes: Vec<TrieNode>,
}

impl DecodeTrie {
    pub(crate) const ROOT: usize = 0;

    fn new() -> Self {
        Self {
            nodes: vec![TrieNode::Branch([None, None])],
        }
    }

    fn insert(&mut self, code: &Code, entry: usize) -> Result<()> {
        let conflict = || Error::InvalidTable(format!("code {code} is not prefix-free"));
        let mut at = Self::ROOT;
        for (depth, &bit) in code.bits().iter().enumerate() {
            let last = depth + 1 == code.len();
            let TrieNode::Branch(children) = self.nodes[at] else {
                return Err(conflict());
            };
            at = match children[bit as usize] {
                Some(_) if last => return Err(conflict()),
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(if last {
                        TrieNode::Leaf(entry)
                    } else {
                        TrieNode::Branch([None, None])
                    });
                    if let TrieNode::Branch(children) = &mut self.nodes[at] {
                        children[bit as usize] = Some(child);
                    }
                    child
                }
            };
        }
        Ok(())
    }

    /// Advance from trie node `at` along `bit`.
    pub(crate) fn step(&self, at: usize, bit: bool) -> Step {
        let TrieNode::Branch(children) = self.nodes[at] else {
            return Step::Invalid;
        };
        match children[bit as usize] {
            None => Step::Invalid,
            Some(child) => match self.nodes[child] {
                TrieNode::Leaf(entry) => Step::Symbol(entry),
                TrieNode::Branch(_) => Step::Partial(child),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Granularity;

    fn table(text: &str, granularity: Granularity) -> CodeTable {
        let model = FrequencyModel::from_text(text, granularity).unwrap();
        CodeTable::from_tree(&HuffmanTree::build(&model))
    }

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn test_two_symbol_codes() {
        let t = table("aaab", Granularity::Char);
        assert_eq!(t.get("b").unwrap().to_string(), "0");
        assert_eq!(t.get("a").unwrap().to_string(), "1");
    }

    #[test]
    fn test_uniform_codes_are_two_bits() {
        let t = table("abcd", Granularity::Char);
        assert_eq!(t.len(), 4);
        for (_, c) in t.iter() {
            assert_eq!(c.len(), 2);
        }
        assert_eq!(t.get("b").unwrap().to_string(), "00");
        assert_eq!(t.get("a").unwrap().to_string(), "01");
        assert_eq!(t.get("d").unwrap().to_string(), "10");
        assert_eq!(t.get("c").unwrap().to_string(), "11");
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let t = table("qqqq", Granularity::Char);
        assert_eq!(t.get("q"), Some(&code("0")));
    }

    #[test]
    fn test_codes_prefix_free() {
        let t = table("the quick brown fox jumps over the lazy dog", Granularity::Char);
        let codes: Vec<_> = t.iter().map(|(_, c)| c).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!a.is_prefix_of(b), "{a} is a prefix of {b}");
                }
            }
        }
    }

    #[test]
    fn test_iter_in_code_order() {
        let t = table("aaaabbc", Granularity::Char);
        let order: Vec<_> = t.iter().map(|(_, c)| c.to_string()).collect();
        assert_eq!(order, vec!["1", "00", "01"]);
    }

    #[test]
    fn test_average_code_length() {
        let model = FrequencyModel::from_text("aaab", Granularity::Char).unwrap();
        let t = CodeTable::from_tree(&HuffmanTree::build(&model));
        assert!((t.average_code_length(&model) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_entries_rejects_empty_code() {
        let err = CodeTable::from_entries([("x".to_string(), Code::new())]).unwrap_err();
        assert!(matches!(err, Error::DegenerateModel(s) if s == "x"));
    }

    #[test]
    fn test_from_entries_rejects_prefix_conflict() {
        for (a, b) in [("0", "01"), ("01", "0"), ("10", "10")] {
            let err = CodeTable::from_entries([
                ("x".to_string(), code(a)),
                ("y".to_string(), code(b)),
            ])
            .unwrap_err();
            assert!(matches!(err, Error::InvalidTable(_)), "{a} / {b}");
        }
    }

    #[test]
    fn test_from_entries_rejects_duplicate_symbol() {
        let err = CodeTable::from_entries([
            ("x".to_string(), code("0")),
            ("x".to_string(), code("1")),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn test_trie_steps() {
        let t = CodeTable::from_entries([
            ("a".to_string(), code("0")),
            ("b".to_string(), code("10")),
        ])
        .unwrap();
        let trie = t.trie();
        assert_eq!(trie.step(DecodeTrie::ROOT, false), Step::Symbol(0));
        let Step::Partial(mid) = trie.step(DecodeTrie::ROOT, true) else {
            panic!("1 is a proper prefix of 10");
        };
        assert_eq!(trie.step(mid, false), Step::Symbol(1));
        assert_eq!(trie.step(mid, true), Step::Invalid);
        assert_eq!(t.symbol(1), "b");
    }

    #[test]
    fn test_code_parse_rejects_non_bits() {
        assert!("0120".parse::<Code>().is_err());
        assert_eq!(code("0110").bits(), &[false, true, true, false]);
    }
}
