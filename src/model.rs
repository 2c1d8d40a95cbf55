//! Symbol frequency model.
//!
//! The model is built in one pass over the input and never changes afterwards.
//! Symbols are ordered by count (descending); ties keep the order in which the
//! symbols first appeared. That order seeds the tree builder, so it is part of
//! what makes compressed output reproducible.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::ops::Add;

use tracing::debug;

use crate::error::{Error, Result};
use crate::token::{Granularity, Tokenizer};

/// Fixed-point scale for probabilities: six decimal digits.
pub const PROBABILITY_SCALE: u64 = 1_000_000;

/// A probability rounded to six decimal digits, stored in millionths.
///
/// Rounding is half-up on the exact ratio `count / total`, computed in integer
/// arithmetic, so `1 / 2_000_000` is one millionth rather than zero.
///
/// The sum of two rounded probabilities is itself exact at six digits, so
/// internal tree nodes carry the precise rounded sum of their children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Probability(u64);

impl Probability {
    /// `count / total`, rounded half-up to six decimal digits.
    ///
    /// # Panics
    /// Panics if `total` is zero.
    pub fn from_count(count: u64, total: u64) -> Self {
        assert!(total > 0, "probability of an empty model");
        let num = count as u128 * PROBABILITY_SCALE as u128 * 2 + total as u128;
        Self((num / (total as u128 * 2)) as u64)
    }

    /// Build from a raw number of millionths.
    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Raw number of millionths.
    pub fn micros(self) -> u64 {
        self.0
    }

    /// Decimal value.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / PROBABILITY_SCALE as f64
    }
}

impl Add for Probability {
    type Output = Probability;

    fn add(self, rhs: Probability) -> Probability {
        Probability(self.0 + rhs.0)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / PROBABILITY_SCALE,
            self.0 % PROBABILITY_SCALE
        )
    }
}

/// Occurrence counts for every distinct symbol of an input.
#[derive(Clone, Debug)]
pub struct FrequencyModel {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
    total: u64,
}

impl FrequencyModel {
    /// Count the symbols of `text`.
    ///
    /// # Errors
    /// Returns `Error::EmptyInput` if `text` has no symbols.
    pub fn from_text(text: &str, granularity: Granularity) -> Result<Self> {
        Self::from_symbols(Tokenizer::new(granularity).symbols(text))
    }

    /// Count the symbols of a UTF-8 stream without buffering it whole.
    ///
    /// # Errors
    /// Returns `Error::EmptyInput` for an empty stream and `Error::Io` on read
    /// failure or invalid UTF-8.
    pub fn from_reader<R: BufRead>(reader: R, granularity: Granularity) -> Result<Self> {
        let mut counter = Counter::default();
        Tokenizer::new(granularity).for_each_symbol(reader, |symbol| {
            counter.add(symbol);
            Ok(())
        })?;
        counter.finish()
    }

    /// Count an already tokenized symbol sequence.
    ///
    /// # Errors
    /// Returns `Error::EmptyInput` if the sequence is empty and
    /// `Error::InvalidTable` if it contains the empty string, which no code
    /// table can hold.
    pub fn from_symbols<'a, I>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counter = Counter::default();
        for symbol in symbols {
            counter.add(symbol);
        }
        counter.finish()
    }

    /// `(symbol, count)` pairs in model order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(s, c)| (s.as_str(), *c))
    }

    /// `(symbol, probability)` pairs in model order.
    pub fn probabilities(&self) -> impl Iterator<Item = (&str, Probability)> {
        let total = self.total;
        self.entries()
            .map(move |(s, c)| (s, Probability::from_count(c, total)))
    }

    /// Occurrences of `symbol`, if it appeared at all.
    pub fn count(&self, symbol: &str) -> Option<u64> {
        self.index.get(symbol).map(|&i| self.entries[i].1)
    }

    /// Total number of symbols observed.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: an empty model cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
struct Counter {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
    total: u64,
}

impl Counter {
    fn add(&mut self, symbol: &str) {
        match self.index.get(symbol) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(symbol.to_owned(), self.entries.len());
                self.entries.push((symbol.to_owned(), 1));
            }
        }
        self.total += 1;
    }

    fn finish(self) -> Result<FrequencyModel> {
        if self.total == 0 {
            return Err(Error::EmptyInput);
        }
        if self.index.contains_key("") {
            return Err(Error::InvalidTable("empty symbol".into()));
        }
        let mut entries = self.entries;
        // Stable: equal counts stay in first-appearance order.
        entries.sort_by_key(|&(_, c)| Reverse(c));
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (s, _))| (s.clone(), i))
            .collect();

        debug!(
            distinct = entries.len(),
            total = self.total,
            "built frequency model"
        );

        Ok(FrequencyModel {
            entries,
            index,
            total: self.total,
        })
    }
}
