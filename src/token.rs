//! Tokenization of text into symbols.
//!
//! Two granularities are supported:
//!
//! - **Char**: every Unicode scalar value is its own symbol, including whitespace
//!   and line terminators.
//! - **Word**: a maximal run of word characters (`\w`, which includes `_`), a
//!   maximal run of characters that are neither word characters nor whitespace,
//!   or a single whitespace character.
//!
//! In both modes the symbols partition the input: concatenating them gives back
//! the original text exactly.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Symbol granularity used to split input text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One symbol per character.
    Char,
    /// Words, punctuation runs and single whitespace characters.
    Word,
}

impl Granularity {
    /// Tag used for this granularity in the artifact header.
    pub fn tag(self) -> u8 {
        match self {
            Granularity::Char => 0,
            Granularity::Word => 1,
        }
    }

    /// Inverse of [`Granularity::tag`].
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Granularity::Char),
            1 => Ok(Granularity::Word),
            other => Err(Error::InvalidFormat(format!(
                "unknown granularity tag {other}"
            ))),
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Granularity::Char => "char",
            Granularity::Word => "word",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "char" => Ok(Granularity::Char),
            "word" => Ok(Granularity::Word),
            other => Err(Error::InvalidFormat(format!(
                "unknown symbol granularity {other:?} (expected char or word)"
            ))),
        }
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Alternation is leftmost-first, so word runs win over the single-whitespace arm.
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\s\w]+|\s").expect("word pattern compiles"))
}

/// Splits text into symbols for a fixed [`Granularity`].
#[derive(Clone, Copy, Debug)]
pub struct Tokenizer {
    granularity: Granularity,
}

impl Tokenizer {
    /// Create a tokenizer for the given granularity.
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// The granularity this tokenizer splits by.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Iterate the symbols of `text` in order, borrowing from it.
    pub fn symbols<'t>(&self, text: &'t str) -> Symbols<'t> {
        match self.granularity {
            Granularity::Char => Symbols(Inner::Chars {
                text,
                chars: text.char_indices(),
            }),
            Granularity::Word => Symbols(Inner::Words(word_pattern().find_iter(text))),
        }
    }

    /// Stream the symbols of `reader` line by line into `f`.
    ///
    /// No symbol spans a line terminator in either mode, so this yields exactly
    /// the sequence [`Tokenizer::symbols`] would yield for the whole text.
    ///
    /// # Errors
    /// Returns `Error::Io` if reading fails or the input is not valid UTF-8,
    /// and propagates any error returned by `f`.
    pub fn for_each_symbol<R, F>(&self, mut reader: R, mut f: F) -> Result<()>
    where
        R: BufRead,
        F: FnMut(&str) -> Result<()>,
    {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(());
            }
            for symbol in self.symbols(&line) {
                f(symbol)?;
            }
        }
    }
}

/// Iterator over the symbols of a string. Created by [`Tokenizer::symbols`].
pub struct Symbols<'t>(Inner<'t>);

enum Inner<'t> {
    Chars {
        text: &'t str,
        chars: std::str::CharIndices<'t>,
    },
    Words(regex::Matches<'static, 't>),
}

impl<'t> Iterator for Symbols<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        match &mut self.0 {
            Inner::Chars { text, chars } => {
                let (start, c) = chars.next()?;
                Some(&text[start..start + c.len_utf8()])
            }
            Inner::Words(matches) => matches.next().map(|m| m.as_str()),
        }
    }
}
