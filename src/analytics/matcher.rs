//! Keyword matching over complaint text
//!
//! A [`KeywordMatcher`] compiles a list of keyword fragments into one
//! case-insensitive regular expression (an OR over all fragments) and answers
//! `matches(text)` for a record.
//!
//! Two modes are supported:
//! - [`MatchMode::Word`] (default): fragments must start at a word boundary.
//!   Fragments ending in a consonant are stems ("регистрат", "ждал") and may
//!   run on into a longer word; any other fragment ("касса", "долго") must also
//!   end at a word boundary. A trailing `*` marks a stem explicitly ("касс*").
//! - [`MatchMode::Substring`]: a fragment may appear anywhere, even inside a
//!   larger word.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::Result;

/// Marker that forces stem treatment of a fragment in word mode
const STEM_MARKER: char = '*';

/// Letters after which a fragment is considered a complete word
const WORD_FINAL_LETTERS: &str = "аеёиоуыэюяьъaeiouy";

/// How keyword fragments are matched against text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Fragment must begin (and, unless it is a stem, end) on a word boundary
    #[default]
    Word,
    /// Fragment may appear anywhere in the text
    Substring,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Substring => "substring",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" | "word-boundary" | "word_boundary" => Ok(Self::Word),
            "substring" | "contains" => Ok(Self::Substring),
            _ => Err(format!("Unknown match mode: {s}")),
        }
    }
}

/// One parsed keyword fragment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
    text: String,
    stem: bool,
}

impl Fragment {
    fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        let (text, explicit_stem) = match lowered.strip_suffix(STEM_MARKER) {
            Some(stripped) => (stripped.trim_end().to_string(), true),
            None => (lowered, false),
        };

        if text.is_empty() {
            return None;
        }

        let stem = explicit_stem || ends_in_consonant(&text);
        Some(Self { text, stem })
    }

    fn pattern(&self, mode: MatchMode) -> String {
        let escaped = regex::escape(&self.text);
        match mode {
            MatchMode::Substring => escaped,
            MatchMode::Word => {
                let starts_word = self.text.chars().next().is_some_and(is_word_char);
                let ends_word = self.text.chars().last().is_some_and(is_word_char);

                let mut pattern = String::with_capacity(escaped.len() + 4);
                if starts_word {
                    pattern.push_str(r"\b");
                }
                pattern.push_str(&escaped);
                if ends_word && !self.stem {
                    pattern.push_str(r"\b");
                }
                pattern
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ends_in_consonant(text: &str) -> bool {
    text.chars()
        .last()
        .is_some_and(|c| c.is_alphabetic() && !WORD_FINAL_LETTERS.contains(c))
}

/// Compiled OR-predicate over a list of keyword fragments
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    mode: MatchMode,
    fragments: Vec<Fragment>,
    regex: Option<Regex>,
}

impl KeywordMatcher {
    /// Compile fragments into a single predicate
    ///
    /// Blank fragments are skipped. An empty list yields a matcher that
    /// never matches.
    pub fn new<I, S>(fragments: I, mode: MatchMode) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for raw in fragments {
            match Fragment::parse(raw.as_ref()) {
                Some(fragment) => parsed.push(fragment),
                None => warn!(fragment = %raw.as_ref(), "Skipping blank keyword fragment"),
            }
        }

        let regex = if parsed.is_empty() {
            None
        } else {
            let alternation = parsed
                .iter()
                .map(|f| f.pattern(mode))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&format!("(?:{alternation})"))
                .case_insensitive(true)
                .unicode(true)
                .build()?;
            Some(regex)
        };

        Ok(Self {
            mode,
            fragments: parsed,
            regex,
        })
    }

    /// True if any fragment matches the text
    pub fn matches(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Same as [`matches`](Self::matches); absent text never matches
    pub fn matches_opt(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.matches(t))
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of usable fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The compiled pattern, if any
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }
}
