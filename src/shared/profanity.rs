//! Wordlist-based profanity censor.
//!
//! Built once at startup and shared read-only; matching is case-insensitive
//! on word boundaries and every match is masked char-for-char.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;

use crate::core::config::ProfanityConfig;
use crate::shared::constants::CENSOR_CHAR;

/// Wordlist compiled into the binary
const DEFAULT_WORDLIST: &str = include_str!("../../assets/profanity_wordlist.txt");

/// Compiled pattern size cap; the default wordlist is far below this
const PATTERN_SIZE_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProfanityError {
    #[error("Failed to read wordlist '{path}': {source}")]
    Wordlist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to compile wordlist: {0}")]
    Pattern(#[from] regex::Error),
}

pub struct Censor {
    pattern: Option<Regex>,
    word_count: usize,
}

impl Censor {
    /// Build a censor from a list of words or phrases
    pub fn new<I, S>(words: I) -> Result<Self, ProfanityError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Ok(Self {
                pattern: None,
                word_count: 0,
            });
        }

        // Longest first so overlapping entries mask the whole phrase
        let mut ordered: Vec<&String> = words.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = ordered
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        // Half boundaries only look outward, so entries may start or end with
        // a non-word character ("a$$") and still match
        let pattern = RegexBuilder::new(&format!(
            r"\b{{start-half}}(?:{})\b{{end-half}}",
            alternation
        ))
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;

        Ok(Self {
            pattern: Some(pattern),
            word_count: words.len(),
        })
    }

    /// Load the wordlist named by configuration, falling back to the embedded one
    pub fn from_config(config: &ProfanityConfig) -> Result<Self, ProfanityError> {
        let mut words = match &config.wordlist_path {
            Some(path) => read_wordlist(path)?,
            None => parse_wordlist(DEFAULT_WORDLIST),
        };
        words.extend(config.extra_words.iter().cloned());

        Self::new(words)
    }

    /// Replace every listed word with a mask of the same length
    pub fn censor(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &Captures| mask(&caps[0]))
                .into_owned(),
            None => text.to_string(),
        }
    }

    pub fn contains_profanity(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

fn mask(word: &str) -> String {
    std::iter::repeat(CENSOR_CHAR)
        .take(word.chars().count())
        .collect()
}

/// One entry per line; blank lines and `#` comments are skipped
fn parse_wordlist(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read_wordlist(path: &Path) -> Result<Vec<String>, ProfanityError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProfanityError::Wordlist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_wordlist(&contents))
}
