//! Text normalization applied before any answer comparison.
//!
//! lowercase → word-boundary tokenization → drop punctuation → drop stopwords
//! → lemmatize. Token order is preserved and the result is a fixed point:
//! normalizing normalized text returns it unchanged.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::lemma::lemmatize;

/// Language whose stopword list the normalizer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextLanguage {
    #[default]
    English,
}

impl fmt::Display for TextLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextLanguage::English => write!(f, "english"),
        }
    }
}

impl FromStr for TextLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "english" | "en" | "eng" => Ok(TextLanguage::English),
            other => Err(format!("unsupported text language: {other}")),
        }
    }
}

impl TextLanguage {
    fn stopwords(self) -> &'static [&'static str] {
        match self {
            TextLanguage::English => ENGLISH_STOPWORDS,
        }
    }
}

/// Lowercases, tokenizes, filters and lemmatizes text.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<&'static str>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(TextLanguage::default())
    }
}

impl TextNormalizer {
    pub fn new(language: TextLanguage) -> Self {
        Self {
            stopwords: language.stopwords().iter().copied().collect(),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Normalized tokens in input order.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        lowered
            .split_word_bounds()
            .filter(|token| !is_punctuation(token))
            .filter(|token| !self.is_stopword(token))
            .map(lemmatize)
            // a lemma can itself be a stopword ("wills" -> "will"); drop it so a
            // second pass has nothing left to remove
            .filter(|lemma| !lemma.is_empty() && !self.is_stopword(lemma))
            .collect()
    }

    /// Normalized tokens joined with single spaces.
    pub fn normalize(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }
}

/// Whitespace, punctuation and symbol-only segments carry no words.
fn is_punctuation(token: &str) -> bool {
    !token.chars().any(char::is_alphanumeric)
}

/// NLTK's English stopword list.
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn",
    "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn",
    "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];
