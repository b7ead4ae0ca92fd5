//! TF-IDF cosine similarity between two normalized texts.
//!
//! The vector space is built over exactly the two documents being compared,
//! with smoothed inverse document frequency and L2-normalized rows.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Vocabulary tokens: runs of at least two word characters.
static TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("static regex is valid"));

/// Outcome of a similarity computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Similarity {
    /// Cosine similarity in `[0, 1]`.
    Computed(f64),
    /// Neither text contributed a single vocabulary term.
    Degenerate,
}

impl Similarity {
    /// The similarity value, reading degenerate input as zero.
    pub fn value(self) -> f64 {
        match self {
            Similarity::Computed(v) => v,
            Similarity::Degenerate => 0.0,
        }
    }

    pub fn is_degenerate(self) -> bool {
        matches!(self, Similarity::Degenerate)
    }
}

fn term_counts(text: &str) -> BTreeMap<&str, f64> {
    let mut counts = BTreeMap::new();
    for m in TERM_PATTERN.find_iter(text) {
        *counts.entry(m.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of the TF-IDF vectors of `reference` and `candidate`.
pub fn tfidf_cosine(reference: &str, candidate: &str) -> Similarity {
    let docs = [term_counts(reference), term_counts(candidate)];
    let vocabulary: BTreeSet<&str> = docs.iter().flat_map(|d| d.keys().copied()).collect();
    if vocabulary.is_empty() {
        return Similarity::Degenerate;
    }

    let n_docs = docs.len() as f64;
    let idf = |term: &str| {
        let df = docs.iter().filter(|d| d.contains_key(term)).count() as f64;
        ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
    };

    let vectors: Vec<Vec<f64>> = docs
        .iter()
        .map(|doc| {
            let raw: Vec<f64> = vocabulary
                .iter()
                .map(|term| doc.get(term).copied().unwrap_or(0.0) * idf(term))
                .collect();
            l2_normalize(raw)
        })
        .collect();

    let dot: f64 = vectors[0]
        .iter()
        .zip(&vectors[1])
        .map(|(a, b)| a * b)
        .sum();

    Similarity::Computed(dot.clamp(0.0, 1.0))
}

/// Scale to unit length; a zero vector stays zero.
fn l2_normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_are_fully_similar() {
        let sim = tfidf_cosine("cell produce energy", "cell produce energy").value();
        assert!((sim - 1.0).abs() < 1e-9, "got {sim}");
    }

    #[test]
    fn disjoint_texts_have_zero_similarity() {
        assert_eq!(
            tfidf_cosine("photosynthesis light", "gravity mass"),
            Similarity::Computed(0.0)
        );
    }

    #[test]
    fn partial_overlap_is_between_zero_and_one() {
        let sim = tfidf_cosine("mitochondrion produce energy cell", "cell get energy").value();
        // shared terms weigh 1.0, unique ones 1 + ln(1.5)
        let unique = 1.0 + 1.5f64.ln();
        let expected = 2.0 / ((2.0 * unique * unique + 2.0) * (unique * unique + 2.0)).sqrt();
        assert!((sim - expected).abs() < 1e-9, "got {sim}, expected {expected}");
        assert!(sim > 0.0 && sim < 1.0);
    }

    #[test]
    fn empty_vocabulary_is_degenerate() {
        assert_eq!(tfidf_cosine("", ""), Similarity::Degenerate);
        // single-character tokens never enter the vocabulary
        assert_eq!(tfidf_cosine("a b c", "x"), Similarity::Degenerate);
        assert_eq!(Similarity::Degenerate.value(), 0.0);
    }

    #[test]
    fn one_empty_side_is_zero_not_degenerate() {
        assert_eq!(tfidf_cosine("energy cell", ""), Similarity::Computed(0.0));
    }

    #[test]
    fn repeated_terms_raise_weight() {
        let once = tfidf_cosine("energy cell", "energy wall").value();
        let twice = tfidf_cosine("energy cell", "energy energy wall").value();
        assert!(twice > once);
    }
}
