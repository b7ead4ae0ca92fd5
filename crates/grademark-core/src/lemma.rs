//! Rule-based noun lemmatizer.
//!
//! Reduces inflected nouns to their dictionary form (`cells` → `cell`,
//! `children` → `child`). Single reduction steps are repeated until the word
//! stops changing, so every output is a fixed point of [`lemmatize`]:
//! `peoples` → `people` → `person`.

/// Irregular forms that suffix rules would get wrong.
pub(crate) const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("dice", "die"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("halves", "half"),
    ("wolves", "wolf"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("mitochondria", "mitochondrion"),
    ("bacteria", "bacterium"),
    ("spectra", "spectrum"),
    ("strata", "stratum"),
    ("analyses", "analysis"),
    ("hypotheses", "hypothesis"),
    ("theses", "thesis"),
    ("crises", "crisis"),
    ("diagnoses", "diagnosis"),
    ("axes", "axis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("appendices", "appendix"),
    ("nuclei", "nucleus"),
    ("fungi", "fungus"),
    ("cacti", "cactus"),
    ("stimuli", "stimulus"),
    ("radii", "radius"),
    ("buses", "bus"),
    ("gases", "gas"),
    ("goes", "go"),
    ("heroes", "hero"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("echoes", "echo"),
];

/// Words ending in `s` that are already singular.
pub(crate) const INVARIANT: &[&str] = &[
    "species", "series", "news", "means", "physics", "mathematics", "economics", "ethics",
    "genetics", "statistics", "politics", "electronics", "mechanics", "aerobics", "athletics",
    "lens", "canvas", "atlas", "always", "perhaps", "whereas", "yes", "towards", "afterwards",
];

/// Reduce a lowercase token to its base form.
pub fn lemmatize(token: &str) -> String {
    // every step either ends on an irregular lemma (a fixed point) or
    // shortens the word, so this terminates
    let mut current = token.to_string();
    loop {
        let next = reduce_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn reduce_once(token: &str) -> String {
    let base = strip_possessive(token);
    if !base.chars().all(char::is_alphabetic) {
        return base.to_string();
    }
    lemmatize_word(base)
}

fn strip_possessive(token: &str) -> &str {
    token
        .strip_suffix("'s")
        .or_else(|| token.strip_suffix("\u{2019}s"))
        .filter(|base| !base.is_empty())
        .unwrap_or(token)
}

fn lemmatize_word(word: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(form, _)| *form == word) {
        return (*lemma).to_string();
    }
    if word.chars().count() <= 3 || INVARIANT.contains(&word) || is_lemma(word) {
        return word.to_string();
    }

    for (suffix, replacement) in [
        ("sses", "ss"),
        ("xes", "x"),
        ("zzes", "zz"),
        ("ches", "ch"),
        ("shes", "sh"),
    ] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{replacement}");
        }
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }

    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Forms the suffix rules leave alone: targets of the irregular table and
/// singular words that merely end in `s`.
fn is_lemma(word: &str) -> bool {
    IRREGULAR.iter().any(|(_, lemma)| *lemma == word)
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
}
