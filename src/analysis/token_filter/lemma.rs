//! Lemmatizing token filter.
//!
//! Reduces inflected nouns to their dictionary form: `"savings"` becomes
//! `"saving"`, `"losses"` becomes `"loss"`, `"currencies"` becomes
//! `"currency"`. Every token is treated as a noun. Irregular plurals are looked
//! up in a process-wide exception table; the rest go through suffix rules.
//!
//! The lemmatizer is a fixed point on its own output, which is what makes
//! normalization idempotent.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::Filter;
use super::stop::is_english_stop_word;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for lemmatization algorithms.
pub trait Lemmatizer: Send + Sync {
    /// Reduce a word to its lemma.
    fn lemmatize(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Irregular noun plurals.
static NOUN_EXCEPTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("oxen", "ox"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("halves", "half"),
        ("leaves", "leaf"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("wolves", "wolf"),
        ("selves", "self"),
        ("crises", "crisis"),
        ("analyses", "analysis"),
        ("theses", "thesis"),
        ("indices", "index"),
        ("appendices", "appendix"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("data", "datum"),
        ("media", "medium"),
        ("goes", "go"),
        ("quizzes", "quiz"),
        ("headaches", "headache"),
        ("niches", "niche"),
        ("caches", "cache"),
        ("avalanches", "avalanche"),
    ]
    .into_iter()
    .collect()
});

/// Words that end in `s` but are already lemmas.
static PROTECTED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "news",
        "series",
        "species",
        "always",
        "perhaps",
        "towards",
        "afterwards",
        "whereas",
        "unless",
        "yes",
        "gas",
        "bus",
        "alias",
        "atlas",
        "canvas",
        "lens",
        "chaos",
        "ethos",
        "bias",
        "economics",
        "mathematics",
        "physics",
        "politics",
        "ethics",
        "analytics",
        "sometimes",
        "besides",
        "overseas",
        "nowadays",
    ]
    .into_iter()
    .collect()
});

/// Noun-default English lemmatizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    /// Create a new English lemmatizer.
    pub fn new() -> Self {
        EnglishLemmatizer
    }

    /// Apply the rules until the word stops changing. A strip can expose an
    /// irregular plural (`childrens` -> `children` -> `child`), so a single
    /// pass is not a fixed point.
    fn reduce(word: &str) -> String {
        let mut current = word.to_string();
        loop {
            let next = Self::apply_rules(&current);
            // Rules only shorten the word or map it to an exception lemma,
            // and every exception lemma is left alone by the rules.
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn apply_rules(word: &str) -> String {
        if let Some(lemma) = NOUN_EXCEPTIONS.get(word) {
            return (*lemma).to_string();
        }
        if PROTECTED_WORDS.contains(word) || word.len() <= 3 {
            return word.to_string();
        }

        let strip = |n: usize| word[..word.len() - n].to_string();

        if word.ends_with("sses") {
            return strip(2);
        }
        if word.ends_with("ies") && word.len() > 4 {
            return format!("{}y", &word[..word.len() - 3]);
        }
        if word.ends_with("xes") || word.ends_with("ches") || word.ends_with("shes") {
            return strip(2);
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if word.ends_with('s') {
            return strip(1);
        }

        word.to_string()
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        let lemma = Self::reduce(word);
        // "ons" would otherwise become the stop word "on" and vanish on a second pass.
        if lemma.is_empty() || is_english_stop_word(&lemma) {
            word.to_string()
        } else {
            lemma
        }
    }

    fn name(&self) -> &'static str {
        "english"
    }
}

/// Filter that applies lemmatization to tokens.
pub struct LemmaFilter {
    /// The lemmatizer to use.
    lemmatizer: Box<dyn Lemmatizer>,
}

impl std::fmt::Debug for LemmaFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LemmaFilter")
            .field("lemmatizer", &self.lemmatizer.name())
            .finish()
    }
}

impl LemmaFilter {
    /// Create a new lemma filter with the English lemmatizer.
    pub fn new() -> Self {
        LemmaFilter {
            lemmatizer: Box::new(EnglishLemmatizer::new()),
        }
    }

    /// Create a lemma filter with a custom lemmatizer.
    pub fn with_lemmatizer(lemmatizer: Box<dyn Lemmatizer>) -> Self {
        LemmaFilter { lemmatizer }
    }
}

impl Default for LemmaFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for LemmaFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                let lemma = self.lemmatizer.lemmatize(&token.text);
                token.with_text(lemma)
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}
