//! Text normalization shared by training and inference.
//!
//! The normalizer is the one place that turns a raw statement into the token
//! normal form the vectorizer was fitted on. Training and inference must go
//! through the same pipeline or the vocabulary lookups silently miss:
//!
//! 1. lowercase the whole input
//! 2. delete every character that is not an ASCII letter or whitespace
//! 3. split on Unicode word boundaries
//! 4. drop English stop words
//! 5. reduce each token to its noun lemma
//! 6. join the survivors with single spaces
//!
//! # Examples
//!
//! ```
//! use risk_profiler::analysis::normalize;
//!
//! let text = normalize("I want to protect my savings and avoid losses!").unwrap();
//! assert_eq!(text.as_str(), "want protect saving avoid loss");
//!
//! let noise = normalize("1234 !!! ### 5678").unwrap();
//! assert!(noise.is_empty());
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::{LowercaseCharFilter, PatternReplaceCharFilter};
use crate::analysis::token_filter::{LemmaFilter, StopFilter};
use crate::analysis::tokenizer::UnicodeWordTokenizer;
use crate::error::Result;

/// Text in token normal form: lowercase alphabetic tokens, stop-word free,
/// lemmatized, joined by single spaces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Build normalized text from tokens that are already in normal form.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tokens
            .into_iter()
            .filter(|t| !t.as_ref().is_empty())
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        NormalizedText(joined)
    }

    /// The normalized text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing behind.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The English normalization pipeline.
#[derive(Clone)]
pub struct Normalizer {
    inner: PipelineAnalyzer,
}

impl Normalizer {
    /// Build the English normalization pipeline.
    pub fn english() -> Result<Self> {
        let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_char_filter(Arc::new(LowercaseCharFilter::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::non_alphabetic()?))
            .add_filter(Arc::new(StopFilter::new()))
            .add_filter(Arc::new(LemmaFilter::new()))
            .with_name("risk_profile_english");

        Ok(Self { inner: analyzer })
    }

    /// Normalize raw text.
    pub fn normalize(&self, raw: &str) -> Result<NormalizedText> {
        let tokens = self.inner.analyze(raw)?;
        Ok(NormalizedText::from_tokens(tokens.map(|token| token.text)))
    }

    /// Normalize a batch of raw texts.
    pub fn normalize_all<S: AsRef<str>>(&self, raws: &[S]) -> Result<Vec<NormalizedText>> {
        raws.iter().map(|raw| self.normalize(raw.as_ref())).collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english().expect("English normalizer should be creatable with default settings")
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Process-wide normalizer; its lexical resources are built on first use.
static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);

/// Normalize raw text with the shared English pipeline.
pub fn normalize(raw: &str) -> Result<NormalizedText> {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// The shared English normalizer.
pub fn default_normalizer() -> &'static Normalizer {
    &DEFAULT_NORMALIZER
}
