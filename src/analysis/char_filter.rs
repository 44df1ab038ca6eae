//! Char filters that rewrite raw text before tokenization.
//!
//! Normalization order matters: lowercasing runs before the pattern filter so
//! that characters whose lowercase form is an ASCII letter survive exactly as
//! they would in any other run of the same pipeline.

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod lowercase;
pub mod pattern_replace;

pub use lowercase::LowercaseCharFilter;
pub use pattern_replace::PatternReplaceCharFilter;
