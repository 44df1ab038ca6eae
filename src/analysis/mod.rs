//! Text analysis for the risk profiler.
//!
//! Raw statements pass through a fixed pipeline of char filters, a tokenizer
//! and token filters. The [`normalizer::Normalizer`] assembles that pipeline
//! and is the single source of normalized text for both training and
//! inference.

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::{Analyzer, PipelineAnalyzer};
pub use normalizer::{NormalizedText, Normalizer, normalize};
pub use token::{Token, TokenStream};
