//! Labeled training corpora.
//!
//! A corpus is a CSV file with a header row naming at least the `text` and
//! `risk_profile` columns:
//!
//! ```text
//! text,risk_profile
//! "I want to protect my savings and avoid any losses.",Conservative
//! "A balanced portfolio of stocks and bonds would suit me well.",Balanced
//! ```
//!
//! [`SyntheticCorpus`] produces such a corpus from phrase templates when no
//! real data is available.

pub mod file;
pub mod synthetic;

pub use file::{read_corpus, read_corpus_from_reader, write_corpus, write_corpus_to_writer};
pub use synthetic::SyntheticCorpus;

/// Name of the column holding the statement.
pub const TEXT_COLUMN: &str = "text";

/// Name of the column holding the label.
pub const LABEL_COLUMN: &str = "risk_profile";
