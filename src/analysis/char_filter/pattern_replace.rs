use regex::Regex;

use super::CharFilter;
use crate::error::{Result, RiskProfilerError};

/// A char filter that replaces every match of a regex pattern.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern).map_err(|e| {
                RiskProfilerError::analysis(format!("invalid pattern '{pattern}': {e}"))
            })?,
            replacement: replacement.to_string(),
        })
    }

    /// A filter deleting everything that is not an ASCII letter or whitespace.
    ///
    /// Removed characters are not replaced, so `"high-growth"` becomes
    /// `"highgrowth"`.
    pub fn non_alphabetic() -> Result<Self> {
        Self::new(r"[^a-zA-Z\s]", "")
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}
