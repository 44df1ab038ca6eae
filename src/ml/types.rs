//! Common types for risk profile classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RiskProfilerError;

/// Risk tolerance category. No other value is ever a model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskProfile {
    /// Capital preservation first.
    Conservative,
    /// Growth balanced against stability. Also the fallback answer.
    Balanced,
    /// Maximum growth, high volatility tolerated.
    Aggressive,
}

impl RiskProfile {
    /// All profiles in canonical order. Classifier outputs are indexed by it.
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Conservative,
        RiskProfile::Balanced,
        RiskProfile::Aggressive,
    ];

    /// Number of profiles.
    pub const COUNT: usize = 3;

    /// Position of this profile in [`RiskProfile::ALL`].
    pub fn index(self) -> usize {
        match self {
            RiskProfile::Conservative => 0,
            RiskProfile::Balanced => 1,
            RiskProfile::Aggressive => 2,
        }
    }

    /// Profile at the given position of [`RiskProfile::ALL`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical label string.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::Balanced => "Balanced",
            RiskProfile::Aggressive => "Aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskProfile {
    type Err = RiskProfilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|profile| profile.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RiskProfilerError::other(format!("unknown risk profile '{trimmed}'")))
    }
}

/// A labeled training statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Raw statement text.
    pub text: String,
    /// Risk profile label.
    #[serde(rename = "risk_profile")]
    pub label: RiskProfile,
}

impl LabeledExample {
    /// Create a new labeled example.
    pub fn new<S: Into<String>>(text: S, label: RiskProfile) -> Self {
        LabeledExample {
            text: text.into(),
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for profile in RiskProfile::ALL {
            assert_eq!(RiskProfile::from_index(profile.index()), Some(profile));
        }
        assert_eq!(RiskProfile::from_index(3), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "Conservative".parse::<RiskProfile>().unwrap(),
            RiskProfile::Conservative
        );
        assert_eq!(" aggressive ".parse::<RiskProfile>().unwrap(), RiskProfile::Aggressive);
        assert!("Reckless".parse::<RiskProfile>().is_err());
    }

    #[test]
    fn test_serde_uses_label_names() {
        let json = serde_json::to_string(&RiskProfile::Balanced).unwrap();
        assert_eq!(json, "\"Balanced\"");

        let example = LabeledExample::new("Bonds only", RiskProfile::Conservative);
        let json = serde_json::to_value(&example).unwrap();
        assert_eq!(json["risk_profile"], "Conservative");
    }
}
