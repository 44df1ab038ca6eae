//! Output formatting for CLI commands.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RiskProfilerArgs};
use crate::error::Result;
use crate::inference::PredictionResult;

/// Result structure for corpus generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResult {
    pub path: String,
    pub samples: usize,
    pub seed: u64,
    pub class_counts: BTreeMap<String, usize>,
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated {} samples", self.samples)?;
        writeln!(f, "Saved to: {}", self.path)?;
        writeln!(f)?;
        write!(f, "Class distribution:")?;
        for (label, count) in &self.class_counts {
            write!(f, "\n  {label:<14}{count}")?;
        }
        Ok(())
    }
}

/// Output a report in the requested format.
pub fn output_result<T: Serialize + fmt::Display>(result: &T, args: &RiskProfilerArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{result}");
            }
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &RiskProfilerArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Print a prediction as exactly one compact JSON line.
pub fn output_prediction(result: &PredictionResult) {
    println!("{}", result.to_json_line());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_result_display() {
        let mut class_counts = BTreeMap::new();
        class_counts.insert("Balanced".to_string(), 2);
        class_counts.insert("Conservative".to_string(), 2);
        let result = GenerationResult {
            path: "data/training_data.csv".to_string(),
            samples: 4,
            seed: 42,
            class_counts,
        };

        let text = result.to_string();
        assert!(text.starts_with("Generated 4 samples"));
        assert!(text.contains("Balanced"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["class_counts"]["Conservative"], 2);
    }
}
