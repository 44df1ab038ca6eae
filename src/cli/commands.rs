//! Command implementations for the risk-profiler CLI.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Read};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::corpus::{SyntheticCorpus, write_corpus};
use crate::error::Result;
use crate::inference::{PredictionResult, RiskProfiler};
use crate::ml::types::RiskProfile;
use crate::training::{TrainingConfig, TrainingPipeline};

/// Execute a CLI command.
///
/// `predict` never returns an error: every failure becomes a fallback
/// prediction on stdout.
pub fn execute_command(args: RiskProfilerArgs) -> Result<()> {
    match &args.command {
        Command::Generate(generate_args) => generate_corpus(generate_args.clone(), &args),
        Command::Train(train_args) => train_models(train_args.clone(), &args),
        Command::Predict(predict_args) => {
            predict(predict_args.clone());
            Ok(())
        }
    }
}

/// Write a synthetic corpus.
fn generate_corpus(args: GenerateArgs, cli_args: &RiskProfilerArgs) -> Result<()> {
    let examples = SyntheticCorpus::new(args.seed).generate(args.samples);
    write_corpus(&args.output, &examples)?;

    let mut class_counts = BTreeMap::new();
    for profile in RiskProfile::ALL {
        let count = examples.iter().filter(|e| e.label == profile).count();
        class_counts.insert(profile.to_string(), count);
    }

    output_result(
        &GenerationResult {
            path: args.output.to_string_lossy().to_string(),
            samples: examples.len(),
            seed: args.seed,
            class_counts,
        },
        cli_args,
    )
}

/// Train on a corpus and persist the model pair.
fn train_models(args: TrainArgs, cli_args: &RiskProfilerArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };

    let report = TrainingPipeline::new(config).run(&args.corpus, &args.models)?;
    log::info!("saved artifacts to {}", args.models.display());
    output_result(&report, cli_args)
}

/// Classify the command line text or stdin.
fn predict(args: PredictArgs) {
    let profiler = RiskProfiler::open(&args.models);

    if args.lines {
        for result in predict_lines(&profiler, read_lines(io::stdin().lock())) {
            output_prediction(&result);
        }
        return;
    }

    let result = match args.joined_text() {
        Some(text) => profiler.infer(&text),
        None => {
            let mut bytes = Vec::new();
            match io::stdin().read_to_end(&mut bytes) {
                Ok(_) => profiler.infer(&String::from_utf8_lossy(&bytes)),
                Err(e) => PredictionResult::fallback_error(format!("cannot read stdin: {e}")),
            }
        }
    };
    output_prediction(&result);
}

/// One entry per input line: the line text, or why it cannot be classified.
type LineInput = std::result::Result<String, String>;

/// Split `reader` into lines. A line that is not UTF-8 becomes an error entry
/// and reading continues; a read failure ends the input with an error entry.
fn read_lines<R: BufRead>(reader: R) -> Vec<LineInput> {
    let mut inputs = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        match line {
            Ok(mut bytes) => {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                inputs.push(
                    String::from_utf8(bytes)
                        .map_err(|_| format!("line {} is not valid UTF-8", index + 1)),
                );
            }
            Err(e) => {
                inputs.push(Err(format!("cannot read stdin: {e}")));
                break;
            }
        }
    }
    inputs
}

/// Classify every readable line in parallel; one result per input, in order.
fn predict_lines(profiler: &RiskProfiler, inputs: Vec<LineInput>) -> Vec<PredictionResult> {
    let texts: Vec<&str> = inputs.iter().filter_map(|i| i.as_deref().ok()).collect();
    let mut classified = profiler.infer_batch(&texts).into_iter();

    inputs
        .iter()
        .map(|input| match input {
            Ok(_) => classified
                .next()
                .unwrap_or_else(|| PredictionResult::fallback_error("missing batch result")),
            Err(message) => PredictionResult::fallback_error(message.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::NO_INPUT_WARNING;
    use std::io::Cursor;

    #[test]
    fn test_read_lines_keeps_going_after_bad_utf8() {
        let input = b"protect my savings\r\n\xff\xfe\nmaximum growth\n\n".to_vec();

        let lines = read_lines(Cursor::new(input));

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].as_deref(), Ok("protect my savings"));
        assert_eq!(lines[1], Err("line 2 is not valid UTF-8".to_string()));
        assert_eq!(lines[2].as_deref(), Ok("maximum growth"));
        assert_eq!(lines[3].as_deref(), Ok(""));
    }

    #[test]
    fn test_predict_lines_one_result_per_line() {
        let profiler = RiskProfiler::open("/nonexistent/models");
        let inputs = read_lines(Cursor::new(b"growth\n\xff\nbonds\n\n".to_vec()));

        let results = predict_lines(&profiler, inputs);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].error.as_deref(), Some("models not found"));
        assert_eq!(results[1].error.as_deref(), Some("line 2 is not valid UTF-8"));
        assert_eq!(results[2].error.as_deref(), Some("models not found"));
        assert_eq!(results[3].warning.as_deref(), Some(NO_INPUT_WARNING));
        assert!(results.iter().all(|r| r.is_fallback()));
    }
}
