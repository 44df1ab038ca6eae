//! Inference always answers: fallback behavior and concurrent use.

use std::sync::OnceLock;
use std::thread;

use risk_profiler::corpus::SyntheticCorpus;
use risk_profiler::inference::{
    FALLBACK_CONFIDENCE, NO_CONTENT_WARNING, NO_INPUT_WARNING, PredictionResult, RiskProfiler,
};
use risk_profiler::ml::RiskProfile;
use risk_profiler::training::TrainingPipeline;

fn profiler() -> &'static RiskProfiler {
    static PROFILER: OnceLock<RiskProfiler> = OnceLock::new();
    PROFILER.get_or_init(|| {
        let examples = SyntheticCorpus::default().generate(500);
        let outcome = TrainingPipeline::default().train(&examples).unwrap();
        RiskProfiler::from_pair(outcome.pair)
    })
}

fn assert_well_formed(result: &PredictionResult) {
    assert!((0.0..=1.0).contains(&result.confidence), "{result:?}");
    assert!(RiskProfile::ALL.contains(&result.risk_profile));
    if result.is_fallback() {
        assert_eq!(result.risk_profile, RiskProfile::Balanced);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }
}

#[test]
fn test_empty_input_exact_fields() {
    let result = profiler().infer("");
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "risk_profile": "Balanced",
            "confidence": 0.33,
            "warning": "no input provided"
        })
    );
}

#[test]
fn test_noise_input() {
    let result = profiler().infer("1234 !!! ### 5678");

    assert_eq!(result.risk_profile, RiskProfile::Balanced);
    assert_eq!(result.confidence, 0.33);
    assert_eq!(result.warning.as_deref(), Some(NO_CONTENT_WARNING));
    assert_eq!(result.error, None);
}

#[test]
fn test_out_of_vocabulary_input_still_classifies() {
    let result = profiler().infer("zebra quantum pancake");

    assert_well_formed(&result);
    assert!(!result.is_fallback());
}

#[test]
fn test_never_throws_on_odd_input() {
    let long = "growth ".repeat(20_000);
    let inputs = [
        "",
        " ",
        "\u{0}\u{1}\u{2}",
        "€€€ ¥¥¥ £££",
        "日本語のテキスト",
        "caf\u{e9} r\u{e9}sum\u{e9} na\u{ef}ve",
        "a b c d e f g",
        "the and of to is",
        "I",
        long.as_str(),
    ];

    for input in inputs {
        assert_well_formed(&profiler().infer(input));
    }
}

#[test]
fn test_whitespace_only_is_no_input() {
    for input in ["   ", "\t\n", "\r\n  \r\n"] {
        assert_eq!(
            profiler().infer(input).warning.as_deref(),
            Some(NO_INPUT_WARNING)
        );
    }
}

#[test]
fn test_concurrent_inference_matches_sequential() {
    let statements: Vec<String> = SyntheticCorpus::new(99)
        .generate(60)
        .into_iter()
        .map(|e| e.text)
        .collect();
    let expected: Vec<PredictionResult> = statements.iter().map(|s| profiler().infer(s)).collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = profiler().clone();
            let statements = statements.clone();
            thread::spawn(move || statements.iter().map(|s| shared.infer(s)).collect::<Vec<_>>())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(profiler().infer_batch(&statements), expected);
}

#[test]
fn test_json_line_has_only_contract_keys() {
    for input in ["", "1234", "I want steady growth with some stability"] {
        let line = profiler().infer(input).to_json_line();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        for key in value.as_object().unwrap().keys() {
            assert!(
                ["risk_profile", "confidence", "warning", "error"].contains(&key.as_str()),
                "unexpected key {key}"
            );
        }
    }
}
