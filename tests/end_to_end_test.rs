//! End-to-end tests: corpus file -> training run -> persisted pair -> inference.

use std::fs;

use risk_profiler::corpus::{SyntheticCorpus, read_corpus, write_corpus};
use risk_profiler::error::Result;
use risk_profiler::inference::RiskProfiler;
use risk_profiler::ml::RiskProfile;
use risk_profiler::storage::{ArtifactStore, CLASSIFIER_FILE, VECTORIZER_FILE};
use risk_profiler::training::{TrainingConfig, TrainingPipeline};
use tempfile::TempDir;

#[test]
fn test_train_then_infer_from_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let corpus = dir.path().join("data").join("training_data.csv");
    let models = dir.path().join("models");

    write_corpus(&corpus, &SyntheticCorpus::default().generate(500))?;
    let report = TrainingPipeline::default().run(&corpus, &models)?;

    assert_eq!(report.samples, 500);
    assert_eq!(report.test_size, 100);
    assert!(report.passed_threshold, "weighted F1 {}", report.weighted_f1);
    let store = ArtifactStore::new(&models);
    assert!(store.exists());
    assert!(store.vectorizer_path()?.is_file());
    assert!(store.classifier_path()?.is_file());

    let profiler = RiskProfiler::open(&models);
    assert!(profiler.is_ready());

    let result = profiler.infer("I want to protect my savings and avoid losses");
    assert_eq!(result.risk_profile, RiskProfile::Conservative);
    assert!(result.confidence > 0.34, "confidence {}", result.confidence);
    assert!(result.confidence <= 1.0);
    assert_eq!(result.warning, None);
    assert_eq!(result.error, None);

    Ok(())
}

#[test]
fn test_statements_by_profile() -> Result<()> {
    let outcome = TrainingPipeline::default().train(&SyntheticCorpus::default().generate(500))?;
    let profiler = RiskProfiler::from_pair(outcome.pair);

    let cases = [
        ("Safety is my priority, I can't afford to lose money", RiskProfile::Conservative),
        ("I'd like a diversified mix that balances growth with security", RiskProfile::Balanced),
        ("I'm young and want maximum growth from tech startups", RiskProfile::Aggressive),
    ];
    for (text, expected) in cases {
        let result = profiler.infer(text);
        assert_eq!(result.risk_profile, expected, "{text}");
        assert!(result.confidence > 1.0 / 3.0, "{text}: {}", result.confidence);
    }

    Ok(())
}

#[test]
fn test_retraining_is_deterministic() -> Result<()> {
    let dir = TempDir::new()?;
    let corpus = dir.path().join("corpus.csv");
    write_corpus(&corpus, &SyntheticCorpus::default().generate(300))?;

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    TrainingPipeline::default().run(&corpus, &first)?;
    TrainingPipeline::default().run(&corpus, &second)?;

    let (a_dir, b_dir) = (ArtifactStore::new(&first), ArtifactStore::new(&second));
    let a_generation = a_dir.generation_dir(a_dir.current_generation()?);
    let b_generation = b_dir.generation_dir(b_dir.current_generation()?);
    for file in [VECTORIZER_FILE, CLASSIFIER_FILE] {
        assert_eq!(
            fs::read(a_generation.join(file))?,
            fs::read(b_generation.join(file))?,
            "{file}"
        );
    }

    let a = RiskProfiler::open(&first);
    let b = RiskProfiler::open(&second);
    for example in read_corpus(&corpus)?.iter().take(50) {
        assert_eq!(a.infer(&example.text), b.infer(&example.text));
    }

    Ok(())
}

#[test]
fn test_retrain_replaces_pair() -> Result<()> {
    let dir = TempDir::new()?;
    let models = dir.path().join("models");
    let store = ArtifactStore::new(&models);

    let small = TrainingPipeline::new(TrainingConfig::default())
        .train(&SyntheticCorpus::new(1).generate(90))?;
    store.save(&small.pair)?;

    let large = TrainingPipeline::default().train(&SyntheticCorpus::new(2).generate(500))?;
    store.save(&large.pair)?;

    let loaded = store.load()?;
    assert_eq!(loaded, large.pair);
    assert_eq!(store.current_generation()?, 2);
    assert_eq!(store.load_generation(1)?, small.pair);

    Ok(())
}
