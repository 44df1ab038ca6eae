//! Criterion benchmarks for the risk profiler.
//!
//! Covers the three per-request stages:
//! - Text normalization
//! - TF-IDF transformation
//! - End-to-end inference, single and batched

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use risk_profiler::analysis::normalize;
use risk_profiler::corpus::SyntheticCorpus;
use risk_profiler::inference::RiskProfiler;
use risk_profiler::training::TrainingPipeline;
use std::hint::black_box;

const STATEMENT: &str =
    "Honestly, I'm nearing retirement and need stable income with minimal risk. What do you recommend?";

/// Train a profiler on the default synthetic corpus.
fn trained_profiler() -> RiskProfiler {
    let examples = SyntheticCorpus::default().generate(500);
    let outcome = TrainingPipeline::default()
        .train(&examples)
        .expect("training on the synthetic corpus");
    RiskProfiler::from_pair(outcome.pair)
}

/// Benchmark text normalization.
fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    group.bench_function("normalize_single_statement", |b| {
        b.iter(|| black_box(normalize(black_box(STATEMENT)).unwrap()))
    });

    let statements: Vec<String> = SyntheticCorpus::new(7)
        .generate(100)
        .into_iter()
        .map(|e| e.text)
        .collect();
    group.throughput(Throughput::Elements(statements.len() as u64));
    group.bench_function("normalize_batch", |b| {
        b.iter(|| {
            for statement in &statements {
                black_box(normalize(statement).unwrap());
            }
        })
    });

    group.finish();
}

/// Benchmark feature extraction and inference.
fn bench_inference(c: &mut Criterion) {
    let profiler = trained_profiler();
    let pair = profiler.models().expect("trained pair").clone();
    let normalized = normalize(STATEMENT).unwrap();

    let mut group = c.benchmark_group("inference");

    group.bench_function("tfidf_transform", |b| {
        b.iter(|| black_box(pair.vectorize(black_box(&normalized))))
    });

    group.bench_function("infer_single", |b| {
        b.iter(|| black_box(profiler.infer(black_box(STATEMENT))))
    });

    let statements: Vec<String> = SyntheticCorpus::new(11)
        .generate(200)
        .into_iter()
        .map(|e| e.text)
        .collect();
    group.throughput(Throughput::Elements(statements.len() as u64));
    group.bench_function("infer_batch", |b| {
        b.iter(|| black_box(profiler.infer_batch(&statements)))
    });

    group.finish();
}

/// Benchmark a full training run.
fn bench_training(c: &mut Criterion) {
    let examples = SyntheticCorpus::default().generate(500);

    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Training is comparatively slow

    group.bench_function("train_500_examples", |b| {
        b.iter(|| black_box(TrainingPipeline::default().train(&examples).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_normalization, bench_inference, bench_training);
criterion_main!(benches);
