//! # Evaluation Benchmarks
//!
//! Performance benchmarks for stage evaluation and budget accounting.
//!
//! Run with: `cargo bench -p stagegate-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stagegate_core::{
    EvaluationContext, ProgressionEngine, ProjectId, RequirementSpec, StageCatalog, StageId,
    StageProgress, WritingMode, evaluate_stage,
};
use std::hint::black_box;
use std::sync::Arc;

/// Content of `words` words split into paragraphs of 50.
fn essay_text(words: usize) -> String {
    (0..words)
        .map(|i| if i % 50 == 49 { "because\n\n" } else { "word " })
        .collect()
}

fn body_requirements() -> Vec<RequirementSpec> {
    vec![
        RequirementSpec::word_count("body_length", Some(300), None),
        RequirementSpec::paragraphs("body_structure", 3),
        RequirementSpec::keywords("evidence", ["because", "therefore", "for example"]),
    ]
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_evaluate_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_stage");
    let requirements = body_requirements();
    let ctx = EvaluationContext {
        word_limit: Some(5000),
        counted_words_excluding_this_stage: Some(1000),
        is_final_stage: false,
    };

    for size in [100, 1000, 10000].iter() {
        let content = essay_text(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(evaluate_stage(&content, &requirements, &ctx)));
        });
    }

    group.finish();
}

fn bench_counted_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("counted_words");
    let engine = ProgressionEngine::new(Arc::new(StageCatalog::builtin()));

    for size in [100, 1000, 10000].iter() {
        let mut state = engine
            .start_project(ProjectId(1), "Bench", WritingMode::Essay, None)
            .expect("start");
        let registry = engine.registry(WritingMode::Essay).expect("registry");
        for stage in registry.stages() {
            let mut progress =
                StageProgress::new(ProjectId(1), stage.id.clone(), stage.requirements.clone());
            progress.content = essay_text(*size);
            state.stages.insert(stage.id.clone(), progress);
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(state.projected_counted_words(registry, &StageId::new("conclusion"), 120))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate_stage, bench_counted_words);
criterion_main!(benches);
