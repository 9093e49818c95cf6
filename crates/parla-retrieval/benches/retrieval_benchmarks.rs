//! Benchmarks for keyword retrieval and prompt augmentation.
//!
//! Scoring is a linear scan, so cost grows with document count times query
//! length. The CI run uses 1,000 documents; set `BENCH_FULL_SCALE=1` to
//! score 50,000.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use parla_core::KnowledgeDocument;
use parla_retrieval::augment_prompt;
use parla_retrieval::scoring::rank;

const CI_DOC_COUNT: usize = 1_000;
const FULL_SCALE_DOC_COUNT: usize = 50_000;

const TOPICS: &[(&str, &str)] = &[
    ("fever symptoms", "High temperature, body aches, fatigue. Drink water and rest."),
    ("sore throat", "Throat pain, difficulty swallowing. Gargle salt water."),
    ("headache relief", "Rest in a quiet dark room and apply a cold compress."),
    ("healthy diet", "Fruits, vegetables, whole grains, lean proteins."),
    ("sleep hygiene", "Keep a regular schedule and avoid screens before bed."),
];

fn doc_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_DOC_COUNT
    } else {
        CI_DOC_COUNT
    }
}

fn build_documents(count: usize) -> Vec<KnowledgeDocument> {
    (0..count)
        .map(|i| {
            let (hint, content) = TOPICS[i % TOPICS.len()];
            KnowledgeDocument {
                id: i as u64 + 1,
                domain: "healthcare".to_string(),
                query_hint: hint.to_string(),
                content: format!("{} Entry {}.", content, i),
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let count = doc_count();
    let docs = build_documents(count);

    let mut group = c.benchmark_group("keyword_rank");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function(format!("short_query_top3_{}docs", count), |b| {
        b.iter(|| {
            let hits = rank(&docs, "fever headache", 3);
            assert_eq!(hits.len(), 3);
            hits
        });
    });

    group.bench_function(format!("sentence_query_top3_{}docs", count), |b| {
        b.iter(|| {
            rank(
                &docs,
                "I have had a sore throat and a mild fever since yesterday evening",
                3,
            )
        });
    });

    group.bench_function(format!("no_match_{}docs", count), |b| {
        b.iter(|| {
            let hits = rank(&docs, "zzzz qqqq", 3);
            assert!(hits.is_empty());
            hits
        });
    });

    group.finish();
}

fn bench_augment(c: &mut Criterion) {
    let docs = build_documents(CI_DOC_COUNT);
    let hits = rank(&docs, "fever headache diet", 3);

    c.bench_function("augment_prompt_3docs", |b| {
        b.iter(|| augment_prompt(&hits, "What should I do about my fever?"));
    });
}

criterion_group!(benches, bench_rank, bench_augment);
criterion_main!(benches);
