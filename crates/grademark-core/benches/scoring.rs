use criterion::{black_box, criterion_group, criterion_main, Criterion};

use grademark_core::model::QuestionReference;
use grademark_core::scoring::ScoringEngine;
use grademark_core::similarity::tfidf_cosine;

fn reference() -> QuestionReference {
    QuestionReference {
        model_answer: "Mitochondria produce energy for the cell by breaking down glucose \
            during cellular respiration."
            .into(),
        keywords: vec![
            "mitochondria".into(),
            "energy".into(),
            "glucose".into(),
            "cellular respiration".into(),
        ],
        max_marks: 10.0,
    }
}

fn bench_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf_cosine");

    group.bench_function("short", |b| {
        b.iter(|| tfidf_cosine(black_box("cell produce energy"), black_box("cell get energy")))
    });

    let long_a = "mitochondrion produce energy cell glucose respiration ".repeat(20);
    let long_b = "cell get energy food oxygen respiration ".repeat(20);
    group.bench_function("long", |b| {
        b.iter(|| tfidf_cosine(black_box(&long_a), black_box(&long_b)))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let engine = ScoringEngine::default();
    let reference = reference();

    group.bench_function("blank", |b| {
        b.iter(|| engine.evaluate(black_box("   "), black_box(&reference)))
    });

    group.bench_function("partial", |b| {
        b.iter(|| engine.evaluate(black_box("The cell gets energy."), black_box(&reference)))
    });

    group.bench_function("perfect", |b| {
        let answer = reference.model_answer.clone();
        b.iter(|| engine.evaluate(black_box(&answer), black_box(&reference)))
    });

    group.finish();
}

criterion_group!(benches, bench_tfidf, bench_evaluate);
criterion_main!(benches);
