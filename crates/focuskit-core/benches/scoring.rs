use criterion::{black_box, criterion_group, criterion_main, Criterion};

use focuskit_core::model::{AggregateResult, BatteryConfig};
use focuskit_core::scoring::{variability, ChartScores, IndicatorSummary};
use focuskit_core::simulate::{simulate_battery, ParticipantProfile};

fn sample_results() -> AggregateResult {
    AggregateResult {
        hyperactivity_score: 15,
        reaction_times: vec![312, 287, 455, 390, 301],
        avg_reaction_time: 349.0,
        attention_hits: 11,
        attention_misses: 2,
        attention_false_clicks: 5,
        memory_score: 4,
        stroop_score: 80.0,
        time_diff_seconds: 1.4,
        audio_analysis: None,
    }
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let results = sample_results();

    group.bench_function("variability/5", |b| {
        b.iter(|| variability(black_box(&results.reaction_times)))
    });

    let long: Vec<u64> = (0..1000).map(|i| 250 + (i * 37) % 300).collect();
    group.bench_function("variability/1000", |b| b.iter(|| variability(black_box(&long))));

    group.bench_function("chart_scores", |b| {
        b.iter(|| ChartScores::from_results(black_box(&results)))
    });

    group.bench_function("indicators", |b| {
        b.iter(|| IndicatorSummary::evaluate(black_box(&results)))
    });

    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    group.bench_function("steady", |b| {
        b.iter(|| {
            simulate_battery(
                BatteryConfig::default(),
                ParticipantProfile::Steady,
                black_box(42),
            )
        })
    });

    group.bench_function("distracted", |b| {
        b.iter(|| {
            simulate_battery(
                BatteryConfig::default(),
                ParticipantProfile::Distracted,
                black_box(42),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_scoring, bench_simulation);
criterion_main!(benches);
