use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use promptbandit::services::monte_carlo::{probability_exceeds, probability_of_best};
use promptbandit::{BetaPosterior, Config, ExperimentService, NewPromptVersion, PromptContent};
use std::hint::black_box;
use uuid::Uuid;

fn posteriors(arms: usize) -> Vec<BetaPosterior> {
    (0..arms)
        .map(|i| BetaPosterior::from_counts(40 + 3 * i as u64, 200))
        .collect()
}

fn bench_probability_of_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("probability_of_best");

    for arms in [2usize, 4, 8] {
        let arms_posteriors = posteriors(arms);
        group.bench_with_input(BenchmarkId::new("10k_draws", arms), &arms, |b, _| {
            b.iter(|| black_box(probability_of_best(&arms_posteriors, 10_000, 7)));
        });
    }

    let pair = posteriors(2);
    group.bench_function("exact_two_arm", |b| {
        b.iter(|| black_box(probability_exceeds(&pair[1], &pair[0])));
    });

    group.finish();
}

fn bench_credible_interval(c: &mut Criterion) {
    let posterior = BetaPosterior::from_counts(480, 1_600);
    c.bench_function("credible_interval/95", |b| {
        b.iter(|| black_box(posterior.credible_interval(0.95)));
    });
}

fn bench_select_version(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let service = ExperimentService::in_memory(&Config::default());
    let agent = Uuid::new_v4();
    runtime.block_on(async {
        for i in 0..4 {
            service
                .create_version(NewPromptVersion::new(
                    agent,
                    PromptContent::new(format!("Variant {i}")),
                ))
                .await
                .unwrap();
        }
    });

    c.bench_function("select_version/4_arms", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(service.select_version(agent).await.unwrap()) });
    });
}

criterion_group!(
    benches,
    bench_probability_of_best,
    bench_credible_interval,
    bench_select_version
);
criterion_main!(benches);
