//! Benchmarks for fuzzy inference

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fuzzy_tip::report::Reporter;
use fuzzy_tip::{Defuzzifier, EngineSettings, EvaluationContext, TipSystem};

fn evaluate_benchmark(c: &mut Criterion) {
    let centroid = TipSystem::standard().expect("tipping system");
    let weighted = TipSystem::new(EngineSettings {
        defuzzifier: Defuzzifier::WeightedMean,
        ..EngineSettings::default()
    })
    .expect("tipping system");

    let inputs = [(0.0, 0.0), (3.0, 8.0), (6.5, 9.5)];
    let mut group = c.benchmark_group("evaluate");

    for (servicio, comida) in inputs {
        let label = format!("{}/{}", servicio, comida);
        group.bench_with_input(BenchmarkId::new("centroid", &label), &(servicio, comida), |b, &(s, f)| {
            b.iter(|| black_box(centroid.evaluate(black_box(s), black_box(f))))
        });
        group.bench_with_input(BenchmarkId::new("weighted_mean", &label), &(servicio, comida), |b, &(s, f)| {
            b.iter(|| black_box(weighted.evaluate(black_box(s), black_box(f))))
        });
    }

    group.bench_function("reused_context", |b| {
        let mut ctx = EvaluationContext::new();
        b.iter(|| black_box(centroid.evaluate_with(&mut ctx, black_box(6.5), black_box(9.5)).map(|o| o.tip)))
    });

    group.finish();
}

fn surface_benchmark(c: &mut Criterion) {
    let system = TipSystem::standard().expect("tipping system");
    let reporter = Reporter::new(&system);

    let mut group = c.benchmark_group("control_surface");
    for step in [1.0, 0.5] {
        group.bench_with_input(BenchmarkId::from_parameter(step), &step, |b, &step| {
            b.iter(|| black_box(reporter.control_surface(step).map(|s| s.propina.len())))
        });
    }
    group.finish();
}

criterion_group!(benches, evaluate_benchmark, surface_benchmark);
criterion_main!(benches);
