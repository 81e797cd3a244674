use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};
use kuhn_cfr::{
    advance_all,
    eval::compute_exploitability,
    run_iteration,
    InfoSetStore,
};

fn kuhn_iteration_benchmark(c: &mut Criterion) {
    let mut store = InfoSetStore::new();
    c.bench_function("kuhn_cfr::run_iteration 1_000", |b| {
        b.iter(|| {
            for _ in 0..1_000 {
                black_box(run_iteration(&mut store).unwrap());
                advance_all(&mut store);
            }
        });
    });
}

fn kuhn_exploitability_benchmark(c: &mut Criterion) {
    let mut store = InfoSetStore::new();
    for _ in 0..100 {
        run_iteration(&mut store).unwrap();
        advance_all(&mut store);
    }
    c.bench_function("kuhn_cfr::compute_exploitability", |b| {
        b.iter(|| compute_exploitability(black_box(&store)).unwrap());
    });
}

criterion_group!(kuhn_benches, kuhn_iteration_benchmark, kuhn_exploitability_benchmark);
criterion_main!(kuhn_benches);
