use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cvxlm::estimators::{HyperValue, Ridge};
use cvxlm::helpers::test_helpers::generate_random_data;

fn bench_ridge(c: &mut Criterion) {
    let mut group = c.benchmark_group("ridge");
    group.sample_size(10);

    for n_samples in [10, 100] {
        for n_features in [10, 100] {
            let (x, y) = generate_random_data(n_samples, n_features);
            let config = (n_samples, n_features);
            let config_string = format!("{}, {}", n_samples, n_features);

            group.bench_with_input(
                BenchmarkId::new("cold", &config_string),
                &config,
                |b, _| {
                    b.iter(|| {
                        let mut estimator = Ridge::params().eta(0.01).build().unwrap();
                        estimator
                            .fit_with_weights(x.view(), y.view(), None)
                            .unwrap();
                    })
                },
            );

            // refitting along a regularization path on unchanged data
            group.bench_with_input(
                BenchmarkId::new("warm", &config_string),
                &config,
                |b, _| {
                    b.iter(|| {
                        let mut estimator =
                            Ridge::params().eta(0.1).warm_start(true).build().unwrap();
                        for eta in [0.1, 0.05, 0.01, 0.005] {
                            estimator.set_param("eta", HyperValue::Real(eta)).unwrap();
                            estimator
                                .fit_with_weights(x.view(), y.view(), None)
                                .unwrap();
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_ridge);
criterion_main!(benches);
