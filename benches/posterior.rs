use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DVector;
use num_complex::Complex64;
use whittle::{PsdConfig, PsdSampler};

fn setup(n_data: usize, j: usize) -> PsdSampler {
    let mut sampler = PsdSampler::new(PsdConfig::new(n_data, 1.0).knots(j).seed(1)).unwrap();
    let dft: Vec<Complex64> = (0..n_data)
        .map(|k| Complex64::new((n_data as f64).sqrt() * (1.0 + 0.1 * (k as f64).sin()), 0.0))
        .collect();
    sampler.set_periodogram(&dft, None).unwrap();
    sampler
        .set_reference(DVector::zeros(j + 1), DVector::from_element(j + 1, 1.0))
        .unwrap();
    sampler
}

fn posterior_evaluation(c: &mut Criterion) {
    let sampler = setup(4096, 30);
    let x = DVector::from_element(31, 0.1);
    c.bench_function("log_posterior_4096_j30", |b| {
        b.iter(|| sampler.log_posterior(black_box(&x)).unwrap())
    });
}

fn short_chain(c: &mut Criterion) {
    c.bench_function("sample_psd_1024_j10_200it", |b| {
        b.iter(|| {
            let mut sampler = setup(1024, 10);
            sampler.sample_psd(black_box(200), 50).unwrap()
        })
    });
}

criterion_group!(benches, posterior_evaluation, short_chain);
criterion_main!(benches);
