use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ndarray::{Array1, ArrayD, IxDyn};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;
use shellstat::{
    AverageBuilder, BinSpec, Coordinates, PowerInput, PowerSpectrumBuilder, Weights, average,
};

fn random_field(n: usize, seed: u64) -> ArrayD<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = Uniform::new(-0.5, 0.5).unwrap();
    ArrayD::from_shape_simple_fn(IxDyn(&[n, n, n]), || dist.sample(&mut rng))
}

fn bench_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("average");
    for n in [16usize, 32, 48].into_iter() {
        let field = random_field(n, 2525365464_u64);
        let x = Array1::linspace(-1.0, 1.0, n);
        let coords = Coordinates::from_axes(&[x.view(), x.view(), x.view()]);
        let bins = BinSpec::Count(n / 2);

        group.throughput(Throughput::Elements((n as u64).pow(3)));
        group.bench_with_input(BenchmarkId::new("Binned", n), &field, |b, field| {
            let config = AverageBuilder::new().build().unwrap();
            b.iter(|| average(field.view(), &coords, &bins, &Weights::default(), &config))
        });
        group.bench_with_input(BenchmarkId::new("Interpolated", n), &field, |b, field| {
            let config = AverageBuilder::new()
                .interpolation("linear")
                .build()
                .unwrap();
            b.iter(|| average(field.view(), &coords, &bins, &Weights::default(), &config))
        });
    }
    group.finish();
}

fn bench_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("power");
    for n in [16usize, 32, 64].into_iter() {
        let field = random_field(n, 8734567_u64);
        let spectrum = PowerSpectrumBuilder::new(1.0)
            .ignore_zero_mode(true)
            .build()
            .unwrap();

        group.throughput(Throughput::Elements((n as u64).pow(3)));
        group.bench_with_input(BenchmarkId::new("Field", n), &field, |b, field| {
            b.iter(|| spectrum.compute(&PowerInput::Field(field.view()), None))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_average, bench_power);
criterion_main!(benches);
