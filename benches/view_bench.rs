use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polyarray::Array;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, n: usize) -> Array {
    let data: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Array::from_vec(&[n, n], data).expect("length matches")
}

fn bench_transpose_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose_read");
    let mut rng = StdRng::seed_from_u64(23);
    for n in [100usize, 500] {
        group.throughput(Throughput::Elements((n * n) as u64));

        let m = random_matrix(&mut rng, n);
        let t = m.transpose().expect("rank 2 transposes");

        group.bench_with_input(BenchmarkId::new("view_sum", n), &n, |b, _| {
            b.iter(|| t.element_sum())
        });
        group.bench_with_input(BenchmarkId::new("materialize", n), &n, |b, _| {
            b.iter(|| t.duplicate())
        });
    }
    group.finish();
}

fn bench_slice_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_iteration");
    let mut rng = StdRng::seed_from_u64(29);
    for n in [100usize, 500] {
        group.throughput(Throughput::Elements((n * n) as u64));

        let m = random_matrix(&mut rng, n);
        group.bench_with_input(BenchmarkId::new("row_to_vec", n), &n, |b, _| {
            b.iter(|| {
                let mut acc = 0.0;
                for row in m.slices() {
                    acc += row.to_vec().iter().sum::<f64>();
                }
                acc
            })
        });
        group.bench_with_input(BenchmarkId::new("elements", n), &n, |b, _| {
            b.iter(|| m.elements().sum::<f64>())
        });
    }
    group.finish();
}

fn bench_composed_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("composed_views");
    let mut rng = StdRng::seed_from_u64(31);
    for n in [100usize, 500] {
        let m = random_matrix(&mut rng, n);
        let joined = m.join(&m, 0).expect("shapes match");
        let window = joined
            .sub_array(&[n / 2, 0], &[n, n])
            .expect("window fits");
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_with_input(BenchmarkId::new("join_window_sum", n), &n, |b, _| {
            b.iter(|| window.element_sum())
        });

        let rotated = m.rotate_view(0, (n / 3) as isize).expect("dim in range");
        group.bench_with_input(BenchmarkId::new("rotate_sum", n), &n, |b, _| {
            b.iter(|| rotated.element_sum())
        });

        let broadcast = m.slice(0).expect("row exists").broadcast(&[n, n]).expect("trailing dims match");
        group.bench_with_input(BenchmarkId::new("broadcast_sum", n), &n, |b, _| {
            b.iter(|| broadcast.element_sum())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_transpose_read,
    bench_slice_iteration,
    bench_composed_views
);
criterion_main!(benches);
