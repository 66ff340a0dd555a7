use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use packed_vec::{PackedVec, Value, VectorType};
use rand::{thread_rng, Rng};

const PV_ELEMS: usize = 100_000;
const PV_TYPES: [&str; 5] = ["int8", "int24", "uint40", "int64", "?int24"];

fn setup_pv(ty: VectorType) -> PackedVec {
    let codec = ty.codec().expect("integer type");
    let mut rng = thread_rng();
    let values = (0..PV_ELEMS).map(|_| rng.gen_range(codec.min()..=codec.max()));
    PackedVec::from_values(ty, values).unwrap()
}

fn bench_pv_ops(c: &mut Criterion) {
    let mut rng = thread_rng();

    let mut group = c.benchmark_group("pv_ops");
    group.sample_size(100);

    for name in PV_TYPES {
        let ty: VectorType = name.parse().unwrap();
        let codec = ty.codec().unwrap();
        let mut pv = setup_pv(ty);

        group.bench_function(BenchmarkId::new("get", name), |b| {
            b.iter_batched(
                || rng.gen_range(0..PV_ELEMS),
                |i| {
                    pv.get(black_box(i)).unwrap();
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("set", name), |b| {
            b.iter_batched(
                || (rng.gen_range(0..PV_ELEMS), rng.gen_range(codec.min()..=codec.max())),
                |(i, v)| {
                    pv.set(black_box(i), v).unwrap();
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("iter", name), |b| {
            b.iter(|| pv.iter().filter(|(_, v)| *v == Value::Int(0)).count())
        });
    }
}

fn bench_pv_splice(c: &mut Criterion) {
    let ty: VectorType = "int24".parse().unwrap();
    let pv = setup_pv(ty);
    let batch = vec![7i64; 64];

    let mut group = c.benchmark_group("pv_splice");
    group.sample_size(50);

    group.bench_function("insert_front", |b| {
        b.iter_batched_ref(
            || pv.clone(),
            |pv| pv.insert(batch.iter().copied(), black_box(0)).unwrap(),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("delete_middle", |b| {
        b.iter_batched_ref(
            || pv.clone(),
            |pv| pv.delete(black_box(PV_ELEMS as isize / 2), 64),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("serialize", |b| b.iter(|| pv.serialize().unwrap()));
}

criterion_group!(pv_benches, bench_pv_ops, bench_pv_splice);
criterion_main!(pv_benches);
