use criterion::{criterion_group, criterion_main, Criterion};
use hoststat::collector::cpu::{decode_cp_time, emit};
use std::hint::black_box;

fn bench_decode_and_convert(c: &mut Criterion) {
    let mut buf = Vec::with_capacity(40);
    for word in [48_201_933u64, 12_004, 9_330_712, 48_220, 981_337_441] {
        buf.extend_from_slice(&word.to_ne_bytes());
    }

    c.bench_function("decode_cp_time", |b| {
        b.iter(|| decode_cp_time(black_box(&buf)).unwrap())
    });

    c.bench_function("decode_and_emit", |b| {
        b.iter(|| {
            let ticks = decode_cp_time(black_box(&buf)).unwrap();
            let mut sink = 0.0;
            emit(&ticks, black_box(100.0), |_, seconds| sink += seconds);
            sink
        })
    });
}

criterion_group!(benches, bench_decode_and_convert);
criterion_main!(benches);
