use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use qpack::{pack, unpack, Decode, Value};

fn sample_sequence(len: usize) -> Value {
    Value::Sequence(
        (0..len)
            .map(|i| Value::Mapping(vec![
                (Value::from("id"), Value::Int(i as i64)),
                (Value::from("name"), Value::from("sample")),
            ]))
            .collect(),
    )
}

fn criterion_benchmark(c: &mut Criterion) {
    for len in [1usize, 10, 100, 1_000] {
        let value = sample_sequence(len);
        let encoded = pack(&value).unwrap();

        c.bench_function(&format!("pack {}", len), |b| {
            b.iter(|| pack(black_box(&value)).unwrap())
        });
        c.bench_function(&format!("unpack {}", len), |b| {
            b.iter(|| unpack(black_box(&encoded), Decode::Utf8).unwrap())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
