//! Tuple layout engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rill_catalog::systables::initoids::{TYP_INT2, TYP_INT4, TYP_INT8, TYP_VARCHAR};
use rill_catalog::{BootstrapCatCache, Schema};
use rill_common::types::Datum;

fn mixed_schema(cat: &BootstrapCatCache) -> Schema {
    let mut schema = Schema::create(
        &[TYP_INT4, TYP_VARCHAR, TYP_INT2, TYP_VARCHAR, TYP_INT8],
        &[0, 32, 0, 64, 0],
        &[false, true, true, true, false],
    )
    .unwrap();
    schema.compute_layout(cat).unwrap();
    schema
}

fn layout_benchmark(c: &mut Criterion) {
    let cat = BootstrapCatCache::new().unwrap();

    c.bench_function("compute_layout_5_fields", |b| {
        b.iter(|| {
            let mut schema = Schema::create(
                &[TYP_INT4, TYP_VARCHAR, TYP_INT2, TYP_VARCHAR, TYP_INT8],
                &[0, 32, 0, 64, 0],
                &[false, true, true, true, false],
            )
            .unwrap();
            schema.compute_layout(&cat).unwrap();
            black_box(schema)
        })
    });
}

fn write_benchmark(c: &mut Criterion) {
    let cat = BootstrapCatCache::new().unwrap();
    let schema = mixed_schema(&cat);
    let data = [
        Datum::from_i32(42),
        Datum::from_varlen_owned(b"a moderately long tag".to_vec()),
        Datum::from_i16(-7),
        Datum::from_varlen_owned(b"and a second payload".to_vec()),
        Datum::from_i64(1 << 40),
    ];

    c.bench_function("write_payload_5_fields", |b| {
        let mut buf = Vec::with_capacity(256);
        b.iter(|| {
            buf.clear();
            schema.write_payload_datums(black_box(&data), &mut buf).unwrap();
            black_box(buf.len())
        })
    });
}

fn dissemble_benchmark(c: &mut Criterion) {
    let cat = BootstrapCatCache::new().unwrap();
    let schema = mixed_schema(&cat);
    let data = [
        Datum::from_i32(42),
        Datum::from_varlen_owned(b"a moderately long tag".to_vec()),
        Datum::null(),
        Datum::from_varlen_owned(b"and a second payload".to_vec()),
        Datum::from_i64(1 << 40),
    ];
    let mut buf = Vec::new();
    schema.write_payload_datums(&data, &mut buf).unwrap();

    c.bench_function("dissemble_payload_5_fields", |b| {
        b.iter(|| black_box(schema.dissemble_payload(black_box(&buf))))
    });
}

criterion_group!(benches, layout_benchmark, write_benchmark, dissemble_benchmark);
criterion_main!(benches);
