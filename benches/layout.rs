//! Benchmark: parse a wide generated UDT, then compute plain/packed sizes and
//! flatten it. The type mixes boolean runs, scalars, arrays and nested structs
//! so the packed layout has many flushes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use udtdef::{parse, serialize};

fn generated_source(groups: usize) -> String {
    let mut src = String::from("TYPE \"Wide\"\nVERSION : 1.0\n   STRUCT\n");
    for g in 0..groups {
        for b in 0..5 {
            src.push_str(&format!("      Flag_{}_{} : Bool;\n", g, b));
        }
        src.push_str(&format!("      Count_{} : DInt := 0;   // counter\n", g));
        src.push_str(&format!("      Samples_{} : Array[0..15] of Real;\n", g));
        src.push_str(&format!("      Group_{} : Struct\n", g));
        src.push_str("         On : Bool;\n         Label : String[32];\n         Pos : LReal;\n");
        src.push_str("      END_STRUCT;\n");
    }
    src.push_str("   END_STRUCT;\n\nEND_TYPE\n");
    src
}

fn bench_layout(c: &mut Criterion) {
    let src = generated_source(200);
    let udt = parse(&src, ".").expect("parse generated source");

    c.bench_function("parse", |b| b.iter(|| parse(black_box(&src), ".").expect("parse")));
    c.bench_function("plain_size", |b| b.iter(|| black_box(&udt).plain_size()));
    c.bench_function("packed_size", |b| b.iter(|| black_box(&udt).packed_size()));
    c.bench_function("flatten", |b| b.iter(|| black_box(&udt).flatten().len()));
    c.bench_function("serialize", |b| b.iter(|| serialize(black_box(&udt)).len()));
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
