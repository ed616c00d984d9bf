use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use envblock::Config;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for size in [1_024usize, 10_240, 102_400] {
        let input = make_input(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| envblock::parse_str(black_box(input)).expect("parse should succeed"));
        });
    }
    group.finish();
}

fn bench_marshal(c: &mut Criterion) {
    let input = make_input(102_400);
    let document = envblock::parse_str(&input).expect("parse should succeed");
    let config = Config::default();

    c.bench_function("marshal", |b| {
        b.iter(|| black_box(&document).marshal(&config));
    });
}

fn make_input(bytes: usize) -> String {
    let lines = [
        "# Section comment\n",
        "APP_KEY=value\n",
        "DB_PORT=5432\n",
        "CACHE_URL=\"https://example.com\"\n",
    ];
    let chunk_len: usize = lines.iter().map(|line| line.len()).sum();
    let mut input = String::with_capacity(bytes + chunk_len);
    let mut idx = 0usize;
    while input.len() < bytes {
        for line in lines {
            input.push_str(&line.replacen('=', &format!("_{idx}="), 1));
        }
        idx += 1;
    }
    input
}

criterion_group!(benches, bench_parse, bench_marshal);
criterion_main!(benches);
