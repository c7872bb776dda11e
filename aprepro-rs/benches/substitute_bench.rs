use criterion::{black_box, criterion_group, criterion_main, Criterion};

use aprepro::{Engine, Options};

fn make_plain(repeats: usize) -> String {
    let chunk = "The quick brown fox jumps over the lazy dog.\n";
    chunk.repeat(repeats)
}

fn make_exprs(repeats: usize) -> String {
    let chunk = "node {i = i + 1} at {cos(i * DEG) * r}, {sin(i * DEG) * r}\n";
    format!("{{r = 2.5}}{{i = 0}}\n{}", chunk.repeat(repeats))
}

fn make_loop(count: usize) -> String {
    format!("{{i = 0}}\n{{Loop({count})}}\nrow {{++i}} {{tostring(i^2)}}\n{{EndLoop}}\n")
}

fn substitute(src: &str) -> usize {
    let mut e = Engine::new(Options::default());
    let _ = e.evaluate_string(src, "bench");
    e.output().len()
}

fn bench_substitute(c: &mut Criterion) {
    let plain = make_plain(1000);
    let exprs_small = make_exprs(100);
    let exprs_large = make_exprs(1000);
    let looped = make_loop(1000);

    let mut g = c.benchmark_group("substitute");

    g.bench_function("plain_text", |b| b.iter(|| substitute(black_box(&plain))));
    g.bench_function("expressions_small", |b| {
        b.iter(|| substitute(black_box(&exprs_small)))
    });
    g.bench_function("expressions_large", |b| {
        b.iter(|| substitute(black_box(&exprs_large)))
    });
    g.bench_function("loop_1000", |b| b.iter(|| substitute(black_box(&looped))));

    g.finish();
}

criterion_group!(benches, bench_substitute);
criterion_main!(benches);
