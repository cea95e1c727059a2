use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use regjit::{Backend, Engine, Matcher, Pattern, Program, Result, convert, parse};

fn bench_parse(c: &mut Criterion) {
    let pattern = br"a[bB][0-9]\d\w?.\s";

    c.bench_function("parse_mixed", |b| b.iter(|| black_box(parse(black_box(pattern)))));
}

fn bench_convert(c: &mut Criterion) {
    let tree = parse(br"[a-zA-Z_][a-zA-Z0-9_]*(\.[a-z]+){1,3}").unwrap();

    c.bench_function("convert_identifier", |b| {
        b.iter(|| black_box(convert(black_box(&tree))))
    });
}

fn bench_nested_classes(c: &mut Criterion) {
    let tree = parse(br"[^\d\s.\-\x00-\x1f]+|[\w\W]").unwrap();

    c.bench_function("convert_negated_class", |b| {
        b.iter(|| black_box(convert(black_box(&tree))))
    });
}

fn bench_generate_program(c: &mut Criterion) {
    let tree = parse(b"(a+)+b").unwrap();

    c.bench_function("generate_program", |b| {
        b.iter(|| black_box(Program::generate(black_box(&tree))))
    });
}

/// Backend that skips the compiler, so the cache path is measured alone
struct NoopBackend;

struct AcceptAll;

impl Matcher for AcceptAll {
    fn is_match(&self, _input: &[u8]) -> bool {
        true
    }
}

impl Backend for NoopBackend {
    type Matcher = AcceptAll;

    fn build(&self, _program: &Program) -> Result<AcceptAll> {
        Ok(AcceptAll)
    }
}

fn bench_cache_hit(c: &mut Criterion) {
    let engine = Engine::with_backend(NoopBackend);
    let pattern = Pattern::new("a?b");
    let _ = engine.matches(&pattern, b"ab");

    c.bench_function("cache_hit", |b| {
        b.iter(|| black_box(engine.matches(black_box(&pattern), black_box(b"ab"))))
    });
}

fn bench_cache_miss(c: &mut Criterion) {
    let engine = Engine::with_backend(NoopBackend);

    c.bench_function("cache_miss", |b| {
        b.iter_batched(
            || Pattern::new("a?b"),
            |pattern| black_box(engine.matches(&pattern, b"ab")),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_convert,
    bench_nested_classes,
    bench_generate_program,
    bench_cache_hit,
    bench_cache_miss
);
criterion_main!(benches);
