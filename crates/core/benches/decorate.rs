use contextguard_core::{decorate, ContextDecorator, ContextDecoratorExt, ExcInfo};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::cell::Cell;
use std::convert::Infallible;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("odd input")]
struct Odd;

struct Bare;

impl ContextDecorator for Bare {
    type Bound = ();
    type Error = Infallible;
}

#[derive(Default)]
struct Counting {
    entries: Cell<u64>,
    failures: Cell<u64>,
}

impl ContextDecorator for Counting {
    type Bound = u64;
    type Error = Infallible;

    fn before(&self) -> Result<Option<u64>, Infallible> {
        self.entries.set(self.entries.get() + 1);
        Ok(Some(self.entries.get()))
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Infallible> {
        if exc.is_some() {
            self.failures.set(self.failures.get() + 1);
        }
        Ok(true)
    }
}

fn work(x: u64) -> Result<u64, Odd> {
    if x % 2 == 0 {
        Ok(x.wrapping_mul(31))
    } else {
        Err(Odd)
    }
}

// ---------------------------------------------------------------------------
// Benchmark: direct call vs decorated call
// ---------------------------------------------------------------------------

fn bench_decorated_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("decorated_call");

    group.bench_function("direct", |b| b.iter(|| work(black_box(42))));

    let mut bare = decorate(Bare, work);
    group.bench_function("bare_guard", |b| b.iter(|| bare.call((black_box(42),))));

    let counting = Counting::default();
    let mut hooked = decorate(&counting, work);
    group.bench_function("hooked_ok", |b| b.iter(|| hooked.call((black_box(42),))));
    group.bench_function("hooked_suppressed", |b| {
        b.iter(|| hooked.call((black_box(43),)))
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: scoped block
// ---------------------------------------------------------------------------

fn bench_scope(c: &mut Criterion) {
    let counting = Counting::default();
    c.bench_function("scope", |b| {
        b.iter(|| counting.scope(|bound| work(black_box(bound.unwrap_or(0) * 2))))
    });
}

criterion_group!(benches, bench_decorated_call, bench_scope);
criterion_main!(benches);
