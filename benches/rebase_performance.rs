//! Performance benchmarks for the rebase engine.
//!
//! This module benchmarks:
//! - Rebasing a stale edit across a growing operation log
//! - Rebasing against queues of growing length
//! - Fingerprinting
//! - Full edits through a session, latest and stale
//!
//! Run with: cargo bench

use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use songq::queue::DEFAULT_LOG_CAPACITY;
use songq::session::Session;
use songq::{Edit, Fingerprint, Item, Target, rebase};

fn song(i: usize) -> Item {
    Item::new(format!("s{i}"), format!("Song {i}"), "")
}

/// A session holding `len` items and `ops` logged moves, all against the
/// initial queue. Returns the session and the initial fingerprint.
fn session_with_history(len: usize, ops: usize) -> (Session, Fingerprint) {
    let mut session = Session::new(DEFAULT_LOG_CAPACITY.max(ops));
    session.load((0..len).map(song).collect());
    let base = session.fingerprint();
    let start = Utc::now();

    for i in 0..ops {
        let edit = Edit::new(song(i % len), Target::Index((i * 7) % len));
        let now = start + Duration::milliseconds(i as i64);
        session
            .apply(&base, edit, now)
            .expect("history edits stay in range");
    }
    (session, base)
}

/// Benchmark a stale edit rebased across logs of increasing length
fn bench_rebase_log_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebase_log_length");
    let len = 100;

    for ops in [0, 10, 25, 50].iter() {
        let (session, _) = session_with_history(len, *ops);
        let prior = session.log().entries_from(0);
        let base: Vec<String> = (0..len).map(|i| format!("s{i}")).collect();
        let edit = Edit::new(song(len / 2), Target::Index(0));

        group.throughput(Throughput::Elements(*ops as u64));
        group.bench_with_input(BenchmarkId::new("stale_move", ops), ops, |b, _| {
            b.iter(|| black_box(rebase(session.items(), &base, &prior, &edit).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark rebasing against queues of increasing size
fn bench_rebase_queue_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebase_queue_length");

    for len in [10, 100, 1000, 5000].iter() {
        let (session, _) = session_with_history(*len, 20);
        let prior = session.log().entries_from(0);
        let base: Vec<String> = (0..*len).map(|i| format!("s{i}")).collect();
        let edit = Edit::new(song(len + 1), Target::Index(len / 2));

        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::new("stale_insert", len), len, |b, _| {
            b.iter(|| black_box(rebase(session.items(), &base, &prior, &edit).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark fingerprinting
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for len in [10, 100, 1000].iter() {
        let items: Vec<Item> = (0..*len).map(song).collect();
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::new("items", len), len, |b, _| {
            b.iter(|| black_box(Fingerprint::of(&items)));
        });
    }
    group.finish();
}

/// Benchmark full edits through a session
fn bench_session_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_apply");

    group.bench_function("latest_move", |b| {
        b.iter_batched(
            || session_with_history(200, 0),
            |(mut session, base)| {
                let edit = Edit::new(song(150), Target::Index(3));
                black_box(session.apply(&base, edit, Utc::now()).unwrap())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("stale_move_full_log", |b| {
        b.iter_batched(
            || session_with_history(200, DEFAULT_LOG_CAPACITY),
            |(mut session, base)| {
                let edit = Edit::new(song(150), Target::Index(3));
                black_box(session.apply(&base, edit, Utc::now()).unwrap())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_rebase_log_length,
    bench_rebase_queue_length,
    bench_fingerprint,
    bench_session_apply
);
criterion_main!(benches);
