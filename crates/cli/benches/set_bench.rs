use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use bob::{Bob, Config};
use tempfile::tempdir;

const N_UPDATES: usize = 100;
const PAYLOAD_SIZE: usize = 1024;

fn bench_config() -> Config {
    let mut cfg = Config::new();
    cfg.set_blocksize(4096);
    cfg.set_cuesize(128 * 1024);
    cfg
}

fn set_benchmark(c: &mut Criterion) {
    c.bench_function("set_100_updates_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.bob");
                let bob = Bob::create(&bench_config(), &path).unwrap();
                (dir, bob)
            },
            |(_dir, mut bob)| {
                let payload = vec![b'x'; PAYLOAD_SIZE];
                for _ in 0..N_UPDATES {
                    bob.set(&payload).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn open_benchmark(c: &mut Criterion) {
    c.bench_function("open_after_100_updates", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.bob");
                let mut bob = Bob::create(&bench_config(), &path).unwrap();
                let payload = vec![b'x'; PAYLOAD_SIZE];
                for _ in 0..N_UPDATES {
                    bob.set(&payload).unwrap();
                }
                bob.close().unwrap();
                (dir, path)
            },
            |(_dir, path)| {
                let bob = Bob::open(&path).unwrap();
                assert_eq!(bob.current().len(), PAYLOAD_SIZE);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, set_benchmark, open_benchmark);
criterion_main!(benches);
