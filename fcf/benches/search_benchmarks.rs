use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fcf::search::{matcher, WalkBackend};
use fcf::{CancellationSignal, EntryTypeFilter, SearchRequest};
use std::fs;
use tempfile::tempdir;

fn create_tree(dir: &tempfile::TempDir, dirs: usize, files_per_dir: usize) -> std::io::Result<()> {
    for d in 0..dirs {
        let sub = dir.path().join(format!("module_{}", d)).join("src");
        fs::create_dir_all(&sub)?;
        for f in 0..files_per_dir {
            let ext = if f % 3 == 0 { "rs" } else { "txt" };
            fs::write(sub.join(format!("file_{}.{}", f, ext)), "")?;
        }
    }
    Ok(())
}

fn bench_walk_search(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_tree(&dir, 50, 40).unwrap();

    let mut group = c.benchmark_group("Walk Search");
    group.sample_size(10);

    let backend = WalkBackend::new();
    let wildcard = SearchRequest::new("*.rs", dir.path());
    let insensitive = SearchRequest::new("FILE_1*", dir.path()).case_insensitive(true);
    let dirs_only = SearchRequest::new("src", dir.path()).entry_type(EntryTypeFilter::DirOnly);

    group.bench_function("wildcard_extension", |b| {
        b.iter(|| {
            backend
                .run(black_box(&wildcard), |_| {}, &CancellationSignal::new())
                .unwrap();
        });
    });

    group.bench_function("case_insensitive_prefix", |b| {
        b.iter(|| {
            backend
                .run(black_box(&insensitive), |_| {}, &CancellationSignal::new())
                .unwrap();
        });
    });

    group.bench_function("directories_only", |b| {
        b.iter(|| {
            backend
                .run(black_box(&dirs_only), |_| {}, &CancellationSignal::new())
                .unwrap();
        });
    });

    group.finish();
}

fn bench_pattern_matching(c: &mut Criterion) {
    let names: Vec<String> = (0..1000).map(|i| format!("Report_{}.LOG", i)).collect();

    let mut group = c.benchmark_group("Pattern Matching");

    group.bench_function("case_sensitive", |b| {
        b.iter(|| {
            names
                .iter()
                .filter(|n| matcher::matches(black_box(n), "*.log", false))
                .count()
        });
    });

    group.bench_function("case_insensitive", |b| {
        b.iter(|| {
            names
                .iter()
                .filter(|n| matcher::matches(black_box(n), "*.log", true))
                .count()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_walk_search, bench_pattern_matching);
criterion_main!(benches);
