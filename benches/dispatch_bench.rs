use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion};

use webshots::{catalog, Dispatcher, Job, PageDescriptor, Renderer};

/// Writes a tiny file instead of launching a browser, so the benchmark
/// measures queueing, thread start-up and the output checks only.
struct TouchRenderer;

impl Renderer for TouchRenderer {
    fn render(&self, _job: &Job, output: &Path) -> webshots::Result<()> {
        std::fs::write(output, b"png")?;
        Ok(())
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let pages: Vec<PageDescriptor> = (0..4)
        .map(|i| PageDescriptor::new(format!("{}page", i), format!("https://example.com/{}", i)))
        .collect();
    let jobs = catalog::jobs(&pages, &catalog::builtin_screens());
    let dispatcher = Dispatcher::new(TouchRenderer, dir.path(), 6).expect("dispatcher");

    c.bench_function("dispatch_104_jobs_6_workers", |b| {
        b.iter(|| {
            let report = dispatcher.dispatch(jobs.clone());
            assert!(report.is_success());
        })
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
