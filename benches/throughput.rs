use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use qrewrite::{ExpandedQuery, Query, RewriteEngine, RulesCollection};

fn build_shared_collection() -> Arc<RulesCollection> {
    let mut text = String::new();
    for i in 0..200 {
        text.push_str(&format!("w{i} =>\n  SYNONYM: s{i}\n  UP(2): b{i}\n"));
    }
    for i in 0..50 {
        text.push_str(&format!("w{i} AND w{} =>\n  DOWN: d{i}\n", i + 5));
    }
    Arc::new(RulesCollection::from_rules_text(&text).unwrap())
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];
    let terms: Arc<Vec<String>> = Arc::new((0..10).map(|i| format!("w{i}")).collect());

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let collection = build_shared_collection();

        group.bench_function(&format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let rc = Arc::clone(&collection);
                        let t = Arc::clone(&terms);
                        thread::spawn(move || {
                            let engine = RewriteEngine::new(&rc);
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let mut request =
                                    ExpandedQuery::new(Query::from_terms(t.iter().cloned()));
                                let _ = engine.rewrite(&mut request);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
