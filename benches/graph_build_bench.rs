//! Benchmarks for the Global Reference Graph build pass (C5) across file
//! counts, and the dead-code reachability pass that runs over it.
//!
//! Run with:
//! ```bash
//! cargo bench --bench graph_build_bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use staticlens::collect::collect_file;
use staticlens::graph::GlobalReferenceGraph;
use staticlens::model::FileId;
use staticlens::parsing::swift::parse;
use std::hint::black_box;
use std::sync::Arc;

/// `num_types` classes, each conforming to a shared protocol and calling the
/// previous class's method, so both conformance edges and call edges scale.
fn generate_source(num_types: usize) -> String {
    let mut code = String::new();
    code.push_str("protocol Greetable {\n    func greet() -> String\n}\n\n");
    for i in 0..num_types {
        code.push_str(&format!(
            "class Type{i}: Greetable {{\n    func greet() -> String {{ \"hi from {i}\" }}\n    func chain() -> String {{ Type{prev}().greet() }}\n}}\n\n",
            i = i,
            prev = i.saturating_sub(1),
        ));
    }
    code
}

fn facts_for(source: &str, path: &str, id: u32) -> staticlens::collect::FileFacts {
    let tree = parse(Arc::from(source)).expect("fixture source must parse");
    collect_file(&tree, Arc::from("Bench"), path, FileId(id))
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for size in [10, 50, 200].iter() {
        let source = generate_source(*size);
        let bytes = source.len();
        let facts = facts_for(&source, "Bench.swift", 1);

        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}_types")), &facts, |b, facts| {
            b.iter(|| {
                let _ = black_box(GlobalReferenceGraph::build(vec![facts.clone()]));
            });
        });
    }

    group.finish();
}

fn bench_graph_build_many_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build_many_files");

    for file_count in [5, 20, 50].iter() {
        let all_facts: Vec<_> = (0..*file_count)
            .map(|i| {
                let source = generate_source(10);
                facts_for(&source, &format!("File{i}.swift"), i as u32 + 1)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(format!("{file_count}_files")), &all_facts, |b, all_facts| {
            b.iter(|| {
                let _ = black_box(GlobalReferenceGraph::build(all_facts.clone()));
            });
        });
    }

    group.finish();
}

criterion_group!(graph_build, bench_graph_build, bench_graph_build_many_files);
criterion_main!(graph_build);
