//! Rule engine throughput benchmarks.
//!
//! Run with: cargo bench -p oasgate-ruleset

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use oasgate_core::{Document, DocumentFormat, RuleEngine};
use oasgate_ruleset::{Ruleset, RulesetEngine};

const RULESET: &str = include_str!("../../../rulesets/custom-ruleset.yaml");

/// Build an OpenAPI 3.0 document with `paths` path items.
fn create_document(paths: usize) -> Document {
    let mut text = String::from(
        "openapi: 3.0.3
info:
  title: Bench API
  description: Generated for benchmarking.
  version: 1.0.0
  contact:
    name: Bench
servers:
  - url: https://bench.example.com
paths:
",
    );
    for i in 0..paths {
        text.push_str(&format!(
            "  /items{i}/{{id}}:
    get:
      operationId: getItem{i}
      tags: [items]
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        '200':
          description: ok
"
        ));
    }
    Document::load(text.as_bytes(), "bench.yaml", DocumentFormat::Yaml)
        .expect("generated document is valid UTF-8")
}

fn bench_run(c: &mut Criterion) {
    let ruleset = Ruleset::from_yaml_str(RULESET).expect("shipped ruleset loads");
    let engine = RulesetEngine::from_ruleset(ruleset).expect("engine builds");

    let mut group = c.benchmark_group("run");
    for paths in [1, 10, 100] {
        let document = create_document(paths);
        group.bench_with_input(BenchmarkId::from_parameter(paths), &document, |b, doc| {
            b.iter(|| engine.run(black_box(doc)))
        });
    }
    group.finish();
}

fn bench_ruleset_load(c: &mut Criterion) {
    c.bench_function("ruleset_load", |b| {
        b.iter(|| Ruleset::from_yaml_str(black_box(RULESET)))
    });
}

criterion_group!(benches, bench_run, bench_ruleset_load);
criterion_main!(benches);
