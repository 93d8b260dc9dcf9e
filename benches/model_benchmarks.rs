// SPDX-License-Identifier: PMPL-1.0-or-later
//! Performance benchmarks for the AwareDB value model and command pipeline

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use tokio::runtime::Runtime;

use awaredb_client::{
    AwareDbClient, Command, CommandBuilder, Credentials, Query, Reply, Transport, TransportError,
};
use awaredb_model::{FormulaExpression, NodeDocument, PathAddress};

/// A node with a state, a conditional tree, a nested tree and a formula.
fn fan(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Fan",
        "engine": {
            "mode": {"states": ["off", "low", "mid", "high"]},
            "power": {
                "linked-to": "${this.engine.mode}",
                "cases": {
                    "low": "20 W",
                    "mid": "40 W",
                    "high": {
                        "linked-to": "${this.lights.status}",
                        "cases": {"on": "65 W", "default": "60 W"}
                    },
                    "default": "0 W"
                }
            }
        },
        "lights": {"status": {"states": ["on", "off"]}},
        "consumption": "=${this.engine.power} * ${this.hours} / 1000"
    })
}

fn fans(count: usize) -> Vec<Value> {
    (0..count)
        .map(|_| fan(&uuid::Uuid::new_v4().to_string()))
        .collect()
}

// ============================================================================
// Model Benchmarks
// ============================================================================

fn bench_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("path");
    let text = "this.engine.power\\.max.mode";

    group.bench_function("parse", |b| {
        b.iter(|| black_box(PathAddress::parse(black_box(text)).unwrap()))
    });

    let path = PathAddress::parse(text).unwrap();
    group.bench_function("render", |b| b.iter(|| black_box(path.render())));

    group.finish();
}

fn bench_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("formula");

    for references in [1usize, 8, 64] {
        let text = (0..references)
            .map(|i| format!("${{node{i}.power}} * {i}"))
            .collect::<Vec<_>>()
            .join(" + ");
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse", references), &text, |b, text| {
            b.iter(|| black_box(FormulaExpression::parse(black_box(text)).unwrap()))
        });

        let formula = FormulaExpression::parse(&text).unwrap();
        group.bench_with_input(BenchmarkId::new("render", references), &formula, |b, formula| {
            b.iter(|| black_box(formula.render()))
        });
    }

    group.finish();
}

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");

    for count in [1usize, 100] {
        let raw = fans(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("decode", count), &raw, |b, raw| {
            b.iter(|| {
                let decoded: Vec<NodeDocument> = raw
                    .iter()
                    .map(|value| NodeDocument::from_json(value).unwrap())
                    .collect();
                black_box(decoded)
            })
        });

        let documents: Vec<NodeDocument> = raw
            .iter()
            .map(|value| NodeDocument::from_json(value).unwrap())
            .collect();
        group.bench_with_input(BenchmarkId::new("encode", count), &documents, |b, documents| {
            b.iter(|| black_box(documents.iter().map(NodeDocument::to_json).collect::<Vec<_>>()))
        });
    }

    group.finish();
}

// ============================================================================
// Command Pipeline Benchmarks
// ============================================================================

/// Answers every command with a fixed reply.
struct CannedTransport {
    reply: Value,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn execute(
        &self,
        _command: Command,
        _payload: Value,
        _credentials: &Credentials,
    ) -> Result<Reply, TransportError> {
        Ok(Reply::Success(self.reply.clone()))
    }
}

fn bench_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("command");
    let query = Query::nodes(["employee"])
        .condition("${node.salary.gross} > 60000 && ${node.age} < 40")
        .property("name")
        .state("company.mode.audit");

    group.bench_function("build_query", |b| {
        b.iter(|| black_box(CommandBuilder::query(black_box(&query)).unwrap()))
    });

    group.finish();
}

fn bench_client_query(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("client");

    let mut annotated = fans(100);
    for node in &mut annotated {
        node["value"] = json!("Fan");
        node["engine"]["power"]["value"] = json!("40 W");
    }
    let transport = Arc::new(CannedTransport {
        reply: json!({"data": annotated}),
    });
    let client = AwareDbClient::new(transport, Credentials::token("bench"));
    let query = Query::new();

    group.throughput(Throughput::Elements(100));
    group.bench_function("query_100_nodes", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(client.query(&query).await.unwrap()) });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_path,
    bench_formula,
    bench_document,
    bench_build_query,
    bench_client_query
);
criterion_main!(benches);
