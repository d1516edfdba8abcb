// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Criterion benchmarks for PII redaction

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pii_redaction::{RedactionConfig, RedactionEngine};
use serde_json::{Value, json};
use std::hint::black_box;
use std::time::Duration;

fn engine() -> RedactionEngine {
    RedactionEngine::from_config(&RedactionConfig::default()).expect("default config is valid")
}

fn clean_messages() -> Vec<&'static str> {
    vec![
        "I can help you design a scalable microservices architecture. Let's start with service discovery and load balancing.",
        "For monitoring distributed systems, implement observability with metrics, logs and traces before tuning anything else.",
        "The deployment pipeline should include automated testing, security scanning and gradual rollout strategies.",
        "Database design is crucial for performance. Consider connection pooling, read replicas and caching at scale.",
    ]
}

fn pii_messages() -> Vec<&'static str> {
    vec![
        "My email is john.doe@example.com, my SSN is 123-45-6789, and my card is 4111 1111 1111 1111.",
        "Call me at (212) 555-0142 or send the contract to 350 Fifth Avenue, New York, NY 10118.",
        "Wire it to bank account 000123456789 and use passport 912803456 for the booking on 2024-03-18.",
        "The server at 192.168.10.24 logged a login from jane_smith@corp.example.org at 09:14.",
        "Tips go to 1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa, DEA registration AB1234563 is on file.",
    ]
}

fn nested_payload(width: usize) -> Value {
    let records: Vec<Value> = (0..width)
        .map(|i| {
            json!({
                "id": i,
                "active": i % 2 == 0,
                "contact": {
                    "email": format!("user{i}@example.com"),
                    "phone": "212-555-0199",
                    "notes": ["prefers morning calls", "card on file 5500 0000 0000 0004"],
                },
                "summary": "Quarterly review completed without issues.",
            })
        })
        .collect();
    json!({ "records": records, "page": 1 })
}

fn bench_redact_text(c: &mut Criterion) {
    let engine = engine();

    let mut group = c.benchmark_group("redact_text");
    group.measurement_time(Duration::from_millis(500));
    group.warm_up_time(Duration::from_millis(100));
    group.sample_size(50);

    for (i, message) in clean_messages().iter().enumerate() {
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::new("clean_message", i), message, |b, msg| {
            b.iter(|| engine.redact_text(black_box(msg)));
        });
    }

    for (i, message) in pii_messages().iter().enumerate() {
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::new("pii_message", i), message, |b, msg| {
            b.iter(|| engine.redact_text(black_box(msg)));
        });
    }

    group.finish();
}

fn bench_redact_value(c: &mut Criterion) {
    let engine = engine();

    let mut group = c.benchmark_group("redact_value");
    group.measurement_time(Duration::from_millis(500));
    group.warm_up_time(Duration::from_millis(100));
    group.sample_size(30);

    for width in [1, 10, 100] {
        let payload = nested_payload(width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("records", width), &payload, |b, payload| {
            b.iter_batched(
                || payload.clone(),
                |mut value| {
                    let _ = engine.redact_value(black_box(&mut value));
                    value
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_redact_text, bench_redact_value);
criterion_main!(benches);
