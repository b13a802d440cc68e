//! Inbound message path benchmarks.
//!
//! Measures frame parsing and listener fan-out at different listener counts.
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use ws_fallback::transport::ListenerRegistry;
use ws_fallback::{AUTH_RESPONSE, AuthResponse, AuthUser, Message};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 8, 64];

fn auth_response_frame() -> String {
    let user = AuthUser {
        id: 1,
        username: "admin".to_string(),
        role: "admin".to_string(),
    };
    AuthResponse::accepted("token-0123456789abcdef", user)
        .into_message()
        .and_then(|message| message.to_text())
        .expect("serializable")
}

// ============================================================================
// Benchmark: Frame Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let auth = auth_response_frame();
    group.bench_function("auth_response", |b| {
        b.iter(|| Message::from_text(black_box(&auth)))
    });

    let opaque = Message::new("user_list", json!({ "users": (0..32).collect::<Vec<_>>() }))
        .to_text()
        .expect("serializable");
    group.bench_function("opaque_payload", |b| {
        b.iter(|| Message::from_text(black_box(&opaque)))
    });

    group.bench_function("malformed", |b| {
        b.iter(|| Message::from_text(black_box("{\"payload\": 1}")))
    });

    group.finish();
}

// ============================================================================
// Benchmark: Listener Fan-out
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let message = Message::new(AUTH_RESPONSE, json!({ "success": false }));

    for &count in LISTENER_COUNTS {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            let hits = Arc::clone(&hits);
            registry.add(Box::new(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            }));
        }

        group.bench_with_input(BenchmarkId::new("listeners", count), &count, |b, _| {
            b.iter(|| registry.dispatch(registry.generation(), black_box(&message)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_dispatch);
criterion_main!(benches);
