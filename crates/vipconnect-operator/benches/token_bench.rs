// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for session token minting and verification in the
// vipconnect-operator crate.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vipconnect_core::config::OperatorConfig;
use vipconnect_operator::TokenGenerator;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_config() -> OperatorConfig {
    OperatorConfig {
        secret: STANDARD.encode(b"vip-connect-bench-secret"),
        issuer: "bench-operator".into(),
        audience: "vip-api-cert".into(),
        base_uri: "https://cert.example.io/sdk".into(),
        redirect_uri: "closevip://done".into(),
    }
}

/// Benchmark minting one HS256 session token.
///
/// This exercises claim serialization, two base64 encodes, and the HMAC
/// signature -- the per-request cost every session bootstrap pays.
fn bench_token_mint(c: &mut Criterion) {
    let generator = TokenGenerator::new(&bench_config()).expect("generator");

    c.bench_function("token_mint (HS256)", |b| {
        b.iter(|| {
            let token = generator
                .generate_at(black_box(1_700_000_000))
                .expect("mint failed");
            black_box(token);
        });
    });
}

/// Benchmark a mint-then-verify round trip, the path the mock backend takes
/// for every authenticated request.
fn bench_token_verify(c: &mut Criterion) {
    let generator = TokenGenerator::new(&bench_config()).expect("generator");
    let token = generator.generate_at(1_700_000_000).expect("mint failed");

    c.bench_function("token_verify (HS256)", |b| {
        b.iter(|| {
            let claims = generator
                .verify_at(black_box(&token), 1_700_000_000)
                .expect("verify failed");
            black_box(claims);
        });
    });
}

criterion_group!(benches, bench_token_mint, bench_token_verify);
criterion_main!(benches);
