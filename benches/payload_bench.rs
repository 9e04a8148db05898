// ABOUTME: Criterion benchmarks for guest reply validation and token helpers
// ABOUTME: Measures payload parsing, normalization and rejection paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the reply payload validator.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rsvp_server::payload::{AllowedFields, RsvpPayload};
use rsvp_server::tokens;

const MINIMAL: &str = r#"{"rsvp":"yes"}"#;
const FULL: &str = r#"{"rsvp":" Yes ","allergies":true,"allergyDescription":"  peanuts and shellfish ","songRequest":"September"}"#;
const UNKNOWN_FIELDS: &str = r#"{"rsvp":"yes","plusOne":"Alex","table":4}"#;
const BAD_RSVP: &str = r#"{"rsvp":"maybe"}"#;

fn bench_payload_validation(c: &mut Criterion) {
    let allowed = AllowedFields::default();
    let mut group = c.benchmark_group("reply_payload");

    for (name, body) in [("minimal", MINIMAL), ("full", FULL)] {
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| RsvpPayload::from_bytes(black_box(body.as_bytes()), &allowed).unwrap());
        });
    }

    for (name, body) in [("unknown_fields", UNKNOWN_FIELDS), ("bad_rsvp", BAD_RSVP)] {
        group.bench_function(name, |b| {
            b.iter(|| RsvpPayload::from_bytes(black_box(body.as_bytes()), &allowed).is_err());
        });
    }

    group.finish();
}

fn bench_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokens");

    group.bench_function("generate", |b| b.iter(tokens::generate_token));
    group.bench_function("well_formed", |b| {
        b.iter(|| tokens::is_well_formed_token(black_box(" AB12cd ")));
    });

    group.finish();
}

criterion_group!(benches, bench_payload_validation, bench_tokens);
criterion_main!(benches);
