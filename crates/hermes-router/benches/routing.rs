//! Routing benchmarks.
//!
//! Run with: `cargo bench -p hermes-router`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hermes_router::{RouteId, RoutePath, Router};
use http::Method;

fn build_router(num_routes: usize) -> Router {
    let mut router = Router::new();
    let mut next = 0usize;
    let mut add = |router: &mut Router, path: RoutePath| {
        router
            .insert(&path, Some(&Method::GET), RouteId(next))
            .expect("valid route");
        next += 1;
    };

    for i in 0..num_routes / 3 {
        add(&mut router, RoutePath::literal(format!("/api/v1/resource{i}")));
        add(&mut router, RoutePath::literal(format!("/api/v1/resource{i}/:id")));
    }
    for i in 0..num_routes / 3 {
        let pattern = RoutePath::pattern(format!(r"^\/api\/v2\/resource{i}\/(\d+)$"), "")
            .expect("valid pattern");
        add(&mut router, pattern);
    }

    router
}

fn bench_literal_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("literal_param_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_pattern_match(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("pattern_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v2/resource30/12345")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(99);
    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/api/v3/nothing")));
    });
}

criterion_group!(benches, bench_literal_match, bench_pattern_match, bench_miss);
criterion_main!(benches);
