use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scoped_kv::resolver::{candidates, expand_all};
use scoped_kv::{BackendKind, MemoryStore, Scope, ScopedStoreClient, StaticScopeLoader, StoreClient};

fn scope() -> Scope {
    Scope::new("myapp", "node1").unwrap()
}

fn bench_candidates(c: &mut Criterion) {
    let scope = scope();

    c.bench_function("candidates_qualified", |b| {
        b.iter(|| candidates(black_box("/myapp/config/db/host"), &scope));
    });

    c.bench_function("candidates_ambiguous", |b| {
        b.iter(|| candidates(black_box("/myapp/db/host"), &scope));
    });
}

fn bench_expand_all(c: &mut Criterion) {
    let scope = scope();
    let keys: Vec<String> = (0..100).map(|i| format!("/myapp/svc{:03}/addr", i)).collect();

    c.bench_function("expand_all_100", |b| {
        b.iter(|| {
            let scoped = expand_all(black_box(&keys), &scope);
            assert_eq!(scoped.len(), 400);
        });
    });
}

fn populated_client(kind: BackendKind) -> ScopedStoreClient {
    let store = MemoryStore::new();
    for i in 0..100 {
        store
            .set(format!("/myapp/config/svc{:03}/addr", i), "10.0.0.1")
            .unwrap();
        store
            .set(format!("/myapp/node1/config/svc{:03}/addr", i), "127.0.0.1")
            .unwrap();
    }
    ScopedStoreClient::with_parts(
        Box::new(store),
        kind,
        Box::new(StaticScopeLoader::new(scope())),
    )
}

fn bench_get_values(c: &mut Criterion) {
    let keys: Vec<String> = (0..100).map(|i| format!("/svc{:03}/addr", i)).collect();

    let batched = populated_client(BackendKind::EtcdV3);
    c.bench_function("get_values_etcdv3_100", |b| {
        b.iter(|| {
            let result = batched.get_values(black_box(&keys)).unwrap();
            assert_eq!(result.len(), 200);
        });
    });

    let per_candidate = populated_client(BackendKind::Etcd);
    c.bench_function("get_values_etcd_100", |b| {
        b.iter(|| {
            let result = per_candidate.get_values(black_box(&keys)).unwrap();
            assert_eq!(result.len(), 400);
        });
    });
}

criterion_group!(benches, bench_candidates, bench_expand_all, bench_get_values);
criterion_main!(benches);
