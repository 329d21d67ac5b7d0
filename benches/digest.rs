//! Benchmarks for digest construction and view materialization.
//!
//! - Live digest of a three-level hierarchy with overridden, marked accessors
//! - Binary digest of a class descriptor, with and without early termination
//! - Parallel prefetch through the digest cache
//! - View materialization and typed property reads

extern crate metadigest;

use criterion::{criterion_group, criterion_main, Criterion};
use metadigest::prelude::*;
use std::hint::black_box;

fn marker(annotation_type: &str, properties: &[(&str, &str)]) -> MetadataDatum {
    MetadataDatum::new(
        annotation_type,
        properties.iter().copied().collect::<PropertySet>(),
        None,
    )
    .unwrap()
}

/// `demo.Contract` → `demo.Entity` → `demo.Service`, every level declaring 32 accessors.
fn hierarchy(registry: &TypeRegistry) -> TypeRc {
    let mut contract = TypeBuilder::interface("demo.Contract");
    let mut entity = TypeBuilder::class("demo.Entity");
    let mut service = TypeBuilder::class("demo.Service");

    for index in 0..32 {
        let name = format!("property{index}");
        contract = contract.method(name.clone(), |m| {
            m.returns("java.lang.String")
                .annotation(marker("demo.Column", &[("value", "contract")]))
        });
        entity = entity
            .field(format!("field{index}"), "int", |f| {
                f.annotation(marker("demo.Id", &[]))
            })
            .method(name.clone(), |m| {
                m.returns("java.lang.String")
                    .annotation(marker("demo.Json", &[]))
            });
        service = service.method(name, |m| m.returns("java.lang.String"));
    }

    let contract = contract.build();
    let entity = entity.implements(&contract).build();
    let service = service.extends(&entity).build();
    for ty in [&contract, &entity, &service] {
        registry.register(ty.clone()).unwrap();
    }
    service
}

fn class_file() -> Vec<u8> {
    let mut builder = ClassFileBuilder::new("demo.Service");
    for index in 0..16 {
        builder = builder.annotation(marker(
            &format!("demo.Marker{index}"),
            &[("value", "x"), ("name", "y")],
        ));
    }
    builder.build().unwrap()
}

fn bench_live_digest(c: &mut Criterion) {
    let registry = TypeRegistry::new();
    let service = hierarchy(&registry);
    let options = DigestOptions::default();

    c.bench_function("digest_live_hierarchy", |b| {
        b.iter(|| {
            let digest = Digest::from_type(black_box(&service), &registry, &options);
            black_box(digest)
        });
    });
}

fn bench_binary_digest(c: &mut Criterion) {
    let data = class_file();
    let options = DigestOptions::default();

    c.bench_function("digest_binary_full", |b| {
        b.iter(|| {
            let reader = BinaryReader::decode(black_box(&data), None, &options).unwrap();
            black_box(reader)
        });
    });

    c.bench_function("digest_binary_early_exit", |b| {
        b.iter(|| {
            let reader =
                BinaryReader::decode(black_box(&data), Some("demo.Marker1"), &options).unwrap();
            black_box(reader)
        });
    });
}

fn bench_prefetch(c: &mut Criterion) {
    let registry = TypeRegistry::new();
    hierarchy(&registry);
    let types = registry.types();
    let options = DigestOptions::default();

    c.bench_function("digest_cache_prefetch", |b| {
        b.iter(|| {
            let cache = DigestCache::new();
            cache.prefetch(black_box(&types), &registry, &options);
            black_box(cache.len())
        });
    });
}

fn bench_materialize(c: &mut Criterion) {
    let datum = marker("demo.Limit", &[("value", "42"), ("unit", "ms")]);
    let interface = InterfaceDescriptor::new("demo.Limit")
        .method(InterfaceMethod::new("value", ReturnType::Int))
        .method(InterfaceMethod::new("unit", ReturnType::String))
        .method(InterfaceMethod::new("strict", ReturnType::Bool).default_value(false))
        .build();

    c.bench_function("view_materialize_and_read", |b| {
        b.iter(|| {
            let view = materialize(black_box(&datum), &interface);
            black_box(view.get::<i32>("value").unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_live_digest,
    bench_binary_digest,
    bench_prefetch,
    bench_materialize
);
criterion_main!(benches);
