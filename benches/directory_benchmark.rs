use criterion::{criterion_group, criterion_main, Criterion};
use etab_client::services::normalize::normalize_collection;
use etab_client::services::{filter, Filter};
use serde_json::{json, Value};
use std::hint::black_box;

const KINDS: [&str; 5] = ["Restaurant", "Bistrot", "Café", "Bar", "Fast-Food"];

/// A collection response of `n` records mixing every field alias.
fn fixture(n: usize) -> Value {
    let records: Vec<Value> = (0..n)
        .map(|i| {
            if i % 2 == 0 {
                json!({
                    "id": i + 1,
                    "nom": format!("Établissement {}", i),
                    "type": KINDS[i % KINDS.len()],
                    "adresse": format!("{} rue de Rivoli, Paris", i),
                    "note": "4.2",
                    "description": "Cuisine du marché."
                })
            } else {
                json!({
                    "_id": format!("x{}", i),
                    "name": format!("Place {}", i),
                    "categorie": KINDS[i % KINDS.len()],
                    "address": "",
                    "location": "Quai 3",
                    "moyenne": 3.9
                })
            }
        })
        .collect();
    json!({ "data": records })
}

fn benchmark_directory(c: &mut Criterion) {
    let body = fixture(1_000);
    let list = normalize_collection(&body);
    let by_kind = Filter {
        category: Some("bistrot".into()),
        search_text: None,
    };
    let by_both = Filter {
        category: Some("restaurant".into()),
        search_text: Some("ment 1".into()),
    };

    let mut group = c.benchmark_group("directory");

    group.bench_function("normalize_1000", |b| {
        b.iter(|| normalize_collection(black_box(&body)))
    });

    group.bench_function("filter_category", |b| {
        b.iter(|| filter(black_box(&list), black_box(&by_kind)))
    });

    group.bench_function("filter_category_and_name", |b| {
        b.iter(|| filter(black_box(&list), black_box(&by_both)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_directory);
criterion_main!(benches);
