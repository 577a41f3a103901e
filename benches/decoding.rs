use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::Deserialize;
use serde_pleat::{decode_str, from_str, tokenize};

#[derive(Deserialize)]
#[allow(dead_code)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn products_doc(size: u32) -> String {
    let mut doc = String::new();
    for i in 0..size {
        doc.push_str(&format!(
            "- sku: \"SKU{i}\"\n  name: \"Product {i}\"\n  price: {}\n  quantity: {i}\n",
            9.99 + f64::from(i)
        ));
    }
    doc
}

fn benchmark_deserialize_simple(c: &mut Criterion) {
    let doc = "id: 123\nname: \"Alice\"\nemail: \"alice@example.com\"\nactive: true";

    c.bench_function("deserialize_simple_struct", |b| {
        b.iter(|| from_str::<User>(black_box(doc)))
    });
}

fn benchmark_deserialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_array");

    for size in [10, 50, 100, 500].iter() {
        let doc = products_doc(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| from_str::<Vec<Product>>(black_box(doc)))
        });
    }
    group.finish();
}

fn benchmark_tokenize_vs_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    let doc = products_doc(100);

    group.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(&doc))));
    group.bench_function("decode_value", |b| b.iter(|| decode_str(black_box(&doc))));
    group.finish();
}

fn benchmark_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    let escaped = format!("s: \"{}\"", "tab\\there \\u00e9 ".repeat(20));
    let folded = format!("s: '{}'", "folded line\n   ".repeat(20));
    let heredoc = format!("s: ```\n{}  ```", "  a heredoc body line\n".repeat(20));

    group.bench_function("escaped", |b| b.iter(|| decode_str(black_box(&escaped))));
    group.bench_function("folded", |b| b.iter(|| decode_str(black_box(&folded))));
    group.bench_function("heredoc", |b| b.iter(|| decode_str(black_box(&heredoc))));
    group.finish();
}

fn benchmark_primitive_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_array");

    let integers: String = (0..100).map(|i| format!("- {i}\n")).collect();
    let inline = format!(
        "[{}]",
        (0..100).map(|i| format!("{}", f64::from(i) * 1.5)).collect::<Vec<_>>().join(", ")
    );

    group.bench_function("deserialize_integers", |b| {
        b.iter(|| from_str::<Vec<i32>>(black_box(&integers)))
    });

    group.bench_function("deserialize_inline_floats", |b| {
        b.iter(|| from_str::<Vec<f64>>(black_box(&inline)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_deserialize_simple,
    benchmark_deserialize_array,
    benchmark_tokenize_vs_decode,
    benchmark_strings,
    benchmark_primitive_array,
);
criterion_main!(benches);
