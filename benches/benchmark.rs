// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 性能基准测试套件
//!
//! 覆盖计价、套餐展开、分录校验与营销邮件合成等热点路径。

use std::collections::HashMap;
use std::hint::black_box;

use boaz_os::domain::models::catalog::{Bundle, BundleItem, Product, ProductKind};
use boaz_os::domain::models::ledger::{validate_lines, JournalLineDraft};
use boaz_os::domain::models::pricing::{compute_totals, AppliedDiscount, DiscountKind, LineItem};
use boaz_os::domain::services::auto_posting::PostingEvent;
use boaz_os::domain::services::email_composer::{compose, LinkTracker, MergeContext};
use boaz_os::utils::tokens::TokenSigner;
use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

fn lines(count: usize) -> Vec<LineItem> {
    (0..count)
        .map(|i| LineItem {
            product_id: None,
            description: format!("Service line {}", i),
            quantity: (i % 5 + 1) as i64,
            unit_price: 1_250 + i as i64 * 17,
        })
        .collect()
}

/// 基准测试：单据金额计算
fn benchmark_compute_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_totals");
    let discount = AppliedDiscount {
        code: Some("LAUNCH10".to_string()),
        kind: DiscountKind::Percent,
        value: 1_000,
    };

    for size in [1, 10, 100, 1000].iter() {
        let items = lines(*size);
        group.bench_with_input(BenchmarkId::new("percent_discount", size), &items, |b, items| {
            b.iter(|| compute_totals(black_box(items), Some(&discount), 825))
        });
    }
    group.finish();
}

/// 基准测试：套餐按标价比例展开
fn benchmark_bundle_expand(c: &mut Criterion) {
    let tenant_id = Uuid::new_v4();
    let mut group = c.benchmark_group("bundle_expand");

    for size in [2, 10, 50].iter() {
        let products: HashMap<Uuid, Product> = (0..*size)
            .map(|i| {
                let product = Product {
                    id: Uuid::new_v4(),
                    tenant_id,
                    sku: format!("SKU-{}", i),
                    name: format!("Product {}", i),
                    unit_price: 999 + i as i64 * 101,
                    kind: ProductKind::OneTime,
                    active: true,
                    created_at: Utc::now(),
                };
                (product.id, product)
            })
            .collect();
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id,
            name: "Starter pack".to_string(),
            items: products
                .keys()
                .map(|id| BundleItem {
                    product_id: *id,
                    quantity: 2,
                })
                .collect(),
            price: 100_000,
            active: true,
            created_at: Utc::now(),
        };

        group.bench_with_input(BenchmarkId::new("items", size), &products, |b, products| {
            b.iter(|| bundle.expand(black_box(products)))
        });
    }
    group.finish();
}

/// 基准测试：自动过账生成分录并校验借贷平衡
fn benchmark_posting_rules(c: &mut Criterion) {
    let payment = PostingEvent::PaymentReceived {
        payment_id: Uuid::new_v4(),
        invoice_number: "INV-2026-000042".to_string(),
        amount: 110_000,
        fee: 3_220,
    };
    c.bench_function("posting_payment_lines", |b| {
        b.iter(|| black_box(&payment).lines().and_then(|lines| validate_lines(&lines)))
    });

    let manual: Vec<JournalLineDraft> = (0..50)
        .flat_map(|i| {
            [
                JournalLineDraft::debit("5000", 100 + i),
                JournalLineDraft::credit("1000", 100 + i),
            ]
        })
        .collect();
    c.bench_function("validate_lines_100", |b| {
        b.iter(|| validate_lines(black_box(&manual)))
    });
}

struct BenchTracker {
    signer: TokenSigner,
}

impl LinkTracker for BenchTracker {
    fn click_url(&self, target: &str) -> Option<String> {
        self.signer
            .sign(&target)
            .ok()
            .map(|token| format!("https://boaz.test/t/c/{}", token))
    }

    fn open_url(&self) -> Option<String> {
        Some("https://boaz.test/t/o/open".to_string())
    }

    fn unsubscribe_url(&self) -> String {
        "https://boaz.test/unsubscribe/token".to_string()
    }
}

/// 基准测试：营销邮件合成（合并标签、链接改写、打开像素）
fn benchmark_email_compose(c: &mut Criterion) {
    let tracker = BenchTracker {
        signer: TokenSigner::new("bench-secret"),
    };
    let ctx = MergeContext {
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        email: "ann@example.com".to_string(),
        company: "Globex & Co".to_string(),
    };

    let mut group = c.benchmark_group("email_compose");
    for links in [1, 10, 50].iter() {
        let mut html = String::from("<html><body><p>Hi {{first_name}} at {{company}},</p>");
        for i in 0..*links {
            html.push_str(&format!("<a href=\"https://boaz.test/articles/{}\">Article {}</a>", i, i));
        }
        html.push_str("</body></html>");

        group.bench_with_input(BenchmarkId::new("links", links), &html, |b, html| {
            b.iter(|| compose("News for {{first_name}}", black_box(html), &ctx, &tracker))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_compute_totals,
    benchmark_bundle_expand,
    benchmark_posting_rules,
    benchmark_email_compose
);
criterion_main!(benches);
