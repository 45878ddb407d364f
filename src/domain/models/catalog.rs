// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{AppliedDiscount, DiscountKind, LineItem};
use crate::domain::errors::DomainError;
use crate::utils::money::allocate_proportional;

/// 产品类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// 一次性产品
    #[default]
    OneTime,
    /// 订阅产品
    Subscription,
}

string_enum!(ProductKind {
    OneTime => "one_time",
    Subscription => "subscription",
});

/// 产品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: i64,
    pub kind: ProductKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// 套餐中的单个条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// 产品套餐
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub items: Vec<BundleItem>,
    /// 套餐价格（分）
    pub price: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Bundle {
    /// 将套餐展开为明细行
    ///
    /// 套餐价格按各条目标价比例分摊（最大余数法），
    /// 明细合计严格等于套餐价格，且不会出现负单价。
    pub fn expand(&self, products: &HashMap<Uuid, Product>) -> Result<Vec<LineItem>, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::validation("bundle has no items"));
        }
        if self.price < 0 {
            return Err(DomainError::validation("bundle price must not be negative"));
        }

        let mut components = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if item.quantity < 1 {
                return Err(DomainError::validation("bundle item quantity must be at least 1"));
            }
            let product = products
                .get(&item.product_id)
                .ok_or(DomainError::NotFound("product"))?;
            let list_total = item
                .quantity
                .checked_mul(product.unit_price)
                .ok_or_else(|| DomainError::validation("bundle item total out of range"))?;
            components.push((product, list_total));
        }

        let weights: Vec<i64> = components.iter().map(|(_, total)| *total).collect();
        let shares = allocate_proportional(self.price, &weights);
        let lines = components
            .into_iter()
            .zip(shares)
            .map(|((product, _), share)| LineItem {
                product_id: Some(product.id),
                description: format!("{} ({})", product.name, self.name),
                quantity: 1,
                unit_price: share,
            })
            .collect();

        Ok(lines)
    }
}

/// 折扣码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// 折扣码，统一存储为大写
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub active: bool,
    pub expires_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// 检查折扣在指定日期是否可用
    pub fn ensure_usable(&self, today: NaiveDate) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::validation(format!("discount {} is inactive", self.code)));
        }
        if self.expires_at.is_some_and(|expires| expires < today) {
            return Err(DomainError::validation(format!("discount {} has expired", self.code)));
        }
        Ok(())
    }

    pub fn to_applied(&self) -> AppliedDiscount {
        AppliedDiscount {
            code: Some(self.code.clone()),
            kind: self.kind,
            value: self.value,
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::pricing::compute_totals;

    fn product(name: &str, unit_price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            sku: name.to_uppercase(),
            name: name.into(),
            unit_price,
            kind: ProductKind::OneTime,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bundle_allocation_sums_to_price() {
        let a = product("a", 1000);
        let b = product("b", 1000);
        let c = product("c", 1000);
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Starter".into(),
            items: vec![
                BundleItem { product_id: a.id, quantity: 1 },
                BundleItem { product_id: b.id, quantity: 1 },
                BundleItem { product_id: c.id, quantity: 1 },
            ],
            price: 1000,
            active: true,
            created_at: Utc::now(),
        };
        let products: HashMap<_, _> = [a, b, c].into_iter().map(|p| (p.id, p)).collect();

        let lines = bundle.expand(&products).unwrap();
        let prices: Vec<i64> = lines.iter().map(|l| l.unit_price).collect();
        assert_eq!(prices, vec![333, 333, 334]);
        assert_eq!(lines.iter().map(|l| l.line_total()).sum::<i64>(), 1000);
    }

    #[test]
    fn test_bundle_allocation_is_proportional() {
        let big = product("big", 3000);
        let small = product("small", 1000);
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Pair".into(),
            items: vec![
                BundleItem { product_id: big.id, quantity: 1 },
                BundleItem { product_id: small.id, quantity: 2 },
            ],
            price: 4000,
            active: true,
            created_at: Utc::now(),
        };
        let products: HashMap<_, _> = [big, small].into_iter().map(|p| (p.id, p)).collect();
        let lines = bundle.expand(&products).unwrap();
        assert_eq!(lines[0].unit_price, 2400);
        assert_eq!(lines[1].unit_price, 1600);
    }

    #[test]
    fn test_bundle_allocation_never_goes_negative() {
        let a = product("a", 1000);
        let b = product("b", 1000);
        let free = product("free", 0);
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Odd".into(),
            items: vec![
                BundleItem { product_id: a.id, quantity: 1 },
                BundleItem { product_id: b.id, quantity: 1 },
                BundleItem { product_id: free.id, quantity: 1 },
            ],
            price: 10_001,
            active: true,
            created_at: Utc::now(),
        };
        let products: HashMap<_, _> = [a, b, free].into_iter().map(|p| (p.id, p)).collect();

        let lines = bundle.expand(&products).unwrap();
        let prices: Vec<i64> = lines.iter().map(|l| l.unit_price).collect();
        assert_eq!(prices, vec![5000, 5001, 0]);
        let totals = compute_totals(&lines, None, 0).unwrap();
        assert_eq!(totals.total, 10_001);
    }

    #[test]
    fn test_bundle_item_overflow_is_rejected() {
        let pricey = product("pricey", i64::MAX / 2);
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Huge".into(),
            items: vec![BundleItem { product_id: pricey.id, quantity: 3 }],
            price: 100,
            active: true,
            created_at: Utc::now(),
        };
        let products: HashMap<_, _> = [(pricey.id, pricey)].into_iter().collect();
        assert!(matches!(bundle.expand(&products), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_discount_usability() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut discount = Discount {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            code: normalize_code(" spring "),
            kind: DiscountKind::Percent,
            value: 1500,
            active: true,
            expires_at: NaiveDate::from_ymd_opt(2026, 3, 1),
            created_at: Utc::now(),
        };
        assert_eq!(discount.code, "SPRING");
        assert!(discount.ensure_usable(today).is_ok());
        assert!(discount.ensure_usable(today.succ_opt().unwrap()).is_err());

        discount.active = false;
        assert!(discount.ensure_usable(today).is_err());
    }
}
