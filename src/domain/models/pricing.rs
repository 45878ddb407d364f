// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::utils::money::apply_bps;

/// 明细行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// 关联产品（可选）
    #[serde(default)]
    pub product_id: Option<Uuid>,
    /// 描述
    pub description: String,
    /// 数量，至少为 1
    pub quantity: i64,
    /// 单价（分）
    pub unit_price: i64,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }
}

/// 折扣类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// 百分比折扣，值为基点
    Percent,
    /// 固定金额折扣，值为分
    Fixed,
}

string_enum!(DiscountKind {
    Percent => "percent",
    Fixed => "fixed",
});

/// 应用到单据上的折扣
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    #[serde(default)]
    pub code: Option<String>,
    pub kind: DiscountKind,
    pub value: i64,
}

impl AppliedDiscount {
    pub fn amount_for(&self, subtotal: i64) -> i64 {
        match self.kind {
            DiscountKind::Percent => apply_bps(subtotal, self.value).min(subtotal),
            DiscountKind::Fixed => self.value.min(subtotal),
        }
    }
}

/// 金额汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: i64,
    pub discount_total: i64,
    pub tax_total: i64,
    pub total: i64,
}

/// 计算单据金额
///
/// 小计为各行金额之和；折扣按百分比四舍五入或按固定金额封顶到小计；
/// 税额按折后金额计算。
pub fn compute_totals(
    lines: &[LineItem],
    discount: Option<&AppliedDiscount>,
    tax_rate_bps: i32,
) -> Result<Totals, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::validation("at least one line item is required"));
    }
    if !(0..=10_000).contains(&tax_rate_bps) {
        return Err(DomainError::validation("tax rate must be between 0 and 10000 bps"));
    }

    let mut subtotal: i64 = 0;
    for line in lines {
        if line.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if line.unit_price < 0 {
            return Err(DomainError::validation("unit price must not be negative"));
        }
        subtotal = subtotal
            .checked_add(line.quantity.checked_mul(line.unit_price).ok_or_else(|| {
                DomainError::validation("line total out of range")
            })?)
            .ok_or_else(|| DomainError::validation("subtotal out of range"))?;
    }

    let discount_total = match discount {
        Some(d) => {
            if d.value < 0 {
                return Err(DomainError::validation("discount value must not be negative"));
            }
            if d.kind == DiscountKind::Percent && d.value > 10_000 {
                return Err(DomainError::validation("percent discount exceeds 100%"));
            }
            d.amount_for(subtotal)
        }
        None => 0,
    };

    let taxable = subtotal - discount_total;
    let tax_total = apply_bps(taxable, tax_rate_bps as i64);

    Ok(Totals {
        subtotal,
        discount_total,
        tax_total,
        total: taxable + tax_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price: i64) -> LineItem {
        LineItem {
            product_id: None,
            description: "item".into(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_totals_with_percent_discount_and_tax() {
        let lines = vec![line(2, 5000), line(1, 2500)];
        let discount = AppliedDiscount {
            code: Some("SAVE10".into()),
            kind: DiscountKind::Percent,
            value: 1000,
        };
        let totals = compute_totals(&lines, Some(&discount), 825).unwrap();
        assert_eq!(totals.subtotal, 12500);
        assert_eq!(totals.discount_total, 1250);
        // 11250 * 8.25% = 928.125
        assert_eq!(totals.tax_total, 928);
        assert_eq!(totals.total, 12178);
    }

    #[test]
    fn test_fixed_discount_is_capped_at_subtotal() {
        let discount = AppliedDiscount {
            code: None,
            kind: DiscountKind::Fixed,
            value: 99_999,
        };
        let totals = compute_totals(&[line(1, 1000)], Some(&discount), 500).unwrap();
        assert_eq!(totals.discount_total, 1000);
        assert_eq!(totals.tax_total, 0);
        assert_eq!(totals.total, 0);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 110 * 5% = 5.5, 105 * 5% = 5.25
        assert_eq!(compute_totals(&[line(1, 110)], None, 500).unwrap().tax_total, 6);
        assert_eq!(compute_totals(&[line(1, 105)], None, 500).unwrap().tax_total, 5);
    }

    #[test]
    fn test_invalid_lines_are_rejected() {
        assert!(compute_totals(&[], None, 0).is_err());
        assert!(compute_totals(&[line(0, 100)], None, 0).is_err());
        assert!(compute_totals(&[line(1, -1)], None, 0).is_err());
        assert!(compute_totals(&[line(1, 100)], None, 10_001).is_err());
    }
}
