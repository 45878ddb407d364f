// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 金额工具
//!
//! 所有金额均以最小货币单位（分）的 `i64` 表示，比率以基点（万分之一）表示。

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("amount out of range: {0}")]
    Overflow(String),
}

/// 计算 `value * numerator / denominator`，结果按四舍五入（远离零）取整
pub fn mul_div_round(value: i64, numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    let product = value as i128 * numerator as i128;
    let denom = denominator as i128;
    let negative = (product < 0) != (denom < 0);
    let (p, d) = (product.abs(), denom.abs());
    let rounded = (p * 2 + d) / (d * 2);
    let signed = if negative { -rounded } else { rounded };
    signed.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// 按基点计算比例金额
pub fn apply_bps(amount: i64, bps: i64) -> i64 {
    mul_div_round(amount, bps, 10_000)
}

/// 按权重分摊非负金额（最大余数法）
///
/// 每份先向下取整，剩余的分依次补给余数最大的份额，余数相同时补给靠后的份额。
/// 结果之和严格等于 `total`，权重为 0 的份额分得 0；权重全为 0 时平均分摊。
pub fn allocate_proportional(total: i64, weights: &[i64]) -> Vec<i64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let weight_sum: i128 = weights.iter().map(|w| (*w).max(0) as i128).sum();
    let weights: Vec<i128> = if weight_sum == 0 {
        vec![1; weights.len()]
    } else {
        weights.iter().map(|w| (*w).max(0) as i128).collect()
    };
    let weight_sum: i128 = weights.iter().sum();
    let total = total.max(0) as i128;

    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let scaled = total * weight;
        shares.push((scaled / weight_sum) as i64);
        remainders.push((scaled % weight_sum, index));
    }

    let mut leftover = total as i64 - shares.iter().sum::<i64>();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    for (_, index) in remainders {
        if leftover == 0 {
            break;
        }
        shares[index] += 1;
        leftover -= 1;
    }
    shares
}

/// 将十进制金额字符串精确转换为分，例如 `"12.5"` → `1250`
pub fn parse_decimal_to_cents(raw: &str) -> Result<i64, MoneyError> {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(MoneyError::Invalid(raw.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(MoneyError::Invalid(raw.to_string()));
    }
    let significant = frac.trim_end_matches('0');
    if significant.len() > 2 {
        return Err(MoneyError::TooPrecise(raw.to_string()));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| MoneyError::Overflow(raw.to_string()))?
    };
    let mut frac_value: i64 = 0;
    for (i, c) in significant.chars().enumerate() {
        let digit = c.to_digit(10).unwrap_or(0) as i64;
        frac_value += digit * if i == 0 { 10 } else { 1 };
    }

    let cents = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| MoneyError::Overflow(raw.to_string()))?;
    Ok(if negative { -cents } else { cents })
}

/// 将分格式化为两位小数的字符串
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(apply_bps(1000, 825), 83); // 82.5
        assert_eq!(apply_bps(999, 825), 82); // 82.41
        assert_eq!(mul_div_round(45, 50, 60), 38); // 37.5
        assert_eq!(mul_div_round(-45, 50, 60), -38);
        assert_eq!(mul_div_round(10, 1, 0), 0);
    }

    #[test]
    fn test_allocate_proportional_uses_largest_remainder() {
        assert_eq!(allocate_proportional(1000, &[1, 1, 1]), vec![333, 333, 334]);
        assert_eq!(allocate_proportional(10_001, &[1000, 1000, 0]), vec![5000, 5001, 0]);
        assert_eq!(allocate_proportional(100, &[1, 2, 7]), vec![10, 20, 70]);
        // 0.5 与 0.5 的余数相同，尾差给靠后的份额
        assert_eq!(allocate_proportional(5, &[1, 1]), vec![2, 3]);
        assert_eq!(allocate_proportional(7, &[0, 0]), vec![3, 4]);
        assert_eq!(allocate_proportional(0, &[5, 0]), vec![0, 0]);
        assert!(allocate_proportional(10, &[]).is_empty());

        let shares = allocate_proportional(99_999, &[333, 333, 1, 0, 7]);
        assert_eq!(shares.iter().sum::<i64>(), 99_999);
        assert!(shares.iter().all(|s| *s >= 0));
        assert_eq!(shares[3], 0);
    }

    #[test]
    fn test_parse_decimal_to_cents() {
        assert_eq!(parse_decimal_to_cents("12.34"), Ok(1234));
        assert_eq!(parse_decimal_to_cents("12.5"), Ok(1250));
        assert_eq!(parse_decimal_to_cents("100"), Ok(10000));
        assert_eq!(parse_decimal_to_cents("0.10"), Ok(10));
        assert_eq!(parse_decimal_to_cents(".07"), Ok(7));
        assert_eq!(parse_decimal_to_cents("3.100"), Ok(310));
        assert_eq!(parse_decimal_to_cents("-1.01"), Ok(-101));
        assert!(matches!(
            parse_decimal_to_cents("1.005"),
            Err(MoneyError::TooPrecise(_))
        ));
        assert!(parse_decimal_to_cents("abc").is_err());
        assert!(parse_decimal_to_cents("").is_err());
        assert!(parse_decimal_to_cents("1e5").is_err());
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
    }
}
