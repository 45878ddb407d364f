// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, SqlErr};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::repositories::RepositoryError;

/// 仓库实现模块
///
/// 提供领域仓库接口的 SeaORM 实现
/// 所有查询都带租户条件，枚举以字符串列存储
pub mod catalog_repo_impl;
pub mod crm_repo_impl;
pub mod invoice_repo_impl;
pub mod ledger_repo_impl;
pub mod outreach_repo_impl;
pub mod payment_event_repo_impl;
pub mod quote_repo_impl;
pub mod renewal_repo_impl;
pub mod sequence_repo_impl;
pub mod tenant_repo_impl;
pub mod ticket_repo_impl;

/// 写操作错误转换：唯一约束冲突为 Conflict，未命中更新为 NotFound
pub(crate) fn write_err(err: DbErr) -> RepositoryError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return RepositoryError::Conflict(detail);
    }
    match err {
        DbErr::RecordNotUpdated => RepositoryError::NotFound,
        other => RepositoryError::Database(other),
    }
}

/// 解析字符串列
pub(crate) fn parse_column<T: FromStr>(value: &str, column: &'static str) -> Result<T, RepositoryError> {
    value
        .parse()
        .map_err(|_| RepositoryError::Corrupt(format!("unexpected {} value '{}'", column, value)))
}

pub(crate) fn from_json<T: DeserializeOwned>(
    value: serde_json::Value,
    column: &'static str,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Corrupt(format!("invalid {} json: {}", column, e)))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

pub(crate) fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

pub(crate) fn tz(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::invoice::InvoiceStatus;

    #[test]
    fn test_parse_column_reports_corrupt_values() {
        assert_eq!(
            parse_column::<InvoiceStatus>("partially_paid", "status").unwrap(),
            InvoiceStatus::PartiallyPaid
        );
        assert!(matches!(
            parse_column::<InvoiceStatus>("settled", "status"),
            Err(RepositoryError::Corrupt(_))
        ));
    }

    #[test]
    fn test_missing_update_maps_to_not_found() {
        assert!(matches!(write_err(DbErr::RecordNotUpdated), RepositoryError::NotFound));
    }
}
