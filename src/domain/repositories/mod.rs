// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 所有接口的查询都以租户ID限定范围，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 租户与用户仓库（tenant_repository）
/// - 客户关系仓库（crm_repository）
/// - 产品目录仓库（catalog_repository）
/// - 报价仓库（quote_repository）
/// - 发票与收款仓库（invoice_repository）
/// - 总账仓库（ledger_repository）
/// - 编号序列仓库（sequence_repository）
/// - 续约与工时仓库（renewal_repository）
/// - 工单仓库（ticket_repository）
/// - 营销外呼仓库（outreach_repository）
/// - 支付回调事件仓库（payment_event_repository）
pub mod catalog_repository;
pub mod crm_repository;
pub mod invoice_repository;
pub mod ledger_repository;
pub mod outreach_repository;
pub mod payment_event_repository;
pub mod quote_repository;
pub mod renewal_repository;
pub mod sequence_repository;
pub mod tenant_repository;
pub mod ticket_repository;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 违反唯一约束或并发更新冲突
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 存储数据无法解析
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
