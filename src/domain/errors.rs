// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::repositories::RepositoryError;

/// 领域错误类型
///
/// 表示业务规则被违反时产生的错误，表现层据此映射 HTTP 状态码。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 输入数据不符合业务规则
    #[error("validation error: {0}")]
    Validation(String),

    /// 资源不存在或不属于当前租户
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 重复数据或并发冲突
    #[error("conflict: {0}")]
    Conflict(String),

    /// 借贷不平衡
    #[error("unbalanced entry: debits {debits} != credits {credits}")]
    Unbalanced { debits: i64, credits: i64 },

    /// 会计期间未开放
    #[error("accounting period {period} is {status}")]
    PeriodNotOpen { period: String, status: String },

    /// 非法状态转换
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// 未认证
    #[error("invalid credentials")]
    Unauthorized,

    /// 权限不足
    #[error("missing permission {0}")]
    Forbidden(String),

    /// 账号已锁定
    #[error("account locked until {0}")]
    Locked(DateTime<Utc>),

    /// 签名校验失败
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// 第三方服务调用失败
    #[error("provider error: {0}")]
    External(String),

    /// 内部错误，如后台任务异常退出
    #[error("internal error: {0}")]
    Internal(String),

    /// 存储层错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        DomainError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
