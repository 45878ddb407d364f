// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::quote::{Quote, QuoteStatus};

/// 报价查询参数
#[derive(Debug, Default, Clone)]
pub struct QuoteQuery {
    pub account_id: Option<Uuid>,
    pub statuses: Option<Vec<QuoteStatus>>,
}

/// 报价仓库
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &Quote) -> Result<Quote, RepositoryError>;
    /// 仅当数据库中的状态仍为 `expected` 时更新，否则返回 Conflict；
    /// 已关联发票的报价不会被改写为关联另一张发票。
    async fn update(&self, quote: &Quote, expected: QuoteStatus) -> Result<Quote, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Quote>, RepositoryError>;
    async fn list(&self, tenant_id: Uuid, query: QuoteQuery) -> Result<Vec<Quote>, RepositoryError>;
}
