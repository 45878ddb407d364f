// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::invoice::{Invoice, InvoiceStatus, InvoiceVersion, Payment};

/// 发票查询参数
#[derive(Debug, Default, Clone)]
pub struct InvoiceQuery {
    pub account_id: Option<Uuid>,
    pub statuses: Option<Vec<InvoiceStatus>>,
    pub renewal_id: Option<Uuid>,
    /// 排除草稿（门户使用）
    pub exclude_drafts: bool,
}

/// 发票与收款仓库
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice, RepositoryError>;
    /// 更新发票的非金额字段（状态、开票日期、凭证等）
    ///
    /// 仅当数据库中的状态与金额仍等于 `expected` 时生效，否则返回 Conflict。
    async fn update(
        &self,
        invoice: &Invoice,
        expected: InvoiceVersion,
    ) -> Result<Invoice, RepositoryError>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Invoice>, RepositoryError>;
    async fn list(&self, tenant_id: Uuid, query: InvoiceQuery)
        -> Result<Vec<Invoice>, RepositoryError>;

    /// 在同一事务中写入收付款记录并更新发票金额
    ///
    /// `expected` 为修改前的版本，数据库中的状态或金额已被其他请求
    /// 修改时返回 Conflict；(provider, external_id) 重复时同样返回 Conflict。
    async fn apply_payment(
        &self,
        invoice: &Invoice,
        expected: InvoiceVersion,
        payment: &Payment,
    ) -> Result<(), RepositoryError>;

    async fn find_payment_by_external_id(
        &self,
        tenant_id: Uuid,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Payment>, RepositoryError>;
    async fn list_payments(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<Payment>, RepositoryError>;
    /// 关联收付款记录与过账凭证
    async fn set_payment_entry(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), RepositoryError>;
}
