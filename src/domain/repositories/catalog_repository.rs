// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::models::catalog::{Bundle, Discount, Product};

/// 产品目录仓库
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 创建产品，SKU 重复时返回 Conflict
    async fn create_product(&self, product: &Product) -> Result<Product, RepositoryError>;
    async fn update_product(&self, product: &Product) -> Result<Product, RepositoryError>;
    async fn find_product(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<Product>, RepositoryError>;
    async fn find_products(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, RepositoryError>;
    async fn list_products(&self, tenant_id: Uuid) -> Result<Vec<Product>, RepositoryError>;

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, RepositoryError>;
    async fn find_bundle(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Bundle>, RepositoryError>;
    async fn list_bundles(&self, tenant_id: Uuid) -> Result<Vec<Bundle>, RepositoryError>;

    /// 创建折扣码，代码重复时返回 Conflict
    async fn create_discount(&self, discount: &Discount) -> Result<Discount, RepositoryError>;
    async fn update_discount(&self, discount: &Discount) -> Result<Discount, RepositoryError>;
    /// 按规范化后的代码查找
    async fn find_discount_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Discount>, RepositoryError>;
    async fn list_discounts(&self, tenant_id: Uuid) -> Result<Vec<Discount>, RepositoryError>;
}
