// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::application::dto::billing::LinesDto;
use crate::application::dto::catalog::{BundleRequestDto, DiscountRequestDto, ProductRequestDto};
use crate::domain::errors::DomainError;
use crate::domain::models::catalog::{normalize_code, Bundle, Discount, Product};
use crate::domain::models::pricing::{AppliedDiscount, DiscountKind, LineItem};
use crate::domain::repositories::catalog_repository::CatalogRepository;
use crate::domain::repositories::RepositoryError;

/// 产品目录服务
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_product(
        &self,
        tenant_id: Uuid,
        req: ProductRequestDto,
    ) -> Result<Product, DomainError> {
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id,
            sku: req.sku.trim().to_string(),
            name: req.name.trim().to_string(),
            unit_price: req.unit_price,
            kind: req.kind,
            active: req.active.unwrap_or(true),
            created_at: Utc::now(),
        };
        match self.repo.create_product(&product).await {
            Ok(product) => Ok(product),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "sku {} already exists",
                product.sku
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: ProductRequestDto,
    ) -> Result<Product, DomainError> {
        let mut product = self.get_product(tenant_id, id).await?;
        product.sku = req.sku.trim().to_string();
        product.name = req.name.trim().to_string();
        product.unit_price = req.unit_price;
        product.kind = req.kind;
        if let Some(active) = req.active {
            product.active = active;
        }
        match self.repo.update_product(&product).await {
            Ok(product) => Ok(product),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "sku {} already exists",
                product.sku
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Product, DomainError> {
        self.repo
            .find_product(tenant_id, id)
            .await?
            .ok_or(DomainError::NotFound("product"))
    }

    pub async fn list_products(&self, tenant_id: Uuid) -> Result<Vec<Product>, DomainError> {
        Ok(self.repo.list_products(tenant_id).await?)
    }

    async fn products_by_id(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Product>, DomainError> {
        Ok(self
            .repo
            .find_products(tenant_id, ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    pub async fn create_bundle(
        &self,
        tenant_id: Uuid,
        req: BundleRequestDto,
    ) -> Result<Bundle, DomainError> {
        let ids: Vec<Uuid> = req.items.iter().map(|i| i.product_id).collect();
        let products = self.products_by_id(tenant_id, &ids).await?;
        if let Some(missing) = ids.iter().find(|id| !products.contains_key(id)) {
            return Err(DomainError::validation(format!("unknown product {}", missing)));
        }
        if req.items.iter().any(|i| i.quantity < 1) {
            return Err(DomainError::validation("bundle item quantity must be at least 1"));
        }
        let bundle = Bundle {
            id: Uuid::new_v4(),
            tenant_id,
            name: req.name.trim().to_string(),
            items: req.items,
            price: req.price,
            active: true,
            created_at: Utc::now(),
        };
        Ok(self.repo.create_bundle(&bundle).await?)
    }

    pub async fn list_bundles(&self, tenant_id: Uuid) -> Result<Vec<Bundle>, DomainError> {
        Ok(self.repo.list_bundles(tenant_id).await?)
    }

    /// 展开套餐为明细行
    pub async fn expand_bundle(
        &self,
        tenant_id: Uuid,
        bundle_id: Uuid,
    ) -> Result<Vec<LineItem>, DomainError> {
        let bundle = self
            .repo
            .find_bundle(tenant_id, bundle_id)
            .await?
            .ok_or(DomainError::NotFound("bundle"))?;
        if !bundle.active {
            return Err(DomainError::validation(format!("bundle {} is inactive", bundle.name)));
        }
        let ids: Vec<Uuid> = bundle.items.iter().map(|i| i.product_id).collect();
        let products = self.products_by_id(tenant_id, &ids).await?;
        bundle.expand(&products)
    }

    pub async fn create_discount(
        &self,
        tenant_id: Uuid,
        req: DiscountRequestDto,
    ) -> Result<Discount, DomainError> {
        if req.kind == DiscountKind::Percent && req.value > 10_000 {
            return Err(DomainError::validation("percent discount exceeds 10000 bps"));
        }
        let discount = Discount {
            id: Uuid::new_v4(),
            tenant_id,
            code: normalize_code(&req.code),
            kind: req.kind,
            value: req.value,
            active: req.active.unwrap_or(true),
            expires_at: req.expires_at,
            created_at: Utc::now(),
        };
        match self.repo.create_discount(&discount).await {
            Ok(discount) => Ok(discount),
            Err(RepositoryError::Conflict(_)) => Err(DomainError::conflict(format!(
                "discount code {} already exists",
                discount.code
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_discount_active(
        &self,
        tenant_id: Uuid,
        code: &str,
        active: bool,
    ) -> Result<Discount, DomainError> {
        let mut discount = self
            .repo
            .find_discount_by_code(tenant_id, &normalize_code(code))
            .await?
            .ok_or(DomainError::NotFound("discount"))?;
        discount.active = active;
        Ok(self.repo.update_discount(&discount).await?)
    }

    pub async fn list_discounts(&self, tenant_id: Uuid) -> Result<Vec<Discount>, DomainError> {
        Ok(self.repo.list_discounts(tenant_id).await?)
    }

    /// 解析折扣码，未知、停用或过期时失败
    pub async fn resolve_discount(
        &self,
        tenant_id: Uuid,
        code: &str,
        today: NaiveDate,
    ) -> Result<Discount, DomainError> {
        let discount = self
            .repo
            .find_discount_by_code(tenant_id, &normalize_code(code))
            .await?
            .ok_or_else(|| DomainError::validation(format!("unknown discount code {}", code)))?;
        discount.ensure_usable(today)?;
        Ok(discount)
    }

    /// 将请求中的明细、套餐和折扣码解析为单据明细
    pub async fn build_lines(
        &self,
        tenant_id: Uuid,
        req: &LinesDto,
        today: NaiveDate,
    ) -> Result<(Vec<LineItem>, Option<AppliedDiscount>), DomainError> {
        let mut lines = req.lines.clone();
        for bundle_id in &req.bundle_ids {
            lines.extend(self.expand_bundle(tenant_id, *bundle_id).await?);
        }
        let discount = match req.discount_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                Some(self.resolve_discount(tenant_id, code, today).await?.to_applied())
            }
            _ => None,
        };
        Ok((lines, discount))
    }
}
