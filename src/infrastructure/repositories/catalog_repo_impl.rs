// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::*;
use uuid::Uuid;

use super::{from_json, parse_column, to_json, tz, utc, write_err};
use crate::domain::models::catalog::{Bundle, Discount, Product};
use crate::domain::repositories::catalog_repository::CatalogRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{bundle, discount, product};

/// 产品目录仓库实现
#[derive(Clone)]
pub struct CatalogRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl CatalogRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn product_active_model(product: &Product) -> product::ActiveModel {
    product::ActiveModel {
        id: Set(product.id),
        tenant_id: Set(product.tenant_id),
        sku: Set(product.sku.clone()),
        name: Set(product.name.clone()),
        unit_price: Set(product.unit_price),
        kind: Set(product.kind.as_str().to_string()),
        active: Set(product.active),
        created_at: Set(tz(product.created_at)),
    }
}

impl TryFrom<product::Model> for Product {
    type Error = RepositoryError;

    fn try_from(model: product::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            sku: model.sku,
            name: model.name,
            unit_price: model.unit_price,
            kind: parse_column(&model.kind, "product kind")?,
            active: model.active,
            created_at: utc(model.created_at),
        })
    }
}

impl TryFrom<bundle::Model> for Bundle {
    type Error = RepositoryError;

    fn try_from(model: bundle::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            items: from_json(model.items, "bundle items")?,
            price: model.price,
            active: model.active,
            created_at: utc(model.created_at),
        })
    }
}

fn discount_active_model(discount: &Discount) -> discount::ActiveModel {
    discount::ActiveModel {
        id: Set(discount.id),
        tenant_id: Set(discount.tenant_id),
        code: Set(discount.code.clone()),
        kind: Set(discount.kind.as_str().to_string()),
        value: Set(discount.value),
        active: Set(discount.active),
        expires_at: Set(discount.expires_at),
        created_at: Set(tz(discount.created_at)),
    }
}

impl TryFrom<discount::Model> for Discount {
    type Error = RepositoryError;

    fn try_from(model: discount::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            code: model.code,
            kind: parse_column(&model.kind, "discount kind")?,
            value: model.value,
            active: model.active,
            expires_at: model.expires_at,
            created_at: utc(model.created_at),
        })
    }
}

#[async_trait]
impl CatalogRepository for CatalogRepoImpl {
    async fn create_product(&self, product: &Product) -> Result<Product, RepositoryError> {
        product::Entity::insert(product_active_model(product))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(product.clone())
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RepositoryError> {
        product::Entity::update(product_active_model(product))
            .filter(product::Column::TenantId.eq(product.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        product::Entity::find_by_id(id)
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn find_products(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        product::Entity::find()
            .filter(product::Column::TenantId.eq(tenant_id))
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn list_products(&self, tenant_id: Uuid) -> Result<Vec<Product>, RepositoryError> {
        product::Entity::find()
            .filter(product::Column::TenantId.eq(tenant_id))
            .order_by_asc(product::Column::Sku)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, RepositoryError> {
        let active_model = bundle::ActiveModel {
            id: Set(bundle.id),
            tenant_id: Set(bundle.tenant_id),
            name: Set(bundle.name.clone()),
            items: Set(to_json(&bundle.items)?),
            price: Set(bundle.price),
            active: Set(bundle.active),
            created_at: Set(tz(bundle.created_at)),
        };
        bundle::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(bundle.clone())
    }

    async fn find_bundle(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Bundle>, RepositoryError> {
        bundle::Entity::find_by_id(id)
            .filter(bundle::Column::TenantId.eq(tenant_id))
            .one(self.db.as_ref())
            .await?
            .map(Bundle::try_from)
            .transpose()
    }

    async fn list_bundles(&self, tenant_id: Uuid) -> Result<Vec<Bundle>, RepositoryError> {
        bundle::Entity::find()
            .filter(bundle::Column::TenantId.eq(tenant_id))
            .order_by_asc(bundle::Column::Name)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Bundle::try_from)
            .collect()
    }

    async fn create_discount(&self, discount: &Discount) -> Result<Discount, RepositoryError> {
        discount::Entity::insert(discount_active_model(discount))
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_err)?;
        Ok(discount.clone())
    }

    async fn update_discount(&self, discount: &Discount) -> Result<Discount, RepositoryError> {
        discount::Entity::update(discount_active_model(discount))
            .filter(discount::Column::TenantId.eq(discount.tenant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_err)?
            .try_into()
    }

    async fn find_discount_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Discount>, RepositoryError> {
        discount::Entity::find()
            .filter(discount::Column::TenantId.eq(tenant_id))
            .filter(discount::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await?
            .map(Discount::try_from)
            .transpose()
    }

    async fn list_discounts(&self, tenant_id: Uuid) -> Result<Vec<Discount>, RepositoryError> {
        discount::Entity::find()
            .filter(discount::Column::TenantId.eq(tenant_id))
            .order_by_asc(discount::Column::Code)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Discount::try_from)
            .collect()
    }
}
