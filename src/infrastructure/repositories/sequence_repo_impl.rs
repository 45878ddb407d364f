// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::domain::repositories::sequence_repository::SequenceRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::sequence;

/// 在给定连接（通常是事务）中递增序列并返回新值
///
/// 先尝试原地加一，序列不存在时插入初始值；并发插入时重试一次更新。
pub(crate) async fn next_sequence_value<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    name: &str,
) -> Result<i64, RepositoryError> {
    for _ in 0..2 {
        let updated = sequence::Entity::update_many()
            .col_expr(
                sequence::Column::Value,
                Expr::col(sequence::Column::Value).add(1),
            )
            .filter(sequence::Column::TenantId.eq(tenant_id))
            .filter(sequence::Column::Name.eq(name))
            .exec(conn)
            .await?;

        if updated.rows_affected == 1 {
            let row = sequence::Entity::find_by_id((tenant_id, name.to_owned()))
                .one(conn)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            return Ok(row.value);
        }

        let seed = sequence::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(name.to_owned()),
            value: Set(1),
        };
        let inserted = sequence::Entity::insert(seed)
            .on_conflict(
                sea_query::OnConflict::columns([sequence::Column::TenantId, sequence::Column::Name])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        if inserted == 1 {
            return Ok(1);
        }
    }
    Err(RepositoryError::Conflict(format!(
        "sequence {} is contended",
        name
    )))
}

/// 编号序列仓库实现
#[derive(Clone)]
pub struct SequenceRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl SequenceRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SequenceRepository for SequenceRepoImpl {
    async fn next_value(&self, tenant_id: Uuid, name: &str) -> Result<i64, RepositoryError> {
        let txn = self.db.begin().await?;
        let value = next_sequence_value(&txn, tenant_id, name).await?;
        txn.commit().await?;
        Ok(value)
    }
}
