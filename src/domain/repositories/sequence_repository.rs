// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;

/// 编号序列仓库
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// 原子地递增并返回序列的下一个值，序列不存在时从 1 开始
    async fn next_value(&self, tenant_id: Uuid, name: &str) -> Result<i64, RepositoryError>;
}
