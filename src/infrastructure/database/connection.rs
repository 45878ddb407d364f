// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::settings::DatabaseSettings;

/// 连接的最长存活时间
const MAX_LIFETIME: Duration = Duration::from_secs(3600);
/// 内存 SQLite 的连接一旦关闭数据即丢失，实际上不回收
const MEMORY_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// 数据库类型，由连接 URL 的 scheme 决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
    /// 内存 SQLite，每个连接各自一份数据，只能使用单连接
    SqliteMemory,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, DbErr> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            if url.contains(":memory:") || url.contains("mode=memory") {
                Ok(Backend::SqliteMemory)
            } else {
                Ok(Backend::Sqlite)
            }
        } else {
            Err(DbErr::Custom(format!(
                "unsupported database url scheme: {}",
                url.split(':').next().unwrap_or_default()
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
            Backend::SqliteMemory => "sqlite-memory",
        }
    }
}

/// 由配置生成连接池参数
///
/// 最小连接数不超过最大连接数；内存 SQLite 固定为单连接且不回收连接。
pub fn pool_options(settings: &DatabaseSettings, backend: Backend) -> ConnectOptions {
    let mut opt = ConnectOptions::new(settings.url.to_owned());

    let (max, min) = match backend {
        Backend::SqliteMemory => (Some(1), Some(1)),
        _ => {
            let max = settings.max_connections.map(|m| m.max(1));
            let min = match (settings.min_connections, max) {
                (Some(min), Some(max)) => Some(min.min(max)),
                (min, _) => min,
            };
            (max, min)
        }
    };
    if let Some(max) = max {
        opt.max_connections(max);
    }
    if let Some(min) = min {
        opt.min_connections(min);
    }

    if let Some(timeout) = settings.connect_timeout {
        opt.connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout));
    }
    if backend == Backend::SqliteMemory {
        opt.max_lifetime(MEMORY_LIFETIME).idle_timeout(MEMORY_LIFETIME);
    } else {
        if let Some(idle) = settings.idle_timeout {
            opt.idle_timeout(Duration::from_secs(idle));
        }
        opt.max_lifetime(MAX_LIFETIME);
    }

    opt.sqlx_logging(settings.sqlx_logging);
    opt
}

/// 创建数据库连接池
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let backend = Backend::from_url(&settings.url)?;
    let db = Database::connect(pool_options(settings, backend)).await?;
    info!(backend = backend.as_str(), "Database connected");
    Ok(db)
}

/// 创建连接并执行全部迁移
pub async fn connect_and_migrate(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let db = create_pool(settings).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str, max: Option<u32>, min: Option<u32>) -> DatabaseSettings {
        DatabaseSettings {
            url: url.to_string(),
            max_connections: max,
            min_connections: min,
            connect_timeout: Some(5),
            idle_timeout: Some(300),
            sqlx_logging: false,
        }
    }

    #[test]
    fn test_backend_from_url() {
        assert_eq!(
            Backend::from_url("postgres://boaz@localhost/boaz").unwrap(),
            Backend::Postgres
        );
        assert_eq!(
            Backend::from_url("sqlite://boaz.db?mode=rwc").unwrap(),
            Backend::Sqlite
        );
        assert_eq!(
            Backend::from_url("sqlite::memory:").unwrap(),
            Backend::SqliteMemory
        );
        assert!(Backend::from_url("mysql://localhost/boaz").is_err());
    }

    #[test]
    fn test_min_connections_capped_by_max() {
        let opt = pool_options(
            &settings("postgres://localhost/boaz", Some(4), Some(10)),
            Backend::Postgres,
        );
        assert_eq!(opt.get_max_connections(), Some(4));
        assert_eq!(opt.get_min_connections(), Some(4));
        assert_eq!(opt.get_connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(opt.get_idle_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_memory_sqlite_uses_single_connection() {
        let url = "sqlite::memory:";
        let opt = pool_options(&settings(url, Some(20), Some(2)), Backend::from_url(url).unwrap());
        assert_eq!(opt.get_max_connections(), Some(1));
        assert_eq!(opt.get_min_connections(), Some(1));
        assert_eq!(opt.get_idle_timeout(), Some(MEMORY_LIFETIME));
    }
}
