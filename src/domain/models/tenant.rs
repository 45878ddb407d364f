// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 租户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// 员工角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Sales,
    Support,
    Accountant,
    Viewer,
}

string_enum!(Role {
    Admin => "admin",
    Manager => "manager",
    Sales => "sales",
    Support => "support",
    Accountant => "accountant",
    Viewer => "viewer",
});

/// 权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "crm:read")]
    CrmRead,
    #[serde(rename = "crm:write")]
    CrmWrite,
    #[serde(rename = "billing:read")]
    BillingRead,
    #[serde(rename = "billing:write")]
    BillingWrite,
    #[serde(rename = "ledger:read")]
    LedgerRead,
    #[serde(rename = "ledger:post")]
    LedgerPost,
    #[serde(rename = "ledger:admin")]
    LedgerAdmin,
    #[serde(rename = "support:read")]
    SupportRead,
    #[serde(rename = "support:write")]
    SupportWrite,
    #[serde(rename = "marketing:write")]
    MarketingWrite,
    #[serde(rename = "users:admin")]
    UsersAdmin,
}

string_enum!(Permission {
    CrmRead => "crm:read",
    CrmWrite => "crm:write",
    BillingRead => "billing:read",
    BillingWrite => "billing:write",
    LedgerRead => "ledger:read",
    LedgerPost => "ledger:post",
    LedgerAdmin => "ledger:admin",
    SupportRead => "support:read",
    SupportWrite => "support:write",
    MarketingWrite => "marketing:write",
    UsersAdmin => "users:admin",
});

impl Role {
    /// 角色对应的权限集合
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[
                CrmRead,
                CrmWrite,
                BillingRead,
                BillingWrite,
                LedgerRead,
                LedgerPost,
                LedgerAdmin,
                SupportRead,
                SupportWrite,
                MarketingWrite,
                UsersAdmin,
            ],
            Role::Manager => &[
                CrmRead,
                CrmWrite,
                BillingRead,
                BillingWrite,
                LedgerRead,
                LedgerPost,
                LedgerAdmin,
                SupportRead,
                SupportWrite,
                MarketingWrite,
            ],
            Role::Sales => &[CrmRead, CrmWrite, BillingRead, MarketingWrite],
            Role::Support => &[CrmRead, SupportRead, SupportWrite],
            Role::Accountant => &[
                CrmRead,
                BillingRead,
                BillingWrite,
                LedgerRead,
                LedgerPost,
                LedgerAdmin,
            ],
            Role::Viewer => &[CrmRead, BillingRead, LedgerRead, SupportRead],
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// 员工账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(tenant_id: Uuid, email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            email: normalize_email(email),
            password_hash,
            role,
            active: true,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 账号当前是否处于锁定状态
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// 客户门户账号，绑定到单个客户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl PortalUser {
    pub fn new(tenant_id: Uuid, account_id: Uuid, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            account_id,
            email: normalize_email(email),
            password_hash,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// 邮箱统一转为小写并去除首尾空白
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_permission_matrix() {
        assert!(Role::Admin.allows(Permission::UsersAdmin));
        assert!(!Role::Manager.allows(Permission::UsersAdmin));
        assert!(Role::Accountant.allows(Permission::LedgerAdmin));
        assert!(!Role::Sales.allows(Permission::LedgerRead));
        assert!(Role::Support.allows(Permission::SupportWrite));
        assert!(!Role::Viewer.allows(Permission::CrmWrite));
        assert!(Role::Viewer.allows(Permission::LedgerRead));
    }

    #[test]
    fn test_role_string_round_trip() {
        assert_eq!("accountant".parse::<Role>(), Ok(Role::Accountant));
        assert_eq!(Role::Support.to_string(), "support");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_lock_state() {
        let mut user = User::new(Uuid::new_v4(), " Ann@Example.COM ", "hash".into(), Role::Sales);
        assert_eq!(user.email, "ann@example.com");

        let now = Utc::now();
        assert!(!user.is_locked(now));

        user.locked_until = Some(now + Duration::minutes(5));
        assert!(user.is_locked(now));
        assert!(!user.is_locked(now + Duration::minutes(6)));
    }
}
