// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 为以字符串形式持久化的枚举生成 `as_str`、`Display` 与 `FromStr`
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 租户与用户（tenant）：多租户隔离、员工账号与门户账号
/// - 客户关系（crm）：客户、联系人、商机与历史记录
/// - 产品目录（catalog）：产品、套餐与折扣
/// - 报价与发票（quote / invoice）：价格明细、收付款与退款
/// - 总账（ledger）：科目表、会计期间与凭证
/// - 续约与工时（renewal）
/// - 工单（ticket）
/// - 营销外呼（outreach）
/// - 支付回调事件（payment_event）
pub mod catalog;
pub mod crm;
pub mod invoice;
pub mod ledger;
pub mod outreach;
pub mod payment_event;
pub mod pricing;
pub mod quote;
pub mod renewal;
pub mod tenant;
pub mod ticket;
