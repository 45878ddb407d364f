// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构
/// 使用SeaORM框架进行对象关系映射，枚举字段以字符串存储
pub mod account;
pub mod accounting_period;
pub mod bundle;
pub mod campaign;
pub mod contact;
pub mod crm_event;
pub mod deal;
pub mod discount;
pub mod email_event;
pub mod email_message;
pub mod email_template;
pub mod enrollment;
pub mod invoice;
pub mod journal_entry;
pub mod journal_line;
pub mod ledger_account;
pub mod outreach_sequence;
pub mod payment;
pub mod payment_webhook_event;
pub mod portal_user;
pub mod product;
pub mod quote;
pub mod renewal;
pub mod sequence;
pub mod tenant;
pub mod ticket;
pub mod ticket_comment;
pub mod time_entry;
pub mod unsubscribe;
pub mod user;
