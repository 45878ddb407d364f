// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 包含各个API端点的具体处理逻辑
/// 每个处理器负责校验请求、检查权限、调用领域服务并返回统一信封
pub mod auth_handler;
pub mod billing_handler;
pub mod catalog_handler;
pub mod crm_handler;
pub mod ledger_handler;
pub mod outreach_handler;
pub mod portal_handler;
pub mod renewal_handler;
pub mod ticket_handler;
pub mod tracking_handler;
pub mod webhook_handler;
