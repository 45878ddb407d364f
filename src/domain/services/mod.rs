// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了
/// 业务规则并协调多个仓库完成业务操作。
///
/// 包含的服务：
/// - 总账（ledger_service、auto_posting）：凭证校验、期间、幂等过账与报表
/// - 发票（invoice_service）：开票、收款退款与余额核对
/// - 报价、续约、工时（quote_service、renewal_service、time_entry_service）
/// - 客户关系与目录（crm_service、catalog_service）
/// - 工单（ticket_service）
/// - 营销触达（delivery_service、outreach_service、campaign_service、tracking_service）
/// - 支付回调对账（payment_webhook_service）
/// - 认证（auth_service）
pub mod auth_service;
pub mod auto_posting;
pub mod campaign_service;
pub mod catalog_service;
pub mod crm_service;
pub mod delivery_service;
pub mod email_composer;
pub mod email_service;
pub mod invoice_service;
pub mod ledger_service;
pub mod outreach_service;
pub mod payment_webhook_service;
pub mod quote_service;
pub mod renewal_service;
pub mod ticket_service;
pub mod time_entry_service;
pub mod tracking_service;
