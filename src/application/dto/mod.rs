// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求与响应数据传输对象
pub mod auth;
pub mod billing;
pub mod catalog;
pub mod crm;
pub mod ledger;
pub mod outreach;
pub mod support;
