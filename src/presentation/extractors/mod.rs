// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求提取器模块
///
/// 从认证中间件写入的令牌载荷中提取当前员工或门户用户
pub mod auth_user;
