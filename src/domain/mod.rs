// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：核心业务实体、状态机与纯计算
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：领域服务和业务规则
/// - 错误（errors）：业务规则被违反时的错误类型
///
/// 领域层不依赖任何存储或 HTTP 实现。
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
