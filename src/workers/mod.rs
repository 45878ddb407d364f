// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理，目前包括外呼序列的定时推进
pub mod outreach_worker;

pub use outreach_worker::OutreachWorker;
