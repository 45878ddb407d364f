// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::settings::OutreachSettings;
use crate::domain::errors::DomainError;
use crate::domain::services::outreach_service::{OutreachService, ProcessReport};

/// 外呼序列工作器
///
/// 按固定间隔拉取到期的入组记录并发送下一步邮件
pub struct OutreachWorker {
    service: Arc<OutreachService>,
    interval: Duration,
    batch_size: u64,
}

impl OutreachWorker {
    pub fn new(service: Arc<OutreachService>, settings: &OutreachSettings) -> Self {
        Self {
            service,
            interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            batch_size: settings.batch_size.max(1),
        }
    }

    /// 执行一轮处理
    pub async fn tick(&self) -> Result<ProcessReport, DomainError> {
        self.service.process_due(Utc::now(), self.batch_size).await
    }

    /// 运行工作器，直到收到停止信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Outreach worker started");

        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("Outreach worker stopping");
                    return;
                }
            }

            match self.tick().await {
                Ok(report) => {
                    if report.sent + report.completed + report.stopped + report.failed > 0 {
                        info!(
                            sent = report.sent,
                            completed = report.completed,
                            stopped = report.stopped,
                            failed = report.failed,
                            "Outreach batch processed"
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to process outreach batch: {}", e);
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }
}
