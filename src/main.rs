// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use boaz_os::config::settings::Settings;
use boaz_os::infrastructure::database::connection;
use boaz_os::infrastructure::services;
use boaz_os::presentation::routes;
use boaz_os::presentation::state::{AppState, Providers};
use boaz_os::utils::telemetry;
use boaz_os::workers::OutreachWorker;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting boaz-os...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    boaz_os::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database and run migrations
    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database ready");

    // 4. Delivery and payment providers
    let providers = Providers {
        email: services::email_provider(&settings)?,
        sms: services::sms_provider(&settings),
        paypal: services::paypal_verifier(&settings),
    };
    info!(email = providers.email.name(), "Providers configured");

    let state = AppState::new(db, settings.clone(), providers);

    // 5. Start workers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = OutreachWorker::new(state.outreach.clone(), &settings.outreach).start(shutdown_rx);

    // 6. Start HTTP server
    let app = routes::routes(state);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = worker.await;
    Ok(())
}
