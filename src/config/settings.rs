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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::services::auth_service::AuthPolicy;

/// 应用程序配置设置
///
/// 包含服务器、数据库、认证、总账、邮件与短信渠道、支付回调、外呼与指标等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 认证配置
    pub auth: AuthSettings,
    /// 总账配置
    pub ledger: LedgerSettings,
    /// 邮件配置
    pub email: EmailSettings,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub sendgrid: SendgridSettings,
    #[serde(default)]
    pub mailgun: MailgunSettings,
    #[serde(default)]
    pub twilio: TwilioSettings,
    /// Stripe 回调配置
    pub stripe: StripeSettings,
    #[serde(default)]
    pub paypal: PaypalSettings,
    /// 外呼序列配置
    pub outreach: OutreachSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 对外访问地址，用于生成追踪与退订链接
    pub public_base_url: String,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否输出SQL日志
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// 认证配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// JWT 签名密钥
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub portal_token_ttl_minutes: i64,
    /// 连续登录失败达到该次数后锁定
    pub max_failed_logins: i32,
    pub lockout_minutes: i64,
    pub bcrypt_cost: u32,
}

impl From<&AuthSettings> for AuthPolicy {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            access_token_ttl_minutes: settings.access_token_ttl_minutes,
            portal_token_ttl_minutes: settings.portal_token_ttl_minutes,
            max_failed_logins: settings.max_failed_logins,
            lockout_minutes: settings.lockout_minutes,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }
}

/// 总账配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    /// 过账日期没有会计期间时自动按自然月创建
    pub auto_create_periods: bool,
}

/// 邮件渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// 仅写日志，不实际发送
    Log,
    Smtp,
    Sendgrid,
    Mailgun,
}

/// 邮件配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    pub provider: EmailProviderKind,
    pub from_address: String,
    pub from_name: String,
    /// 追踪与退订令牌的签名密钥
    pub tracking_secret: String,
}

/// SMTP 配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 是否使用 STARTTLS
    #[serde(default)]
    pub starttls: bool,
}

/// SendGrid 配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendgridSettings {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// 事件回调的共享令牌，未配置时不校验
    pub webhook_token: Option<String>,
}

/// Mailgun 配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailgunSettings {
    pub api_key: Option<String>,
    pub domain: Option<String>,
    pub api_base: Option<String>,
    /// 事件回调的签名密钥
    pub signing_key: Option<String>,
}

/// Twilio 配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioSettings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: Option<String>,
}

/// Stripe 回调配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSettings {
    pub webhook_secret: Option<String>,
    /// 签名时间戳允许的偏差（秒）
    pub tolerance_secs: i64,
}

/// PayPal 配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaypalSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_id: Option<String>,
    pub api_base: Option<String>,
}

/// 外呼序列配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutreachSettings {
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 每轮处理的入组数
    pub batch_size: u64,
    /// 发送失败后的重试间隔（秒）
    pub retry_delay_secs: u64,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    /// Prometheus 导出监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `BOAZ__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BOAZ").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 内置默认值
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.public_base_url", "http://localhost:3000")?
            // Default DB pool settings
            .set_default("database.url", "sqlite://boaz.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("auth.jwt_secret", "change-me")?
            .set_default("auth.access_token_ttl_minutes", 60)?
            .set_default("auth.portal_token_ttl_minutes", 240)?
            .set_default("auth.max_failed_logins", 5)?
            .set_default("auth.lockout_minutes", 15)?
            .set_default("auth.bcrypt_cost", 12)?
            .set_default("ledger.auto_create_periods", true)?
            .set_default("email.provider", "log")?
            .set_default("email.from_address", "no-reply@example.com")?
            .set_default("email.from_name", "BOAZ-OS")?
            .set_default("email.tracking_secret", "change-me")?
            .set_default("stripe.tolerance_secs", 300)?
            .set_default("outreach.poll_interval_secs", 60)?
            .set_default("outreach.batch_size", 50)?
            .set_default("outreach.retry_delay_secs", 900)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9090")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
