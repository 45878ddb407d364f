// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::config::settings::{EmailProviderKind, Settings};
use crate::domain::services::email_service::{EmailProvider, SmsProvider};
use crate::domain::services::payment_webhook_service::PaypalVerifier;

/// 基础设施服务模块
///
/// 提供外部渠道的具体实现
/// 包括邮件渠道（SMTP、SendGrid、Mailgun、日志）、Twilio 短信与 PayPal 签名校验
pub mod log_provider;
pub mod mailgun;
pub mod paypal;
pub mod sendgrid;
pub mod smtp;
pub mod twilio;

/// 外部 API 调用统一使用的 HTTP 客户端
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

/// 按配置创建邮件渠道
pub fn email_provider(settings: &Settings) -> Result<Arc<dyn EmailProvider>> {
    let provider: Arc<dyn EmailProvider> = match settings.email.provider {
        EmailProviderKind::Log => Arc::new(log_provider::LogEmailProvider),
        EmailProviderKind::Smtp => Arc::new(smtp::SmtpEmailProvider::from_settings(&settings.smtp)?),
        EmailProviderKind::Sendgrid => {
            let api_key = settings
                .sendgrid
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("sendgrid.api_key is required"))?;
            Arc::new(sendgrid::SendgridProvider::new(
                api_key,
                settings.sendgrid.api_base.clone(),
            ))
        }
        EmailProviderKind::Mailgun => {
            let mailgun = &settings.mailgun;
            match (&mailgun.api_key, &mailgun.domain) {
                (Some(api_key), Some(domain)) => Arc::new(mailgun::MailgunProvider::new(
                    api_key.clone(),
                    domain.clone(),
                    mailgun.api_base.clone(),
                )),
                _ => return Err(anyhow!("mailgun.api_key and mailgun.domain are required")),
            }
        }
    };
    Ok(provider)
}

/// 配置完整时创建 Twilio 短信渠道
pub fn sms_provider(settings: &Settings) -> Option<Arc<dyn SmsProvider>> {
    let twilio = &settings.twilio;
    match (&twilio.account_sid, &twilio.auth_token, &twilio.from_number) {
        (Some(sid), Some(token), Some(from)) => Some(Arc::new(twilio::TwilioSmsProvider::new(
            sid.clone(),
            token.clone(),
            from.clone(),
            twilio.api_base.clone(),
        ))),
        _ => None,
    }
}

/// 配置完整时创建 PayPal 回调校验器
pub fn paypal_verifier(settings: &Settings) -> Option<Arc<dyn PaypalVerifier>> {
    let paypal = &settings.paypal;
    match (&paypal.client_id, &paypal.client_secret, &paypal.webhook_id) {
        (Some(client_id), Some(secret), Some(webhook_id)) => {
            Some(Arc::new(paypal::PaypalApiVerifier::new(
                client_id.clone(),
                secret.clone(),
                webhook_id.clone(),
                paypal.api_base.clone(),
            )))
        }
        _ => None,
    }
}
