// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;

#[test]
fn test_builtin_defaults_deserialize() {
    let settings: Settings = Settings::builder()
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.auth.access_token_ttl_minutes, 60);
    assert_eq!(settings.auth.portal_token_ttl_minutes, 240);
    assert_eq!(settings.auth.max_failed_logins, 5);
    assert_eq!(settings.auth.lockout_minutes, 15);
    assert!(settings.ledger.auto_create_periods);
    assert_eq!(settings.email.provider, EmailProviderKind::Log);
    assert_eq!(settings.stripe.tolerance_secs, 300);
    assert!(settings.stripe.webhook_secret.is_none());
    assert_eq!(settings.outreach.batch_size, 50);
    assert!(settings.sendgrid.api_key.is_none());
    assert!(!settings.metrics.enabled);
}

#[test]
fn test_overrides_take_precedence() {
    let settings: Settings = Settings::builder()
        .unwrap()
        .set_override("email.provider", "mailgun")
        .unwrap()
        .set_override("mailgun.domain", "mg.example.com")
        .unwrap()
        .set_override("auth.bcrypt_cost", 4)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

    assert_eq!(settings.email.provider, EmailProviderKind::Mailgun);
    assert_eq!(settings.mailgun.domain.as_deref(), Some("mg.example.com"));

    let policy = AuthPolicy::from(&settings.auth);
    assert_eq!(policy.bcrypt_cost, 4);
    assert_eq!(policy.max_failed_logins, 5);
}
