// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use boaz_os::domain::services::email_service::{
    EmailProvider, OutgoingEmail, OutgoingSms, ProviderError, SmsProvider,
};
use boaz_os::domain::services::payment_webhook_service::{PaypalHeaders, PaypalVerifier};
use boaz_os::infrastructure::services::mailgun::MailgunProvider;
use boaz_os::infrastructure::services::paypal::PaypalApiVerifier;
use boaz_os::infrastructure::services::sendgrid::SendgridProvider;
use boaz_os::infrastructure::services::twilio::TwilioSmsProvider;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn email() -> OutgoingEmail {
    let mut metadata = BTreeMap::new();
    metadata.insert("message_id".to_string(), "6f1c2d1e-0000-4000-8000-000000000001".to_string());
    OutgoingEmail {
        to: "ann@example.com".into(),
        to_name: Some("Ann".into()),
        from: "news@boaz.test".into(),
        from_name: Some("Boaz".into()),
        subject: "Welcome".into(),
        html: "<p>Hello Ann</p>".into(),
        metadata,
    }
}

fn paypal_headers() -> PaypalHeaders {
    PaypalHeaders {
        transmission_id: "tx-1".into(),
        transmission_time: "2026-01-01T00:00:00Z".into(),
        transmission_sig: "sig".into(),
        cert_url: "https://api.paypal.com/cert".into(),
        auth_algo: "SHA256withRSA".into(),
    }
}

#[tokio::test]
async fn test_sendgrid_returns_message_id_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.test"))
        .and(body_string_contains("custom_args"))
        .respond_with(ResponseTemplate::new(202).insert_header("x-message-id", "sg-abc123"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SendgridProvider::new("SG.test".into(), Some(server.uri()));
    let receipt = provider.send(&email()).await.unwrap();
    assert_eq!(receipt.provider_message_id.as_deref(), Some("sg-abc123"));
}

#[tokio::test]
async fn test_sendgrid_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider = SendgridProvider::new("SG.wrong".into(), Some(server.uri()));
    match provider.send(&email()).await {
        Err(ProviderError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_mailgun_strips_angle_brackets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mg.boaz.test/messages"))
        .and(header_exists("authorization"))
        .and(body_string_contains("v%3Amessage_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "<20260101.1@mg.boaz.test>",
            "message": "Queued. Thank you."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = MailgunProvider::new("key-1".into(), "mg.boaz.test".into(), Some(server.uri()));
    let receipt = provider.send(&email()).await.unwrap();
    assert_eq!(
        receipt.provider_message_id.as_deref(),
        Some("20260101.1@mg.boaz.test")
    );
}

#[tokio::test]
async fn test_twilio_returns_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(body_string_contains("Body=Hello"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM42" })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TwilioSmsProvider::new(
        "AC123".into(),
        "token".into(),
        "+15550001111".into(),
        Some(server.uri()),
    );
    let sms = OutgoingSms {
        to: "+15552223333".into(),
        body: "Hello".into(),
    };
    let receipt = provider.send(&sms).await.unwrap();
    assert_eq!(receipt.provider_message_id.as_deref(), Some("SM42"));

    let empty = OutgoingSms {
        to: " ".into(),
        body: "Hello".into(),
    };
    assert!(matches!(
        provider.send(&empty).await,
        Err(ProviderError::InvalidMessage(_))
    ));
}

#[tokio::test]
async fn test_twilio_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid To number"))
        .mount(&server)
        .await;

    let provider = TwilioSmsProvider::new("AC1".into(), "t".into(), "+1".into(), Some(server.uri()));
    let sms = OutgoingSms {
        to: "+0".into(),
        body: "x".into(),
    };
    assert!(matches!(
        provider.send(&sms).await,
        Err(ProviderError::Rejected { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_paypal_verifier_caches_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A21AA",
            "token_type": "Bearer",
            "expires_in": 32400
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/notifications/verify-webhook-signature"))
        .and(header("authorization", "Bearer A21AA"))
        .and(body_string_contains("\"webhook_id\":\"WH-1\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "verification_status": "SUCCESS" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let verifier = PaypalApiVerifier::new(
        "client".into(),
        "secret".into(),
        "WH-1".into(),
        Some(server.uri()),
    );
    let event = json!({ "id": "WH-EVT-1", "event_type": "PAYMENT.CAPTURE.COMPLETED" });
    assert!(verifier.verify(&paypal_headers(), &event).await.unwrap());
    assert!(verifier.verify(&paypal_headers(), &event).await.unwrap());
}

#[tokio::test]
async fn test_paypal_verifier_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A21AA",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/notifications/verify-webhook-signature"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "verification_status": "FAILURE" })),
        )
        .mount(&server)
        .await;

    let verifier = PaypalApiVerifier::new("c".into(), "s".into(), "WH-1".into(), Some(server.uri()));
    let event = json!({ "id": "WH-EVT-2" });
    assert!(!verifier.verify(&paypal_headers(), &event).await.unwrap());
}

#[tokio::test]
async fn test_paypal_oauth_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let verifier = PaypalApiVerifier::new("c".into(), "s".into(), "WH-1".into(), Some(server.uri()));
    let result = verifier.verify(&paypal_headers(), &json!({})).await;
    assert!(matches!(result, Err(ProviderError::Rejected { status: 401, .. })));
}
