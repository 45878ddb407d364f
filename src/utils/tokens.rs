// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 计算 HMAC-SHA256 并返回十六进制字符串
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// 以常量时间比较十六进制签名
pub fn verify_hmac_sha256_hex(key: &[u8], message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// 签名令牌
///
/// 令牌格式为 `base64url(json) + "." + hex(hmac_sha256(secret, json))`，
/// 用于邮件打开/点击追踪与退订链接。
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    pub fn sign<T: Serialize>(&self, payload: &T) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(payload)?;
        let signature = hmac_sha256_hex(&self.secret, &json);
        Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(&json), signature))
    }

    /// 校验并解析令牌，签名不匹配或格式错误时返回 `None`
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        let (encoded, signature) = token.split_once('.')?;
        let json = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        if !verify_hmac_sha256_hex(&self.secret, &json, signature) {
            return None;
        }
        serde_json::from_slice(&json).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        m: String,
        u: Option<String>,
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = TokenSigner::new("secret");
        let payload = Payload {
            m: "abc".into(),
            u: Some("https://example.com/a?b=c".into()),
        };
        let token = signer.sign(&payload).unwrap();
        assert!(!token.contains('/'));
        assert_eq!(signer.verify::<Payload>(&token), Some(payload));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let signer = TokenSigner::new("secret");
        let token = signer
            .sign(&Payload {
                m: "abc".into(),
                u: None,
            })
            .unwrap();

        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"m":"xyz","u":null}"#);
        let signature = token.split_once('.').unwrap().1;
        let forged = format!("{}.{}", forged_payload, signature);
        assert!(signer.verify::<Payload>(&forged).is_none());

        let other = TokenSigner::new("other");
        assert!(other.verify::<Payload>(&token).is_none());
        assert!(signer.verify::<Payload>("garbage").is_none());
    }

    #[test]
    fn test_hmac_hex_verification() {
        let sig = hmac_sha256_hex(b"key", b"message");
        assert_eq!(sig.len(), 64);
        assert!(verify_hmac_sha256_hex(b"key", b"message", &sig));
        assert!(!verify_hmac_sha256_hex(b"key", b"other", &sig));
        assert!(!verify_hmac_sha256_hex(b"key", b"message", "zz"));
    }
}
