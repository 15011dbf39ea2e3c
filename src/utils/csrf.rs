//! CSRF 令牌
//!
//! 令牌格式为 `{user_id}.{nonce}.{issued_at}.{signature}`，签名为 HMAC-SHA256。
//! 令牌与用户绑定，不在服务端保存状态。

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::config::AppConfig;
use crate::errors::{EvalSystemError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
const NONCE_LENGTH: usize = 16;

#[derive(Clone)]
pub struct CsrfSigner {
    secret: Vec<u8>,
    expiry: Duration,
}

impl CsrfSigner {
    pub fn new(secret: &[u8], expiry_minutes: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            expiry: Duration::minutes(expiry_minutes),
        }
    }

    /// 使用 JWT 密钥派生签名密钥
    pub fn from_config() -> Self {
        let config = AppConfig::get();
        let secret = format!("csrf:{}", config.jwt.secret);
        Self::new(secret.as_bytes(), config.csrf.token_expiry_minutes)
    }

    pub fn expiry_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }

    pub fn issue(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let mut rng = rand::rng();
        let nonce: Vec<u8> = (0..NONCE_LENGTH).map(|_| rng.random()).collect();
        let data = format!("{user_id}.{}.{}", BASE64.encode(&nonce), now.timestamp());
        let signature = self
            .sign(&data)
            .ok_or_else(|| EvalSystemError::validation("Invalid CSRF signing key"))?;
        Ok(format!("{data}.{signature}"))
    }

    /// 校验签名、所属用户与有效期
    pub fn verify(&self, token: &str, user_id: i64, now: DateTime<Utc>) -> bool {
        let parts: Vec<&str> = token.split('.').collect();
        let [owner, nonce, issued_at, provided] = parts.as_slice() else {
            return false;
        };

        let data = format!("{owner}.{nonce}.{issued_at}");
        let Some(expected) = self.sign(&data) else {
            return false;
        };
        if !constant_time_compare(&expected, provided) {
            return false;
        }

        if owner.parse::<i64>().ok() != Some(user_id) {
            return false;
        }

        match issued_at
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
        {
            Some(issued) => issued <= now && now <= issued + self.expiry,
            None => false,
        }
    }

    fn sign(&self, data: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(data.as_bytes());
        Some(BASE64.encode(mac.finalize().into_bytes()))
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> CsrfSigner {
        CsrfSigner::new(b"test-secret", 60)
    }

    #[test]
    fn test_issue_then_verify() {
        let now = Utc::now();
        let token = signer().issue(42, now).unwrap();
        assert_eq!(token.split('.').count(), 4);
        assert!(signer().verify(&token, 42, now));
    }

    #[test]
    fn test_token_bound_to_user() {
        let now = Utc::now();
        let token = signer().issue(42, now).unwrap();
        assert!(!signer().verify(&token, 43, now));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let token = signer().issue(42, now).unwrap();
        assert!(!signer().verify(&token, 42, now + Duration::minutes(61)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let now = Utc::now();
        let token = signer().issue(42, now).unwrap();
        let forged = token.replacen("42.", "1.", 1);
        assert!(!signer().verify(&forged, 1, now));
        assert!(!signer().verify("garbage", 42, now));

        let other = CsrfSigner::new(b"other-secret", 60);
        assert!(!other.verify(&token, 42, now));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
