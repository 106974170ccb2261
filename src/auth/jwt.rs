use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token. The subject is the account email;
/// it is the only claim downstream code reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("expired token")]
    Expired,
    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Stateless HS256 token codec. Owns the signing secret; constructed once
/// at startup from configuration and shared behind the app state.
///
/// Expiry is checked here against the caller's clock rather than by the
/// JWT library so that a token is rejected the moment its expiry is
/// reached, with no leeway, and so the check is deterministic in tests.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `subject`, valid from `now` until `now + ttl`.
    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify structure, signature and expiry of `raw`, returning the
    /// subject it was issued for. A token is valid only while its expiry
    /// is strictly in the future.
    pub fn decode(&self, raw: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<Claims>(raw, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_with_secret(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, Duration::hours(24))
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let codec = codec_with_secret("test-secret-key-12345");
        let now = Utc::now();

        let token = codec.issue("yoga@studio.com", now).unwrap();
        assert!(!token.is_empty());

        let subject = codec.decode(&token, now).unwrap();
        assert_eq!(subject, "yoga@studio.com");
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let codec = codec_with_secret("test-secret-key-12345");

        let result = codec.decode("not.a.token", Utc::now());
        assert_eq!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_different_secrets_reject_as_invalid_signature() {
        let codec1 = codec_with_secret("secret1");
        let codec2 = codec_with_secret("secret2");
        let now = Utc::now();

        let token = codec1.issue("yoga@studio.com", now).unwrap();

        // Wrong key is always a signature failure, even once expired
        let result = codec2.decode(&token, now + Duration::hours(48));
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec_with_secret("test-secret-key-12345");
        let t0 = Utc::now();

        let token = codec.issue("u1@studio.com", t0).unwrap();

        // One second before expiry: still valid
        let just_before = t0 + Duration::hours(24) - Duration::seconds(1);
        assert_eq!(codec.decode(&token, just_before).unwrap(), "u1@studio.com");

        // At and past expiry: rejected
        let at_expiry = t0 + Duration::hours(24);
        assert_eq!(codec.decode(&token, at_expiry), Err(TokenError::Expired));

        let just_after = t0 + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(codec.decode(&token, just_after), Err(TokenError::Expired));
    }

    #[test]
    fn test_subject_survives_unchanged() {
        let codec = codec_with_secret("test-secret-key-12345");
        let now = Utc::now();

        for subject in ["a@b.co", "UPPER@CASE.COM", "weird+tag@example.org"] {
            let token = codec.issue(subject, now).unwrap();
            assert_eq!(codec.decode(&token, now).unwrap(), subject);
        }
    }
}
