// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HS256 session JWT minting and verification.
//
// The operator session endpoint authenticates callers with a short-lived
// JWT signed with the shared secret from the provisioning file. The token
// layout is fixed by the backend: an HS256 header, then claims in the order
// nbf, exp, iat, iss, aud. Field order matters only for byte-identical
// fixtures; verifiers parse the JSON normally.
//
// On-device minting exists for the demo and the mock backend. Production
// integrations pass an externally issued token to `OperatorClient` instead.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use ring::hmac;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vipconnect_core::config::OperatorConfig;
use vipconnect_core::error::{Result, VipConnectError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Backdating applied to `nbf` to absorb clock skew between the device and
/// the operator backend.
const NOT_BEFORE_LEEWAY_SECS: i64 = 300;

/// Token lifetime from issue to `exp`.
const TOKEN_TTL_SECS: i64 = 1200;

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// JOSE header. Always `{"typ":"JWT","alg":"HS256"}`.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

/// Registered claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Not valid before (epoch seconds, backdated by the skew leeway).
    pub nbf: i64,
    /// Expiry (epoch seconds).
    pub exp: i64,
    /// Issued at (epoch seconds).
    pub iat: i64,
    /// Operator-assigned issuer identifier.
    pub iss: String,
    /// Target API audience.
    pub aud: String,
}

// ---------------------------------------------------------------------------
// TokenGenerator
// ---------------------------------------------------------------------------

/// Mints and verifies HS256 session tokens for one operator environment.
pub struct TokenGenerator {
    key: hmac::Key,
    issuer: String,
    audience: String,
}

impl TokenGenerator {
    /// Build a generator from an operator configuration.
    ///
    /// The configured secret is base64 (standard alphabet); the decoded
    /// bytes are the HMAC key.
    pub fn new(config: &OperatorConfig) -> Result<Self> {
        let secret = STANDARD.decode(&config.secret).map_err(|e| {
            VipConnectError::TokenGeneration(format!("shared secret is not valid base64: {e}"))
        })?;
        if secret.is_empty() {
            return Err(VipConnectError::TokenGeneration(
                "shared secret is empty".into(),
            ));
        }
        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, &secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Mint a token valid from five minutes ago until twenty minutes from
    /// now.
    pub fn generate(&self) -> Result<String> {
        self.generate_at(Utc::now().timestamp())
    }

    /// Mint a token with the validity window anchored at `now` (epoch
    /// seconds). Split out so tests can pin the clock.
    pub fn generate_at(&self, now: i64) -> Result<String> {
        let header = Header {
            typ: "JWT".into(),
            alg: "HS256".into(),
        };
        let claims = SessionClaims {
            nbf: now - NOT_BEFORE_LEEWAY_SECS,
            exp: now + TOKEN_TTL_SECS,
            iat: now,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let signature = hmac::sign(&self.key, signing_input.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature.as_ref());

        debug!(iss = %self.issuer, exp = claims.exp, "session token minted");
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a presented token's signature, validity window, and issuer/
    /// audience, returning its claims. Used by the mock backend.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Like [`verify`](Self::verify) with a pinned clock.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(VipConnectError::TokenVerification(
                "token is not three dot-separated segments".into(),
            ));
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| VipConnectError::TokenVerification(format!("signature base64: {e}")))?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        hmac::verify(&self.key, signing_input.as_bytes(), &signature)
            .map_err(|_| VipConnectError::TokenVerification("signature mismatch".into()))?;

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|e| VipConnectError::TokenVerification(format!("header base64: {e}")))?;
        let header: Header = serde_json::from_slice(&header_json)?;
        if header.alg != "HS256" {
            return Err(VipConnectError::TokenVerification(format!(
                "unexpected algorithm {}",
                header.alg
            )));
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|e| VipConnectError::TokenVerification(format!("claims base64: {e}")))?;
        let claims: SessionClaims = serde_json::from_slice(&claims_json)?;

        if now < claims.nbf {
            return Err(VipConnectError::TokenVerification(
                "token not yet valid".into(),
            ));
        }
        if now >= claims.exp {
            return Err(VipConnectError::TokenVerification("token expired".into()));
        }
        if claims.iss != self.issuer {
            return Err(VipConnectError::TokenVerification(format!(
                "unknown issuer {}",
                claims.iss
            )));
        }
        if claims.aud != self.audience {
            return Err(VipConnectError::TokenVerification(format!(
                "wrong audience {}",
                claims.aud
            )));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("TokenGenerator")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OperatorConfig {
        OperatorConfig {
            secret: STANDARD.encode(b"vip-connect-demo-secret"),
            issuer: "demo-operator".into(),
            audience: "vip-api-cert".into(),
            base_uri: "https://cert.example.io/sdk".into(),
            redirect_uri: "closevip://done".into(),
        }
    }

    fn generator() -> TokenGenerator {
        TokenGenerator::new(&config()).expect("generator")
    }

    #[test]
    fn rejects_non_base64_secret() {
        let mut bad = config();
        bad.secret = "not base64 !!!".into();
        assert!(matches!(
            TokenGenerator::new(&bad),
            Err(VipConnectError::TokenGeneration(_))
        ));
    }

    #[test]
    fn header_is_exactly_the_fixed_hs256_header() {
        let token = generator().generate_at(1_700_000_000).expect("token");
        let header_b64 = token.split('.').next().expect("header segment");
        let header = URL_SAFE_NO_PAD.decode(header_b64).expect("decode");
        assert_eq!(header, br#"{"typ":"JWT","alg":"HS256"}"#);
    }

    #[test]
    fn claims_window_is_anchored_at_now() {
        let now = 1_700_000_000;
        let token = generator().generate_at(now).expect("token");
        let claims_b64 = token.split('.').nth(1).expect("claims segment");
        let claims: SessionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(claims_b64).expect("decode"))
                .expect("claims parse");

        assert_eq!(claims.nbf, now - 300);
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 1200);
        assert_eq!(claims.iss, "demo-operator");
        assert_eq!(claims.aud, "vip-api-cert");
    }

    #[test]
    fn segments_are_url_safe_without_padding() {
        let token = generator().generate_at(1_700_000_000).expect("token");
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn generated_token_verifies() {
        let generator = generator();
        let now = 1_700_000_000;
        let token = generator.generate_at(now).expect("token");
        let claims = generator.verify_at(&token, now).expect("verify");
        assert_eq!(claims.iss, "demo-operator");
    }

    #[test]
    fn flipping_one_payload_byte_breaks_the_signature() {
        let generator = generator();
        let now = 1_700_000_000;
        let token = generator.generate_at(now).expect("token");

        // Swap a character inside the claims segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        let tampered: String = parts[1]
            .char_indices()
            .map(|(i, c)| if i == 4 { if c == 'A' { 'B' } else { 'A' } } else { c })
            .collect();
        assert_ne!(tampered, parts[1]);
        parts[1] = tampered;

        let result = generator.verify_at(&parts.join("."), now);
        assert!(matches!(
            result,
            Err(VipConnectError::TokenVerification(_))
        ));
    }

    #[test]
    fn expired_and_premature_tokens_are_rejected() {
        let generator = generator();
        let now = 1_700_000_000;
        let token = generator.generate_at(now).expect("token");

        assert!(generator.verify_at(&token, now + 1200).is_err());
        assert!(generator.verify_at(&token, now - 301).is_err());
        assert!(generator.verify_at(&token, now - 300).is_ok());
    }

    #[test]
    fn token_from_a_different_secret_is_rejected() {
        let mut other = config();
        other.secret = STANDARD.encode(b"some-other-operator");
        let foreign = TokenGenerator::new(&other).expect("generator");

        let now = 1_700_000_000;
        let token = foreign.generate_at(now).expect("token");
        assert!(generator().verify_at(&token, now).is_err());
    }
}
