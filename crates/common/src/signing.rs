//! HMAC signing authority for the shared token contract.
//!
//! Holds the deployment-wide symmetric signing material and performs the
//! structural and cryptographic half of validation. Expiry, kind and
//! revocation checks belong to [`crate::validator`]; keeping them out of
//! this layer is what lets the validator report a deterministic first
//! failure.
//!
//! # Security
//!
//! - The algorithm is pinned to HS256. A token whose header claims any
//!   other algorithm, including `none`, is rejected before signature
//!   verification is attempted.
//! - Oversized input is rejected before any decoding work, bounding the
//!   cost of hostile tokens.
//! - Rejection details are logged under the `common.signing` target and
//!   never surface to callers beyond the coarse error variant.

use crate::claims::Claims;
use crate::error::{SigningError, ValidationError};
use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

// ===== Constants =====

/// Maximum accepted token size in bytes, checked before any decoding.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Minimum length of the shared signing secret in bytes.
///
/// HS256 keys shorter than the hash output weaken the MAC; configuration
/// loading rejects anything below this.
pub const MIN_SECRET_LEN: usize = 32;

/// Development-only default signing secret, shared by every service so a
/// bare `cargo run` of the platform interoperates on a laptop.
///
/// Configuration loading reports when it is active and startup logs a
/// loud warning. Production deployments must always set
/// `AUTH_SIGNING_SECRET`.
pub const DEV_SIGNING_SECRET: &str = "mySecretKey123456789012345678901234567890";

// ===== Signing authority =====

/// Signs and verifies tokens with the deployment-wide symmetric secret.
///
/// Cheap to clone; both keys are derived once at construction.
#[derive(Clone)]
pub struct SigningAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningAuthority {
    /// Build an authority from the shared secret.
    ///
    /// The secret's length is enforced at configuration time, before it
    /// reaches this constructor.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Sign `claims` into a compact token string.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the encoder rejects the payload.
    pub fn sign(&self, claims: &Claims) -> Result<String, SigningError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(SigningError::from)
    }

    /// Verify structure and signature, returning the embedded claims.
    ///
    /// Expiry is deliberately not checked here; the validator owns the
    /// ordered lifecycle checks and this function must keep returning the
    /// claims of an expired token (logout needs them to compute the
    /// remaining lifetime).
    ///
    /// # Errors
    ///
    /// [`ValidationError::Malformed`] for structural problems and
    /// [`ValidationError::SignatureMismatch`] when the signature does not
    /// verify against the shared secret.
    pub fn verify(&self, token: &str) -> Result<Claims, ValidationError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "common.signing",
                size = token.len(),
                max = MAX_TOKEN_SIZE_BYTES,
                "Rejecting oversized token"
            );
            return Err(ValidationError::Malformed);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Lifecycle checks happen in the validator, not here.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                let mapped = match e.kind() {
                    ErrorKind::InvalidSignature => ValidationError::SignatureMismatch,
                    _ => ValidationError::Malformed,
                };
                tracing::debug!(
                    target: "common.signing",
                    error = %e,
                    "Token failed structural or signature verification"
                );
                Err(mapped)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::claims::TokenKind;
    use crate::types::{Identity, SubjectId};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn authority() -> SigningAuthority {
        SigningAuthority::new(&SecretString::from(
            "unit-test-signing-secret-0123456789abcdef",
        ))
    }

    fn claims(kind: TokenKind) -> Claims {
        let identity = Identity::new(SubjectId(7), "dave");
        Claims::new(&identity, kind, 1_700_000_000, 1_700_007_200)
    }

    // ---------- sign / verify round trip ----------

    #[test]
    fn test_round_trip_preserves_claims() {
        let authority = authority();
        let original = claims(TokenKind::Access);
        let token = authority.sign(&original).unwrap();
        let decoded = authority.verify(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_expired_claims_still_verify_at_this_layer() {
        // exp far in the past; structural verification must not care.
        let authority = authority();
        let identity = Identity::new(SubjectId(7), "dave");
        let stale = Claims::new(&identity, TokenKind::Access, 1_000, 2_000);
        let token = authority.sign(&stale).unwrap();
        assert_eq!(authority.verify(&token).unwrap(), stale);
    }

    // ---------- structural rejections ----------

    #[test]
    fn test_garbage_input_is_malformed() {
        assert_eq!(
            authority().verify("definitely-not-a-token"),
            Err(ValidationError::Malformed)
        );
    }

    #[test]
    fn test_two_segment_input_is_malformed() {
        assert_eq!(
            authority().verify("aGVhZGVy.cGF5bG9hZA"),
            Err(ValidationError::Malformed)
        );
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert_eq!(authority().verify(""), Err(ValidationError::Malformed));
    }

    #[test]
    fn test_token_at_size_limit_is_processed_but_over_limit_is_rejected() {
        let authority = authority();
        // At the limit: still parsed (and then rejected as garbage).
        let at_limit = "x".repeat(MAX_TOKEN_SIZE_BYTES);
        assert_eq!(authority.verify(&at_limit), Err(ValidationError::Malformed));
        // One past the limit: rejected by the size gate.
        let over_limit = "x".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert_eq!(
            authority.verify(&over_limit),
            Err(ValidationError::Malformed)
        );
    }

    #[test]
    fn test_unexpected_algorithm_is_malformed() {
        // Same secret, wrong algorithm: the pinned-HS256 check fires before
        // any signature comparison.
        let secret = SecretString::from("unit-test-signing-secret-0123456789abcdef");
        let authority = SigningAuthority::new(&secret);
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims(TokenKind::Access),
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();
        assert_eq!(authority.verify(&hs512), Err(ValidationError::Malformed));
    }

    #[test]
    fn test_alg_none_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(TokenKind::Access)).unwrap());
        let unsigned = format!("{header}.{payload}.");
        assert_eq!(
            authority().verify(&unsigned),
            Err(ValidationError::Malformed)
        );
    }

    // ---------- signature rejections ----------

    #[test]
    fn test_foreign_secret_is_signature_mismatch() {
        let ours = authority();
        let theirs = SigningAuthority::new(&SecretString::from(
            "a-completely-different-secret-0123456789",
        ));
        let token = theirs.sign(&claims(TokenKind::Access)).unwrap();
        assert_eq!(
            ours.verify(&token),
            Err(ValidationError::SignatureMismatch)
        );
    }

    #[test]
    fn test_truncated_signature_is_rejected() {
        let authority = authority();
        let token = authority.sign(&claims(TokenKind::Refresh)).unwrap();
        let truncated = &token[..token.len() - 4];
        assert!(authority.verify(truncated).is_err());
    }
}
