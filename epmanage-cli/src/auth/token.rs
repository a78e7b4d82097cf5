//! Decoding and validation of backend-issued JWTs.

use chrono::{DateTime, Utc};
use epmanage_shared::privilege::{MFA_AUDIENCE, PRIVILEGE_PREFIX};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Printed when tokens are accepted without signature verification.
pub const UNVERIFIED_SIGNATURE_NOTICE: &str = "token signatures are not verified: tokens are trusted \
because they are only obtained from this tool's own login exchange with the configured backend";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default, deserialize_with = "audience")]
    pub aud: Vec<String>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp?, 0)
    }

    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }
}

/// `aud` is either a single string or a list.
fn audience<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Audience>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Audience::One(aud)) => vec![aud],
        Some(Audience::Many(aud)) => aud,
    })
}

#[derive(Clone)]
pub enum SignatureCheck {
    /// The signature is not checked. Tokens come from the login exchange
    /// with the configured backend, so the TLS connection authenticates the
    /// issuer; a token file written by anything else is taken at face value.
    Disabled,
    Rsa {
        key: DecodingKey,
        algorithm: Algorithm,
    },
}

impl std::fmt::Debug for SignatureCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureCheck::Disabled => f.write_str("Disabled"),
            SignatureCheck::Rsa { algorithm, .. } => {
                f.debug_struct("Rsa").field("algorithm", algorithm).finish()
            }
        }
    }
}

/// Which checks `decode_and_validate` applies.
#[derive(Debug, Clone)]
pub struct TokenValidation {
    pub signature: SignatureCheck,
    pub require_iat: bool,
    pub require_nbf: bool,
    pub require_exp: bool,
    pub verify_iat: bool,
    pub verify_nbf: bool,
    pub verify_exp: bool,
    pub leeway_secs: u64,
}

impl Default for TokenValidation {
    /// All temporal claims required and checked; signature NOT verified
    /// (see [`UNVERIFIED_SIGNATURE_NOTICE`]).
    fn default() -> Self {
        Self {
            signature: SignatureCheck::Disabled,
            require_iat: true,
            require_nbf: true,
            require_exp: true,
            verify_iat: true,
            verify_nbf: true,
            verify_exp: true,
            leeway_secs: 0,
        }
    }
}

impl TokenValidation {
    /// Verify RS512 signatures against a PEM encoded public key.
    pub fn with_rsa_public_key(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            signature: SignatureCheck::Rsa {
                key: DecodingKey::from_rsa_pem(pem)?,
                algorithm: Algorithm::RS512,
            },
            ..Self::default()
        })
    }

    pub fn is_signature_verified(&self) -> bool {
        matches!(self.signature, SignatureCheck::Rsa { .. })
    }

    fn jwt_validation(&self) -> (Validation, DecodingKey) {
        let (mut validation, key) = match &self.signature {
            SignatureCheck::Disabled => {
                let mut v = Validation::new(Algorithm::RS512);
                v.insecure_disable_signature_validation();
                (v, DecodingKey::from_secret(&[]))
            }
            SignatureCheck::Rsa { key, algorithm } => (Validation::new(*algorithm), key.clone()),
        };

        let mut required = Vec::new();
        if self.require_exp {
            required.push("exp");
        }
        if self.require_nbf {
            required.push("nbf");
        }
        validation.set_required_spec_claims(&required);
        validation.validate_exp = self.verify_exp;
        validation.validate_nbf = self.verify_nbf;
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;
        (validation, key)
    }
}

/// Decode `token` and check its claims. Any failure yields `None`.
pub fn decode_and_validate(token: &str, validation: &TokenValidation) -> Option<Claims> {
    let (jwt_validation, key) = validation.jwt_validation();
    let claims = match decode::<Claims>(token.trim(), &key, &jwt_validation) {
        Ok(data) => data.claims,
        Err(e) => {
            debug!(error = %e, "token rejected");
            return None;
        }
    };

    match claims.iat {
        None if validation.require_iat => {
            debug!("token rejected: missing iat");
            None
        }
        Some(iat) if validation.verify_iat && iat > Utc::now().timestamp() + validation.leeway_secs as i64 => {
            debug!(iat, "token rejected: issued in the future");
            None
        }
        _ => Some(claims),
    }
}

/// True while the token only grants the second-factor exchange.
pub fn requires_mfa(claims: &Claims) -> bool {
    claims.aud.iter().any(|aud| aud == MFA_AUDIENCE)
}

pub fn privileges_of(claims: &Claims) -> Vec<String> {
    claims
        .aud
        .iter()
        .filter_map(|aud| aud.strip_prefix(PRIVILEGE_PREFIX))
        .map(str::to_string)
        .collect()
}
