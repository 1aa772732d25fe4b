use jsonwebtoken::{
    decode, encode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::AuthError,
    types::{Claims, Token, UserID, UserIdentity, Username},
};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs a [`UserIdentity`] into a [`Token`].
///
/// Tokens carry no expiry. A token stays valid for as long as the secret does.
#[derive(Clone)]
pub struct TokenIssuer {
    header: Header,
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            header: Header::new(ALGORITHM),
            key: EncodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, identity: &UserIdentity) -> Result<Token, AuthError> {
        let claims = Claims {
            sub: identity.id.0,
            username: identity.username.0.clone(),
            iat: get_current_timestamp(),
        };

        let token = encode(&self.header, &claims, &self.key)
            .map_err(|source| AuthError::TokenIssueFailed { source })?;

        Ok(Token(token))
    }
}

// Lenient view of the payload, so absent or mistyped claims can be told apart from a
// garbled envelope.
#[derive(Deserialize)]
struct SignedPayload {
    sub: Option<Value>,
    username: Option<Value>,
}

/// Checks a token's signature and recovers the identity inside it.
///
/// The identity comes from the claims alone; the directory is not consulted again.
/// `exp` is never required, but a token that does carry one is refused once it has passed.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let payload = decode::<SignedPayload>(token, &self.key, &self.validation)
            .map_err(classify)?
            .claims;

        let sub = payload.sub.as_ref().and_then(Value::as_u64);
        let username = payload.username.as_ref().and_then(Value::as_str);

        match (sub, username) {
            (Some(sub), Some(username)) => Ok(UserIdentity {
                id: UserID(sub),
                username: Username(username.to_owned()),
            }),
            _ => Err(AuthError::TokenClaimsMissing),
        }
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AuthError::TokenSignatureInvalid
        }
        ErrorKind::MissingRequiredClaim(_) => AuthError::TokenClaimsMissing,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenMalformed,
    }
}
