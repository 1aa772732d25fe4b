use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UserID(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Username(pub String);

/// An Argon2 encoded hash, salt and parameters included.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct HashedPassword(pub String);

/// A user as stored in a [`UserDirectory`](crate::UserDirectory).
///
/// The hash never leaves the credential check; everything downstream works on the
/// [`UserIdentity`] returned by [`UserRecord::redact`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserID,
    pub username: Username,
    pub hashed_password: HashedPassword,
}

impl UserRecord {
    pub fn redact(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Password-free view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserIdentity {
    pub id: UserID,
    pub username: Username,
}

/// Payload signed into every token.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Claims {
    pub(crate) sub: u64,
    pub(crate) username: String,
    pub(crate) iat: u64,
}

/// Signed token handed to a client after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
