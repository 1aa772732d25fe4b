use std::sync::Arc;

use uuid::Uuid;

use crate::{
    directory::UserDirectory,
    error::AuthError,
    types::{HashedPassword, UserIdentity, Username},
};

/// Hash a password for storage, with a fresh random salt.
pub fn hash_password(password: &str) -> Result<HashedPassword, AuthError> {
    let salt = Uuid::new_v4();
    let encoded = argon2::hash_encoded(password.as_bytes(), salt.as_bytes(), &Default::default())?;
    Ok(HashedPassword(encoded))
}

fn verify_password(password: &str, hash: &HashedPassword) -> Result<bool, AuthError> {
    Ok(argon2::verify_encoded(&hash.0, password.as_bytes())?)
}

/// Checks a username/password pair against a [`UserDirectory`].
///
/// Unknown usernames and wrong passwords produce the same [`AuthError::CredentialInvalid`].
/// An unknown username is still checked against a decoy hash so both paths do the same
/// amount of work.
#[derive(Clone)]
pub struct CredentialValidator {
    directory: Arc<dyn UserDirectory>,
    decoy: HashedPassword,
}

impl CredentialValidator {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Result<Self, AuthError> {
        let decoy = hash_password(&Uuid::new_v4().to_string())?;
        Ok(Self { directory, decoy })
    }

    pub async fn validate(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserIdentity, AuthError> {
        match self.directory.find(username).await? {
            Some(record) => {
                if verify_password(password, &record.hashed_password)? {
                    Ok(record.redact())
                } else {
                    Err(AuthError::CredentialInvalid)
                }
            }
            None => {
                let _ = verify_password(password, &self.decoy);
                Err(AuthError::CredentialInvalid)
            }
        }
    }
}
