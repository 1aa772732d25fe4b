use std::{collections::HashMap, error::Error};

use async_trait::async_trait;

use crate::{
    credentials::hash_password,
    error::AuthError,
    types::{UserID, UserIdentity, UserRecord, Username},
};

#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Retrieve the record for the given username, or `None` if no such user exists.
    async fn find(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, Box<dyn Error + Send + Sync>>;

    /// List every user, with passwords stripped.
    async fn list_all(&self) -> Result<Vec<UserIdentity>, Box<dyn Error + Send + Sync>>;
}

/// A fixed set of users held in memory. Built once, read-only afterwards.
#[derive(Default)]
pub struct InMemoryDirectory {
    storage: HashMap<String, UserRecord>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `(id, username, plaintext password)` triples, hashing each
    /// password on the way in.
    pub fn with_users<'a, I>(users: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (u64, &'a str, &'a str)>,
    {
        let mut directory = Self::new();
        for (id, username, password) in users {
            directory.insert(UserRecord {
                id: UserID(id),
                username: Username(username.to_owned()),
                hashed_password: hash_password(password)?,
            });
        }
        Ok(directory)
    }

    /// The two stock accounts: `admin`/`admin` and `tester`/`tester`.
    pub fn default_users() -> Result<Self, AuthError> {
        Self::with_users([(1, "admin", "admin"), (2, "tester", "tester")])
    }

    /// Add or replace a user, keyed by username.
    pub fn insert(&mut self, record: UserRecord) {
        self.storage.insert(record.username.0.clone(), record);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, Box<dyn Error + Send + Sync>> {
        Ok(self.storage.get(&username.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<UserIdentity>, Box<dyn Error + Send + Sync>> {
        let mut users: Vec<UserIdentity> = self.storage.values().map(UserRecord::redact).collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }
}
