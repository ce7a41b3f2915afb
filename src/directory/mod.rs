//! Name-to-address directory
//!
//! Recipients may be named instead of written as addresses. A name resolves
//! through the configured aliases first and then through registered users.

pub mod storage;

pub use storage::{Reservation, UserStore};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::wallet::CryptoError;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),
}

/// Looks up the on-chain address registered under a name
#[async_trait]
pub trait Directory: Send + Sync {
    /// `Ok(None)` when nothing is registered under `name`
    async fn lookup(&self, name: &str) -> Result<Option<String>, DirectoryError>;
}

/// Configured aliases, falling back to registered users
pub struct AliasDirectory {
    aliases: HashMap<String, String>,
    users: Arc<UserStore>,
}

impl AliasDirectory {
    pub fn new(aliases: HashMap<String, String>, users: Arc<UserStore>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(name, address)| (name.trim().to_lowercase(), address))
            .collect();
        Self { aliases, users }
    }

    pub fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

#[async_trait]
impl Directory for AliasDirectory {
    async fn lookup(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        let key = name.trim().to_lowercase();
        if let Some(address) = self.aliases.get(&key) {
            debug!(name = %key, "Matched configured alias");
            return Ok(Some(address.clone()));
        }

        Ok(self.users.find(&key).await?.map(|account| account.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Account;

    const ALICE: &str = "0x0263fd91c595ed132686147abb8fe8b39564b72b";
    const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    #[tokio::test]
    async fn test_alias_then_user_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let users = Arc::new(UserStore::new(dir.path().to_path_buf(), "test-secret"));
        users
            .register(
                "Carol",
                "hunter22",
                Account { wallet_id: "w-carol".into(), address: CAROL.into() },
            )
            .await
            .unwrap();

        let aliases = HashMap::from([("Alice".to_string(), ALICE.to_string())]);
        let directory = AliasDirectory::new(aliases, users);

        assert_eq!(directory.lookup("alice").await.unwrap().as_deref(), Some(ALICE));
        assert_eq!(directory.lookup("CAROL").await.unwrap().as_deref(), Some(CAROL));
        assert_eq!(directory.lookup("nobody").await.unwrap(), None);
        assert_eq!(directory.alias_names().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_alias_shadows_user() {
        let dir = tempfile::tempdir().unwrap();
        let users = Arc::new(UserStore::new(dir.path().to_path_buf(), "test-secret"));
        users
            .register("bob", "pw123456", Account { wallet_id: "w-bob".into(), address: CAROL.into() })
            .await
            .unwrap();

        let directory = AliasDirectory::new(HashMap::from([("bob".to_string(), ALICE.to_string())]), users);
        assert_eq!(directory.lookup("bob").await.unwrap().as_deref(), Some(ALICE));
    }
}
