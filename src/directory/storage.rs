//! File-backed user store
//!
//! Keeps registered users in a single JSON file under the data directory.
//! Passwords are stored as salted HMAC-SHA256 hashes keyed by the server secret.

use super::DirectoryError;
use crate::wallet::crypto::{generate_salt, hash_password, verify_password};
use crate::wallet::Account;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

const USERS_FILE: &str = "users.json";
const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    salt: String,
    password_hash: String,
    account: Account,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    users: BTreeMap<String, UserRecord>,
}

/// Registered users keyed by lower-cased username
pub struct UserStore {
    users_path: PathBuf,
    secret: String,
    // Serializes read-modify-write cycles on the users file
    write_lock: Mutex<()>,
    // Names reserved by registrations still waiting on their wallet
    pending: std::sync::Mutex<HashSet<String>>,
}

/// Exclusive claim on a username until it is registered or dropped
pub struct Reservation<'a> {
    store: &'a UserStore,
    username: String,
}

impl Reservation<'_> {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Store the user under the reserved name and release the claim
    pub async fn register(self, password: &str, account: Account) -> Result<(), DirectoryError> {
        self.store.register(&self.username, password, account).await
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.store.pending_names().remove(&self.username);
    }
}

impl UserStore {
    pub fn new(data_dir: PathBuf, secret: impl Into<String>) -> Self {
        Self {
            users_path: data_dir.join(USERS_FILE),
            secret: secret.into(),
            write_lock: Mutex::new(()),
            pending: std::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Lower-cased, trimmed username; only letters, digits and `_` are allowed
    pub fn normalize_username(username: &str) -> Result<String, DirectoryError> {
        let name = username.trim().to_lowercase();
        if name.is_empty() || name.len() > MAX_USERNAME_LEN {
            return Err(DirectoryError::InvalidUsername(format!(
                "must be 1 to {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DirectoryError::InvalidUsername(
                "only letters, digits and underscores are allowed".to_string(),
            ));
        }
        Ok(name)
    }

    async fn ensure_dir(&self) -> Result<(), DirectoryError> {
        if let Some(parent) = self.users_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<UserFile, DirectoryError> {
        match fs::read_to_string(&self.users_path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, file: &UserFile) -> Result<(), DirectoryError> {
        self.ensure_dir().await?;
        let content = serde_json::to_string_pretty(file)?;

        // Write then rename so a crash never leaves a half-written file
        let tmp_path = self.users_path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        fs::rename(&tmp_path, &self.users_path).await?;
        Ok(())
    }

    fn pending_names(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim a free username before any wallet is provisioned for it
    pub async fn reserve(&self, username: &str) -> Result<Reservation<'_>, DirectoryError> {
        let name = Self::normalize_username(username)?;
        let _guard = self.write_lock.lock().await;

        if self.load().await?.users.contains_key(&name) || !self.pending_names().insert(name.clone()) {
            return Err(DirectoryError::UsernameTaken(name));
        }
        Ok(Reservation {
            store: self,
            username: name,
        })
    }

    /// Store a new user with the wallet created for them
    pub async fn register(&self, username: &str, password: &str, account: Account) -> Result<(), DirectoryError> {
        let name = Self::normalize_username(username)?;
        let _guard = self.write_lock.lock().await;

        let mut file = self.load().await?;
        if file.users.contains_key(&name) {
            return Err(DirectoryError::UsernameTaken(name));
        }

        let salt = generate_salt();
        let password_hash = hash_password(password, &salt, &self.secret)?;
        file.users.insert(
            name.clone(),
            UserRecord {
                username: name.clone(),
                salt,
                password_hash,
                account,
                created_at: Utc::now(),
            },
        );
        self.save(&file).await?;

        info!(username = %name, "Registered user");
        Ok(())
    }

    /// The user's account when the password matches, `None` otherwise
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<Account>, DirectoryError> {
        let Ok(name) = Self::normalize_username(username) else {
            return Ok(None);
        };
        let file = self.load().await?;

        match file.users.get(&name) {
            Some(record) if verify_password(password, &record.salt, &record.password_hash, &self.secret) => {
                Ok(Some(record.account.clone()))
            }
            Some(_) => {
                warn!(username = %name, "Password mismatch");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn find(&self, username: &str) -> Result<Option<Account>, DirectoryError> {
        let Ok(name) = Self::normalize_username(username) else {
            return Ok(None);
        };
        Ok(self.load().await?.users.get(&name).map(|r| r.account.clone()))
    }
}
