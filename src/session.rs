use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, VoicemintError};

const SESSION_FILE: &str = "session.json";
const USERS_FILE: &str = "users.json";

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// A registered account. Only a salted digest of the password is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub email: String,
    pub salt: String,
    pub password_hash: String,
    pub rounds: u32,
    pub created_at: DateTime<Utc>,
}

impl StoredCredential {
    fn create(email: &str, password: &str, rounds: u32) -> Self {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(password, &salt, rounds);
        Self {
            email: email.to_string(),
            salt,
            password_hash,
            rounds,
            created_at: Utc::now(),
        }
    }

    fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(password, &self.salt, self.rounds);
        constant_time_eq(candidate.as_bytes(), self.password_hash.as_bytes())
    }
}

/// Iterated SHA-256 over salt and password, hex encoded
fn hash_password(password: &str, salt: &str, rounds: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds.max(1) {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt.as_bytes())
            .finalize();
    }
    format!("{:x}", digest)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// File-backed store for the session record and the registered users
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
    hash_rounds: u32,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(data_dir: P, hash_rounds: u32) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            hash_rounds,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.data_dir, config.hash_rounds)
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    /// Load the session record; a corrupt record is removed and treated as absent
    pub async fn load_session(&self) -> Result<Option<SessionRecord>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        match serde_json::from_str::<SessionRecord>(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Failed to parse session record, discarding it: {}", e);
                fs::remove_file(&path).await?;
                Ok(None)
            }
        }
    }

    pub async fn save_session(&self, user: &User) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        let record = SessionRecord {
            email: user.email.clone(),
            signed_in_at: Utc::now(),
        };
        fs::write(self.session_path(), serde_json::to_string_pretty(&record)?).await?;
        Ok(())
    }

    pub async fn clear_session(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    pub async fn load_users(&self) -> Result<Vec<StoredCredential>> {
        let path = self.users_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save_users(&self, users: &[StoredCredential]) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        fs::write(self.users_path(), serde_json::to_string_pretty(users)?).await?;
        Ok(())
    }
}

/// Application-lifetime context holding the signed-in user.
///
/// Created once at start-up with `init` and passed to whatever needs to know
/// who is signed in. Audio and playback code never touches it.
pub struct SessionContext {
    store: SessionStore,
    current: Option<User>,
}

impl SessionContext {
    /// Load the current session, or start signed out
    pub async fn init(store: SessionStore) -> Result<Self> {
        let current = store
            .load_session()
            .await?
            .map(|record| User { email: record.email });

        if let Some(user) = &current {
            debug!("Restored session for {}", user.email);
        }

        Ok(Self { store, current })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn require_user(&self) -> Result<&User> {
        self.current.as_ref().ok_or_else(|| {
            VoicemintError::Auth("Not signed in. Run `voicemint login` or `voicemint signup` first.".to_string())
        })
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<User> {
        let email = validate_credentials(email, password)?;

        let mut users = self.store.load_users().await?;
        if users.iter().any(|u| u.email == email) {
            return Err(VoicemintError::Auth("An account with this email already exists.".to_string()));
        }

        users.push(StoredCredential::create(email, password, self.store.hash_rounds));
        self.store.save_users(&users).await?;
        info!("Registered {}", email);

        self.start_session(User { email: email.to_string() }).await
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<User> {
        let email = validate_credentials(email, password)?;

        let users = self.store.load_users().await?;
        let verified = users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.verify(password))
            .unwrap_or(false);

        if !verified {
            return Err(VoicemintError::Auth("Invalid email or password.".to_string()));
        }

        self.start_session(User { email: email.to_string() }).await
    }

    /// Clear the session record
    pub async fn sign_out(&mut self) -> Result<()> {
        self.store.clear_session().await?;
        if let Some(user) = self.current.take() {
            info!("Signed out {}", user.email);
        }
        Ok(())
    }

    async fn start_session(&mut self, user: User) -> Result<User> {
        self.store.save_session(&user).await?;
        self.current = Some(user.clone());
        Ok(user)
    }
}

fn validate_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() || password.trim().is_empty() {
        return Err(VoicemintError::Validation("Email and password cannot be empty.".to_string()));
    }
    Ok(email)
}
