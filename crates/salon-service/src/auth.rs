//! # Admin Authorization
//!
//! Gates destructive actions behind the admin passphrase. A correct
//! passphrase opens a cooldown window during which the desk is not asked
//! again.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settings store                                                         │
//! │    admin.passphrase_hash       Argon2 PHC string                        │
//! │    admin.last_authorized_at    RFC 3339 timestamp                       │
//! │                                                                         │
//! │  is_authorized(now)  = cooldown.is_active(last_authorized_at, now)      │
//! │  verify(pass, now)   = argon2 check, then record_authorization(now)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use salon_core::auth::Cooldown;
use salon_core::validation::validate_passphrase;

use crate::error::{DeletionAuthError, ServiceResult};
use crate::store::KeyValueStore;

/// Settings key holding the Argon2 hash.
pub const PASSPHRASE_HASH_KEY: &str = "admin.passphrase_hash";

/// Settings key holding the last successful authorization.
pub const LAST_AUTHORIZED_KEY: &str = "admin.last_authorized_at";

pub type AuthResult<T> = Result<T, DeletionAuthError>;

/// Decides whether a destructive action may proceed.
#[async_trait]
pub trait AuthorizationPolicy: Send + Sync {
    /// True while a previous authorization is still inside the cooldown.
    async fn is_authorized(&self, now: DateTime<Utc>) -> AuthResult<bool>;

    /// Checks the passphrase and, on success, records the authorization.
    async fn verify(&self, passphrase: &str, now: DateTime<Utc>) -> AuthResult<()>;

    /// Opens a new cooldown window starting at `now`.
    async fn record_authorization(&self, now: DateTime<Utc>) -> AuthResult<()>;

    /// Time left before the passphrase is required again.
    async fn remaining(&self, now: DateTime<Utc>) -> AuthResult<Duration>;

    /// Ends the current window early.
    async fn clear(&self) -> AuthResult<()>;
}

/// [`AuthorizationPolicy`] backed by a key/value store.
pub struct PassphrasePolicy<K: KeyValueStore> {
    store: K,
    cooldown: Cooldown,
}

impl<K: KeyValueStore> PassphrasePolicy<K> {
    pub fn new(store: K, cooldown: Cooldown) -> Self {
        PassphrasePolicy { store, cooldown }
    }

    pub fn cooldown(&self) -> Cooldown {
        self.cooldown
    }

    pub async fn has_passphrase(&self) -> AuthResult<bool> {
        Ok(self.store.get(PASSPHRASE_HASH_KEY).await?.is_some())
    }

    /// Stores a new passphrase and ends any open window.
    pub async fn set_passphrase(&self, passphrase: &str) -> ServiceResult<()> {
        validate_passphrase(passphrase)?;
        let hash = hash_passphrase(passphrase)?;

        self.store
            .set(PASSPHRASE_HASH_KEY, &hash)
            .await
            .map_err(DeletionAuthError::from)?;
        self.clear().await?;

        info!("Admin passphrase updated");
        Ok(())
    }

    async fn last_authorized(&self) -> AuthResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(LAST_AUTHORIZED_KEY).await? else {
            return Ok(None);
        };

        DateTime::parse_from_rfc3339(&raw)
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|e| DeletionAuthError::CorruptCredential(format!("{LAST_AUTHORIZED_KEY}: {e}")))
    }
}

#[async_trait]
impl<K: KeyValueStore> AuthorizationPolicy for PassphrasePolicy<K> {
    async fn is_authorized(&self, now: DateTime<Utc>) -> AuthResult<bool> {
        let last = self.last_authorized().await?;
        Ok(self.cooldown.is_active(last, now))
    }

    async fn verify(&self, passphrase: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let hash = self
            .store
            .get(PASSPHRASE_HASH_KEY)
            .await?
            .ok_or(DeletionAuthError::NotConfigured)?;

        if !verify_passphrase(passphrase, &hash)? {
            warn!("Admin passphrase rejected");
            return Err(DeletionAuthError::InvalidPassphrase);
        }

        self.record_authorization(now).await
    }

    async fn record_authorization(&self, now: DateTime<Utc>) -> AuthResult<()> {
        self.store.set(LAST_AUTHORIZED_KEY, &now.to_rfc3339()).await?;
        match now.checked_add_signed(self.cooldown.window()) {
            Some(until) => debug!(until = %until.to_rfc3339(), "Admin authorization recorded"),
            None => debug!("Admin authorization recorded"),
        }
        Ok(())
    }

    async fn remaining(&self, now: DateTime<Utc>) -> AuthResult<Duration> {
        let last = self.last_authorized().await?;
        Ok(self.cooldown.remaining(last, now))
    }

    async fn clear(&self) -> AuthResult<()> {
        self.store.remove(LAST_AUTHORIZED_KEY).await?;
        Ok(())
    }
}

// =============================================================================
// Hashing
// =============================================================================

fn hash_passphrase(passphrase: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| DeletionAuthError::CorruptCredential(format!("failed to hash passphrase: {e}")))?;

    Ok(hash.to_string())
}

fn verify_passphrase(passphrase: &str, hash: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DeletionAuthError::CorruptCredential(format!("{PASSPHRASE_HASH_KEY}: {e}")))?;

    Ok(Argon2::default()
        .verify_password(passphrase.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;
    use salon_db::{Database, DbConfig};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    async fn policy() -> PassphrasePolicy<MemoryStore> {
        let policy = PassphrasePolicy::new(MemoryStore::new(), Cooldown::from_secs(300));
        policy.set_passphrase("open sesame").await.unwrap();
        policy
    }

    #[tokio::test]
    async fn test_verify_opens_window() {
        let policy = policy().await;
        assert!(!policy.is_authorized(t(0)).await.unwrap());

        policy.verify("open sesame", t(0)).await.unwrap();

        assert!(policy.is_authorized(t(299)).await.unwrap());
        assert!(!policy.is_authorized(t(300)).await.unwrap());
        assert_eq!(policy.remaining(t(60)).await.unwrap(), Duration::seconds(240));
    }

    #[tokio::test]
    async fn test_oversized_cooldown_is_capped() {
        let policy = PassphrasePolicy::new(MemoryStore::new(), Cooldown::from_secs(i64::MAX));
        policy.set_passphrase("open sesame").await.unwrap();

        policy.verify("open sesame", t(0)).await.unwrap();

        let cap = salon_core::MAX_AUTH_COOLDOWN_SECS;
        assert_eq!(policy.remaining(t(0)).await.unwrap(), Duration::seconds(cap));
        assert!(policy.is_authorized(t(cap - 1)).await.unwrap());
        assert!(!policy.is_authorized(t(cap)).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_passphrase_keeps_window_closed() {
        let policy = policy().await;

        let err = policy.verify("guess", t(0)).await.unwrap_err();

        assert!(matches!(err, DeletionAuthError::InvalidPassphrase));
        assert!(!policy.is_authorized(t(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unconfigured_passphrase() {
        let policy = PassphrasePolicy::new(MemoryStore::new(), Cooldown::default());

        assert!(!policy.has_passphrase().await.unwrap());
        let err = policy.verify("anything", t(0)).await.unwrap_err();
        assert!(matches!(err, DeletionAuthError::NotConfigured));
    }

    #[tokio::test]
    async fn test_clear_and_reset_close_window() {
        let policy = policy().await;
        policy.record_authorization(t(0)).await.unwrap();
        policy.clear().await.unwrap();
        assert!(!policy.is_authorized(t(1)).await.unwrap());

        policy.record_authorization(t(0)).await.unwrap();
        policy.set_passphrase("new passphrase").await.unwrap();
        assert!(!policy.is_authorized(t(1)).await.unwrap());
        assert!(policy.verify("open sesame", t(2)).await.is_err());
        policy.verify("new passphrase", t(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_weak_passphrase_rejected() {
        let policy = PassphrasePolicy::new(MemoryStore::new(), Cooldown::default());

        let err = policy.set_passphrase("").await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!policy.has_passphrase().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_reported() {
        let store = MemoryStore::new();
        store.set(LAST_AUTHORIZED_KEY, "yesterday").await.unwrap();
        let policy = PassphrasePolicy::new(store, Cooldown::default());

        let err = policy.is_authorized(t(0)).await.unwrap_err();
        assert!(matches!(err, DeletionAuthError::CorruptCredential(_)));
    }

    #[tokio::test]
    async fn test_policy_persists_in_sqlite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let policy = PassphrasePolicy::new(db.clone(), Cooldown::from_secs(60));
        policy.set_passphrase("open sesame").await.unwrap();
        policy.verify("open sesame", t(0)).await.unwrap();

        let reopened = PassphrasePolicy::new(db, Cooldown::from_secs(60));
        assert!(reopened.is_authorized(t(30)).await.unwrap());
        assert!(db_hash_is_phc(&reopened).await);
    }

    async fn db_hash_is_phc(policy: &PassphrasePolicy<Database>) -> bool {
        let hash = policy.store.get(PASSPHRASE_HASH_KEY).await.unwrap().unwrap();
        hash.starts_with("$argon2")
    }
}
