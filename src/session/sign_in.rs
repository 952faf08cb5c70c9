//! Sign-in and sign-out: the only writers of the stored session.

use std::time::Duration;

use bcrypt::{hash, verify, DEFAULT_COST};

use super::{now_ms, Session, SessionStorage, SessionUser, SESSION_KEY};
use crate::errors::{AppError, AppResult};
use crate::models::AdminUser;
use crate::store::Collection;

/// The one message every credential mismatch produces.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Check credentials against `admin_users` and persist a fresh session.
pub async fn sign_in(
    users: &Collection<AdminUser>,
    storage: &dyn SessionStorage,
    email: &str,
    password: &str,
    ttl: Duration,
) -> AppResult<Session> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = users
        .fetch_one(&users.query().eq("email", email))
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(invalid_credentials)?;

    let valid = verify(password, password_hash).unwrap_or_else(|e| {
        tracing::warn!("Unusable password hash for admin {}: {}", user.id, e);
        false
    });
    if !valid {
        return Err(invalid_credentials());
    }

    let session = Session::new(SessionUser::from(&user), ttl, now_ms());
    storage.set(SESSION_KEY, &serde_json::to_string(&session)?)?;

    tracing::info!("Admin {} signed in", user.email);
    Ok(session)
}

/// Remove the stored session. Signing out twice is fine.
pub fn sign_out(storage: &dyn SessionStorage) -> AppResult<()> {
    storage.remove(SESSION_KEY)
}

/// bcrypt hash for seeding `admin_users.password_hash`.
pub fn hash_password(plain: &str) -> AppResult<String> {
    hash_password_with_cost(plain, DEFAULT_COST)
}

pub fn hash_password_with_cost(plain: &str, cost: u32) -> AppResult<String> {
    Ok(hash(plain, cost)?)
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::models::NewAdminUser;
    use crate::session::{inspect, MemoryStorage};
    use crate::store::SharedStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn users_with_admin() -> (Collection<AdminUser>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let store: SharedStore = Arc::new(Repository::new(pool));
        let users = Collection::<AdminUser>::new(store);

        users
            .insert(&NewAdminUser {
                email: "admin@rwu.example".to_string(),
                full_name: "Site Admin".to_string(),
                role: "admin".to_string(),
                password_hash: hash_password_with_cost("correct horse", 4).unwrap(),
            })
            .await
            .unwrap();

        (users, temp_dir)
    }

    #[tokio::test]
    async fn test_sign_in_writes_session() {
        let (users, _dir) = users_with_admin().await;
        let storage = MemoryStorage::new();

        let before = now_ms();
        let session = sign_in(
            &users,
            &storage,
            " admin@rwu.example ",
            "correct horse",
            Duration::from_secs(24 * 3600),
        )
        .await
        .unwrap();

        assert_eq!(session.user.full_name, "Site Admin");
        assert!(session.expires_at >= before + 24 * 3600 * 1000);
        assert_eq!(inspect(&storage, now_ms()).unwrap(), session);
    }

    #[tokio::test]
    async fn test_mismatches_share_one_message() {
        let (users, _dir) = users_with_admin().await;
        let storage = MemoryStorage::new();
        let ttl = Duration::from_secs(60);

        let wrong_password = sign_in(&users, &storage, "admin@rwu.example", "nope", ttl)
            .await
            .unwrap_err();
        let unknown_email = sign_in(&users, &storage, "who@rwu.example", "nope", ttl)
            .await
            .unwrap_err();

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.message(), INVALID_CREDENTIALS);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected_early() {
        let (users, _dir) = users_with_admin().await;
        let err = sign_in(&users, &MemoryStorage::new(), "", "x", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "{}").unwrap();
        sign_out(&storage).unwrap();
        sign_out(&storage).unwrap();
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }
}
