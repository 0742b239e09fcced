//! Email/password accounts with bearer sessions, stored in SQLite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Identity, IdentityProvider, SignedIn};

/// Local identity provider.
///
/// Passwords are stored as Argon2 PHC strings. Session tokens are random
/// and only their SHA-256 digest is persisted. Also acts as the request
/// authenticator for `Authorization: Bearer <token>`.
pub struct LocalIdentityProvider {
    conn: Mutex<Connection>,
    session_ttl: Duration,
}

impl LocalIdentityProvider {
    /// Open or create the account tables in the database at `path`.
    pub fn new(path: &Path, session_ttl_hours: u32) -> Result<Self, AuthError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn, session_ttl_hours)
    }

    /// In-memory provider (useful for testing).
    pub fn in_memory(session_ttl_hours: u32) -> Result<Self, AuthError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn, session_ttl_hours)
    }

    fn from_connection(conn: Connection, session_ttl_hours: u32) -> Result<Self, AuthError> {
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            session_ttl: Duration::hours(i64::from(session_ttl_hours)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AuthError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                user_id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auth_sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
            "#,
        )
        .map_err(storage_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AuthError> {
        self.conn
            .lock()
            .map_err(|_| AuthError::Storage("connection lock poisoned".to_string()))
    }

    /// Issue a new session token. Expired sessions of any user are pruned first.
    fn start_session(&self, conn: &Connection, identity: Identity) -> Result<SignedIn, AuthError> {
        let now = Utc::now();
        let pruned = conn
            .execute(
                "DELETE FROM auth_sessions WHERE expires_at <= ?",
                params![now.timestamp()],
            )
            .map_err(storage_err)?;
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired sessions");
        }

        let token = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
        let expires_at = now + self.session_ttl;
        conn.execute(
            "INSERT INTO auth_sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)",
            params![digest(&token), identity.user_id, expires_at.timestamp()],
        )
        .map_err(storage_err)?;

        Ok(SignedIn {
            identity,
            token,
            expires_at: expires_at.to_rfc3339(),
        })
    }

    fn row_to_identity(row: &rusqlite::Row) -> rusqlite::Result<Identity> {
        Ok(Identity {
            user_id: row.get(0)?,
            email: Some(row.get(1)?),
            display_name: row.get(2)?,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }

        let password_hash = hash_password(password)?;

        let conn = self.lock()?;
        let taken: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?)",
                params![email],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        if taken {
            return Err(AuthError::EmailTaken(email));
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        conn.execute(
            "INSERT INTO accounts (user_id, email, display_name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                user_id,
                email,
                display_name,
                password_hash,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;

        tracing::info!(user_id = %user_id, "Registered account");

        let identity = Identity {
            user_id,
            display_name: display_name.map(String::from),
            email: Some(email),
        };
        self.start_session(&conn, identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email)?;

        let account = self
            .lock()?
            .query_row(
                "SELECT user_id, email, display_name, password_hash FROM accounts WHERE email = ?",
                params![email],
                |row| Ok((Self::row_to_identity(row)?, row.get::<_, String>(3)?)),
            )
            .optional()
            .map_err(storage_err)?;

        let rejected = || AuthError::InvalidCredentials("Wrong email or password".to_string());
        let (identity, stored) = account.ok_or_else(rejected)?;
        if !verify_password(password, &stored)? {
            tracing::debug!(user_id = %identity.user_id, "Rejected sign-in");
            return Err(rejected());
        }

        tracing::debug!(user_id = %identity.user_id, "Signed in");
        let conn = self.lock()?;
        self.start_session(&conn, identity)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM auth_sessions WHERE token_hash = ?",
            params![digest(token)],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                "SELECT a.user_id, a.email, a.display_name, s.expires_at FROM auth_sessions s JOIN accounts a ON a.user_id = s.user_id WHERE s.token_hash = ?",
                params![digest(token)],
                |row| Ok((Self::row_to_identity(row)?, row.get::<_, i64>(3)?)),
            )
            .optional()
            .map_err(storage_err)?;

        let (identity, expires_at) = session
            .ok_or_else(|| AuthError::InvalidCredentials("Unknown session token".to_string()))?;

        let expired = DateTime::<Utc>::from_timestamp(expires_at, 0)
            .is_none_or(|expires_at| expires_at <= Utc::now());
        if expired {
            conn.execute(
                "DELETE FROM auth_sessions WHERE token_hash = ?",
                params![digest(token)],
            )
            .map_err(storage_err)?;
            return Err(AuthError::InvalidCredentials("Session expired".to_string()));
        }

        Ok(identity)
    }

    async fn delete_account(&self, user_id: &str) -> Result<(), AuthError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute("DELETE FROM auth_sessions WHERE user_id = ?", params![user_id])
            .map_err(storage_err)?;
        let deleted = tx
            .execute("DELETE FROM accounts WHERE user_id = ?", params![user_id])
            .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;

        if deleted == 0 {
            return Err(AuthError::AccountNotFound(user_id.to_string()));
        }
        tracing::info!(user_id = %user_id, "Deleted account");
        Ok(())
    }
}

#[async_trait]
impl Authenticator for LocalIdentityProvider {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = request.bearer_token().ok_or(AuthError::NotAuthenticated)?;
        self.resolve(token).await
    }

    fn method_name(&self) -> &'static str {
        "local"
    }
}

fn storage_err(e: rusqlite::Error) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput(format!("invalid email: {:?}", email)));
    }
    Ok(email)
}

fn digest(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

/// Argon2id with a random salt, encoded as a PHC string.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// `Ok(false)` on a mismatch; `Err` only when `stored` is not a valid PHC string.
fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::in_memory(24).unwrap()
    }

    fn bearer(token: &str) -> AuthRequest {
        let mut request = AuthRequest::default();
        request
            .headers
            .insert("authorization".into(), format!("Bearer {}", token));
        request
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let provider = provider();
        let signed_in = provider
            .register("Ada@Example.com ", "hunter2", Some("Ada"))
            .await
            .unwrap();

        assert_eq!(signed_in.identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(signed_in.identity.display_name.as_deref(), Some("Ada"));

        let identity = provider.resolve(&signed_in.token).await.unwrap();
        assert_eq!(identity, signed_in.identity);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let provider = provider();
        provider.register("a@b.c", "pw", None).await.unwrap();
        let result = provider.register("A@B.C", "other", None).await;
        assert!(matches!(result, Err(AuthError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_invalid_registration_input() {
        let provider = provider();
        assert!(matches!(
            provider.register("not-an-email", "pw", None).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            provider.register("a@b.c", "", None).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let provider = provider();
        let registered = provider.register("a@b.c", "secret", None).await.unwrap();

        let signed_in = provider.sign_in("a@b.c", "secret").await.unwrap();
        assert_eq!(signed_in.identity.user_id, registered.identity.user_id);
        assert_ne!(signed_in.token, registered.token);

        let wrong = provider.sign_in("a@b.c", "nope").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials(_))));

        let unknown = provider.sign_in("x@y.z", "secret").await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_token() {
        let provider = provider();
        let signed_in = provider.register("a@b.c", "pw", None).await.unwrap();

        provider.sign_out(&signed_in.token).await.unwrap();
        assert!(matches!(
            provider.resolve(&signed_in.token).await,
            Err(AuthError::InvalidCredentials(_))
        ));
        provider.sign_out(&signed_in.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_ttl_sessions_expire_immediately() {
        let provider = LocalIdentityProvider::in_memory(0).unwrap();
        let signed_in = provider.register("a@b.c", "pw", None).await.unwrap();
        assert!(matches!(
            provider.resolve(&signed_in.token).await,
            Err(AuthError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let provider = provider();
        let signed_in = provider.register("a@b.c", "pw", None).await.unwrap();
        let user_id = signed_in.identity.user_id.clone();

        provider.delete_account(&user_id).await.unwrap();
        assert!(provider.resolve(&signed_in.token).await.is_err());
        assert!(provider.sign_in("a@b.c", "pw").await.is_err());
        assert!(matches!(
            provider.delete_account(&user_id).await,
            Err(AuthError::AccountNotFound(_))
        ));

        provider.register("a@b.c", "pw", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticator_uses_bearer_token() {
        let provider = provider();
        let signed_in = provider.register("a@b.c", "pw", None).await.unwrap();

        let identity = provider.authenticate(&bearer(&signed_in.token)).await.unwrap();
        assert_eq!(identity.user_id, signed_in.identity.user_id);

        assert_eq!(
            provider.authenticate(&AuthRequest::default()).await,
            Err(AuthError::NotAuthenticated)
        );
        assert!(matches!(
            provider.authenticate(&bearer("bogus")).await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert_eq!(provider.method_name(), "local");
    }

    fn stored_hash(provider: &LocalIdentityProvider, email: &str) -> String {
        provider
            .lock()
            .unwrap()
            .query_row(
                "SELECT password_hash FROM accounts WHERE email = ?",
                params![email],
                |row| row.get(0),
            )
            .unwrap()
    }

    fn session_count(provider: &LocalIdentityProvider) -> i64 {
        provider
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM auth_sessions", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn test_password_stored_as_argon2() {
        let provider = provider();
        provider.register("a@b.c", "secret", None).await.unwrap();

        let stored = stored_hash(&provider, "a@b.c");
        assert!(stored.starts_with("$argon2"));
        assert!(!stored.contains("secret"));

        assert!(provider.sign_in("a@b.c", "secret").await.is_ok());
        assert!(matches!(
            provider.sign_in("a@b.c", "Secret").await,
            Err(AuthError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let first = hash_password("pw").unwrap();
        let second = hash_password("pw").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("pw", &first).unwrap());
        assert!(verify_password("pw", &second).unwrap());
        assert!(!verify_password("other", &first).unwrap());
        assert!(matches!(
            verify_password("pw", "not-a-phc-string"),
            Err(AuthError::PasswordHash(_))
        ));
    }

    #[tokio::test]
    async fn test_new_session_prunes_expired_ones() {
        let provider = provider();
        let signed_in = provider.register("a@b.c", "pw", None).await.unwrap();
        provider
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO auth_sessions (token_hash, user_id, expires_at) VALUES ('stale', ?, 0)",
                params![signed_in.identity.user_id],
            )
            .unwrap();
        assert_eq!(session_count(&provider), 2);

        provider.sign_in("a@b.c", "pw").await.unwrap();

        // The stale row is gone; the two live sessions remain.
        assert_eq!(session_count(&provider), 2);
        assert!(provider.resolve(&signed_in.token).await.is_ok());
    }
}
