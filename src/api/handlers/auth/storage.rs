//! Database helpers for accounts, verification tokens, and sessions.

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::Role;
use super::utils::{generate_session_token, generate_verification_token, hash_session_token, is_unique_violation};

/// Outcome when attempting to create a new user + verification token.
#[derive(Debug)]
pub(crate) enum SignupOutcome {
    /// User stored; carries the raw verification token for the email link.
    Created { token: String },
    Conflict,
}

/// A stored user, as seen by the account service.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    /// Absent for federated-only accounts; such accounts cannot log in here.
    pub(crate) password_hash: Option<String>,
    pub(crate) role: Role,
    pub(crate) email_verified: bool,
}

/// A live verification token.
#[derive(Debug)]
pub(crate) struct TokenRecord {
    pub(crate) email: String,
    pub(crate) token: String,
}

/// Minimal data returned for a valid session cookie.
#[derive(Debug)]
pub(crate) struct SessionRecord {
    pub(crate) user_id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: Role,
}

fn role_from_row(value: &str) -> Result<Role> {
    Role::parse(value).ok_or_else(|| anyhow!("unknown role: {value}"))
}

pub(crate) async fn lookup_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, name, email, password_hash, role, email_verified_at IS NOT NULL AS email_verified
        FROM users
        WHERE email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user")?;

    row.map(|row| {
        let role: String = row.get("role");
        Ok(UserRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: role_from_row(&role)?,
            email_verified: row.get("email_verified"),
        })
    })
    .transpose()
}

/// Create the user and their first verification token in one transaction.
///
/// The unique constraint on email reports duplicates; there is no separate
/// existence pre-check that could race with a concurrent signup.
pub(crate) async fn insert_user_and_token(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    token_ttl_seconds: i64,
) -> Result<SignupOutcome> {
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&mut *tx)
        .instrument(span)
        .await;

    if let Err(err) = result {
        if is_unique_violation(&err) {
            let _ = tx.rollback().await;
            return Ok(SignupOutcome::Conflict);
        }
        return Err(err).context("failed to insert user");
    }

    let token = issue_verification_token_tx(&mut tx, email, token_ttl_seconds).await?;

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created { token })
}

/// Replace any live token for this email with a fresh one.
///
/// Delete-then-insert runs inside the caller's transaction so two concurrent
/// issuances cannot leave two live tokens; the unique constraint on email
/// backstops the invariant.
pub(crate) async fn issue_verification_token_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    email: &str,
    token_ttl_seconds: i64,
) -> Result<String> {
    let query = "DELETE FROM verification_tokens WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to delete prior verification token")?;

    let token = generate_verification_token()?;
    let query = r"
        INSERT INTO verification_tokens (id, email, token, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&token)
        .bind(token_ttl_seconds)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert verification token")?;

    Ok(token)
}

/// Standalone issuance used outside a larger transaction.
pub(crate) async fn issue_verification_token(
    pool: &PgPool,
    email: &str,
    token_ttl_seconds: i64,
) -> Result<String> {
    let mut tx = pool.begin().await.context("begin token transaction")?;
    let token = issue_verification_token_tx(&mut tx, email, token_ttl_seconds).await?;
    tx.commit().await.context("commit token transaction")?;
    Ok(token)
}

/// Point lookup by token value. Expired tokens are treated as absent.
pub(crate) async fn lookup_token(pool: &PgPool, token: &str) -> Result<Option<TokenRecord>> {
    let query = r"
        SELECT email, token
        FROM verification_tokens
        WHERE token = $1
          AND expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup verification token")?;
    Ok(row.map(|row| TokenRecord {
        email: row.get("email"),
        token: row.get("token"),
    }))
}

/// Point lookup by owning email. Expired tokens are treated as absent.
pub(crate) async fn lookup_token_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<TokenRecord>> {
    let query = r"
        SELECT email, token
        FROM verification_tokens
        WHERE email = $1
          AND expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup verification token by email")?;
    Ok(row.map(|row| TokenRecord {
        email: row.get("email"),
        token: row.get("token"),
    }))
}

/// Consume a reset token and store the new password hash in one transaction.
///
/// Tokens are single use: the delete and the password update commit together,
/// so a replayed link finds nothing.
pub(crate) async fn reset_password_with_token(
    pool: &PgPool,
    token: &str,
    new_password_hash: &str,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin reset transaction")?;

    let query = r"
        DELETE FROM verification_tokens
        WHERE token = $1
          AND expires_at > NOW()
        RETURNING email
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume reset token")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(false);
    };

    let email: String = row.get("email");
    let query = r"
        UPDATE users
        SET password_hash = $2,
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(&email)
        .bind(new_password_hash)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to update password")?;

    if result.rows_affected() == 0 {
        // Token without an owner; treat as invalid rather than half-applying.
        let _ = tx.rollback().await;
        return Ok(false);
    }

    tx.commit().await.context("commit reset transaction")?;
    Ok(true)
}

/// Consume a verification token and stamp the account verified.
pub(crate) async fn consume_verification_token(pool: &PgPool, token: &str) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin verify transaction")?;

    let query = r"
        DELETE FROM verification_tokens
        WHERE token = $1
          AND expires_at > NOW()
        RETURNING email
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(false);
    };

    let email: String = row.get("email");
    let query = r"
        UPDATE users
        SET email_verified_at = NOW(),
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(&email)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;

    tx.commit().await.context("commit verify transaction")?;
    Ok(true)
}

/// Insert a session row, retrying on the unlikely token-hash collision.
///
/// Returns the raw token so the caller can set the session cookie; only the
/// hash is stored.
pub(crate) async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    let query = r"
        INSERT INTO sessions (user_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(&token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a session hash to its user; only unexpired sessions qualify.
pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT users.id, users.name, users.email, users.role
        FROM sessions
        JOIN users ON users.id = sessions.user_id
        WHERE sessions.session_hash = $1
          AND sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    row.map(|row| {
        let role: String = row.get("role");
        Ok(SessionRecord {
            user_id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            role: role_from_row(&role)?,
        })
    })
    .transpose()
}

/// Logout is idempotent; it's fine if no rows are deleted.
pub(crate) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    let query = "DELETE FROM sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}
