//! Account flow tests against a containerized Postgres.

use super::authenticator::PgSessionAuthenticator;
use super::service::{self, AuthContext, LoginOutcome, RegisterOutcome};
use super::state::{AuthConfig, AuthState};
use super::storage::{
    SignupOutcome, consume_verification_token, insert_user_and_token, issue_verification_token,
    lookup_session, lookup_token_by_email, lookup_user_by_email, reset_password_with_token,
};
use super::types::{LoginRequest, RegisterRequest, Role};
use super::utils::hash_session_token;
use crate::api::email::{EmailMessage, EmailSender};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::{Connection, PgConnection, PgPool, Row, postgres::PgPoolOptions};
use std::sync::Arc;
use test_support::{TestNetwork, postgres::PostgresContainer, runtime};

const BAKULAN_SCHEMA_SQL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/sql/01_bakulan.sql"));

struct TestDb {
    _postgres: PostgresContainer,
    pool: PgPool,
}

impl TestDb {
    async fn new() -> Result<Self> {
        if let Err(err) = runtime::ensure_container_runtime() {
            eprintln!("Skipping integration test: {err}");
            return Err(err);
        }

        let network = TestNetwork::new("bakulan-auth");
        let postgres = PostgresContainer::start(network.name()).await?;
        postgres.wait_until_ready().await?;
        apply_schema(&postgres).await?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&postgres.admin_dsn())
            .await
            .context("failed to connect test pool")?;

        Ok(Self {
            _postgres: postgres,
            pool,
        })
    }
}

async fn apply_schema(postgres: &PostgresContainer) -> Result<()> {
    let mut connection = PgConnection::connect(&postgres.admin_dsn())
        .await
        .context("failed to connect for schema setup")?;

    for (index, statement) in split_sql_statements(BAKULAN_SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut connection)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        current.push_str(line);
        current.push('\n');

        if line.trim().ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

struct NullEmailSender;

#[async_trait]
impl EmailSender for NullEmailSender {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        Ok(())
    }
}

struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        bail!("mail provider unavailable")
    }
}

fn test_state(mailer: Arc<dyn EmailSender>) -> AuthState {
    AuthState::new(
        AuthConfig::new("http://localhost:3000".to_string()).with_token_ttl_seconds(60),
        mailer,
        Arc::new(PgSessionAuthenticator),
    )
}

fn register_request(name: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: "password1".to_string(),
        role: Role::Cashier,
    }
}

async fn count_by_email(pool: &PgPool, query: &str, email: &str) -> Result<i64> {
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .await
        .context("failed to count rows")?;
    Ok(row.get(0))
}

async fn count_sessions(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await
        .context("failed to count sessions")?;
    Ok(row.get(0))
}

#[tokio::test]
async fn concurrent_signup_keeps_email_unique() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let email = "alice@example.com";
    let task_one = insert_user_and_token(&db.pool, "Alice", email, "hash", Role::Cashier, 60);
    let task_two = insert_user_and_token(&db.pool, "Alice", email, "hash", Role::Cashier, 60);

    let (result_one, result_two) = tokio::join!(task_one, task_two);
    let outcomes = [result_one?, result_two?];
    let created = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, SignupOutcome::Created { .. }))
        .count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, SignupOutcome::Conflict))
        .count();

    assert_eq!(created, 1);
    assert_eq!(conflicts, 1);

    let users = count_by_email(&db.pool, "SELECT COUNT(*) FROM users WHERE email = $1", email).await?;
    assert_eq!(users, 1);

    Ok(())
}

#[tokio::test]
async fn reissue_replaces_the_live_token() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let email = "bob@example.com";
    let SignupOutcome::Created { token: first } =
        insert_user_and_token(&db.pool, "Bob Smith", email, "hash", Role::Admin, 60).await?
    else {
        bail!("unexpected conflict");
    };

    let second = issue_verification_token(&db.pool, email, 60).await?;
    assert_ne!(first, second);

    let tokens = count_by_email(
        &db.pool,
        "SELECT COUNT(*) FROM verification_tokens WHERE email = $1",
        email,
    )
    .await?;
    assert_eq!(tokens, 1);

    let live = lookup_token_by_email(&db.pool, email)
        .await?
        .context("missing live token")?;
    assert_eq!(live.token, second);

    Ok(())
}

#[tokio::test]
async fn reset_token_is_single_use() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let email = "carol@example.com";
    let SignupOutcome::Created { token } =
        insert_user_and_token(&db.pool, "Carol", email, "hash", Role::Cashier, 60).await?
    else {
        bail!("unexpected conflict");
    };

    assert!(reset_password_with_token(&db.pool, &token, "new-hash").await?);
    assert!(!reset_password_with_token(&db.pool, &token, "other-hash").await?);

    let user = lookup_user_by_email(&db.pool, email)
        .await?
        .context("missing user")?;
    assert_eq!(user.password_hash.as_deref(), Some("new-hash"));

    Ok(())
}

#[tokio::test]
async fn verification_token_is_single_use() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let email = "dave@example.com";
    let SignupOutcome::Created { token } =
        insert_user_and_token(&db.pool, "Dave", email, "hash", Role::Cashier, 60).await?
    else {
        bail!("unexpected conflict");
    };

    assert!(consume_verification_token(&db.pool, &token).await?);
    let user = lookup_user_by_email(&db.pool, email)
        .await?
        .context("missing user")?;
    assert!(user.email_verified);

    assert!(!consume_verification_token(&db.pool, &token).await?);

    Ok(())
}

#[tokio::test]
async fn unverified_login_sends_confirmation_and_opens_no_session() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let state = test_state(Arc::new(NullEmailSender));
    let ctx = AuthContext {
        pool: &db.pool,
        state: &state,
    };

    let email = "erin@example.com";
    let outcome = service::register(&ctx, &register_request("Erin", email)).await?;
    assert!(matches!(outcome, RegisterOutcome::Registered));

    let request = LoginRequest {
        email: email.to_string(),
        password: "password1".to_string(),
    };
    let outcome = service::login(&ctx, &request).await?;
    assert!(matches!(outcome, LoginOutcome::ConfirmationSent));

    assert_eq!(count_sessions(&db.pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn confirmation_dispatch_failure_keeps_the_token_live() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let state = test_state(Arc::new(NullEmailSender));
    let ctx = AuthContext {
        pool: &db.pool,
        state: &state,
    };
    let email = "frank@example.com";
    let outcome = service::register(&ctx, &register_request("Frank", email)).await?;
    assert!(matches!(outcome, RegisterOutcome::Registered));

    let failing = test_state(Arc::new(FailingEmailSender));
    let ctx = AuthContext {
        pool: &db.pool,
        state: &failing,
    };
    let request = LoginRequest {
        email: email.to_string(),
        password: "password1".to_string(),
    };
    let outcome = service::login(&ctx, &request).await?;
    assert!(matches!(outcome, LoginOutcome::ProviderFailed));

    // The dispatch failure is reported as an outcome and the token survives
    // for the next attempt.
    assert!(lookup_token_by_email(&db.pool, email).await?.is_some());
    assert_eq!(count_sessions(&db.pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn register_verify_login_end_to_end() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let state = test_state(Arc::new(NullEmailSender));
    let ctx = AuthContext {
        pool: &db.pool,
        state: &state,
    };

    let email = "grace@example.com";
    let outcome = service::register(&ctx, &register_request("Grace", email)).await?;
    assert!(matches!(outcome, RegisterOutcome::Registered));

    let token = lookup_token_by_email(&db.pool, email)
        .await?
        .context("missing verification token")?;
    assert!(consume_verification_token(&db.pool, &token.token).await?);

    let request = LoginRequest {
        email: email.to_string(),
        password: "password1".to_string(),
    };
    let LoginOutcome::LoggedIn(session) = service::login(&ctx, &request).await? else {
        bail!("expected a session");
    };

    let user = lookup_user_by_email(&db.pool, email)
        .await?
        .context("missing user")?;
    assert_eq!(session.user_id, user.id);
    assert!(user.email_verified);

    let record = lookup_session(&db.pool, &hash_session_token(&session.token))
        .await?
        .context("missing session record")?;
    assert_eq!(record.user_id, user.id);
    assert_eq!(record.email, email);
    assert_eq!(record.role, Role::Cashier);

    Ok(())
}
