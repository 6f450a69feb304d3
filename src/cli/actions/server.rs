use crate::api::{
    self,
    email::{EmailSender, LogEmailSender, ResendEmailSender},
    handlers::auth::{AuthConfig, PgSessionAuthenticator, SessionAuthenticator},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the database connection or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.frontend_base_url)
        .with_token_ttl_seconds(args.token_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds);

    let mailer: Arc<dyn EmailSender> = match args.resend_api_key {
        Some(api_key) => Arc::new(ResendEmailSender::new(api_key, &args.email_from)?),
        None => {
            info!("No mail provider API key configured; logging outbound email");
            Arc::new(LogEmailSender)
        }
    };

    let authenticator: Arc<dyn SessionAuthenticator> = Arc::new(PgSessionAuthenticator);

    api::new(args.port, args.dsn, config, mailer, authenticator).await
}
