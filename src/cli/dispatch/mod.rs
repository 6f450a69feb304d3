//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches)?;

    Ok(Action::Server(Box::new(Args {
        port,
        dsn,
        frontend_base_url: auth_opts.frontend_base_url,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        resend_api_key: email_opts.resend_api_key,
        email_from: email_opts.email_from,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn dsn_required() {
        temp_env::with_vars([("BAKULAN_DSN", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let result = command.try_get_matches_from(vec!["bakulan"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn server_action_built_from_matches() {
        temp_env::with_vars(
            [
                ("BAKULAN_DSN", Some("postgres://user@localhost:5432/bakulan")),
                ("BAKULAN_PORT", Some("9090")),
                ("BAKULAN_FRONTEND_BASE_URL", Some("https://bakulan.app")),
                ("BAKULAN_RESEND_API_KEY", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["bakulan"]);
                let action = handler(&matches).expect("action");
                let Action::Server(args) = action;
                assert_eq!(args.port, 9090);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/bakulan");
                assert_eq!(args.frontend_base_url, "https://bakulan.app");
                assert_eq!(args.token_ttl_seconds, 3600);
                assert!(args.resend_api_key.is_none());
            },
        );
    }
}
