//! # Bakulan Account Service
//!
//! `bakulan` is the account and authentication backend for the Bakulan point
//! of sale. It exposes the operations the storefront invokes as server
//! actions: registration, login/logout, session display, email verification,
//! and password reset, plus the transactional email dispatch behind them.
//!
//! ## Accounts & Verification
//!
//! Users register with a display name, email, password, and a role
//! (`Admin` or `Cashier`). Accounts start unverified; a single-use,
//! time-bounded verification token is emailed on registration and re-issued
//! on any login attempt against an unverified account. Login never
//! authenticates an unverified account.
//!
//! - **Email Normalization:** Emails are trimmed and lowercased before any
//!   lookup or uniqueness check.
//! - **One Live Token:** At most one verification token exists per email;
//!   issuing a new one atomically replaces the previous one.
//! - **Single Use:** Tokens are deleted when consumed by a password reset or
//!   email verification.
//!
//! ## Sessions
//!
//! Sessions are issued by an explicit [`api::handlers::auth::SessionAuthenticator`]
//! and travel as an `HttpOnly` cookie; the database only ever stores a hash
//! of the session token. Nothing reads authentication from global state:
//! every account operation receives an explicit context and returns the
//! session (or its absence) as a value.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
