//! Account handlers and supporting modules.
//!
//! This module coordinates registration, login, email verification, password
//! reset, and session management.
//!
//! ## Verification tokens
//!
//! Verification and reset links share one token store. A token is an opaque
//! random value with a one-hour expiry; issuing a new token for an email
//! replaces the previous one inside a single transaction, so at most one is
//! live per address. Tokens are single use and are deleted when consumed.
//!
//! ## Sessions
//!
//! Session tokens travel in an `HttpOnly` cookie; only a SHA-256 hash is
//! stored server-side.

mod authenticator;
pub(crate) mod flow;
pub(crate) mod login;
mod password;
pub(crate) mod register;
pub(crate) mod reset;
pub(crate) mod service;
pub(crate) mod session;
mod state;
mod storage;
#[cfg(test)]
mod tests;
pub(crate) mod types;
mod utils;
pub(crate) mod validate;
pub(crate) mod verify;

pub use authenticator::{AuthAttempt, AuthRejection, PgSessionAuthenticator, Session, SessionAuthenticator};
pub use state::{AuthConfig, AuthState};
