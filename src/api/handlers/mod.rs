//! API handlers for the account service.

pub mod auth;
pub mod health;
pub mod root;
