//! Finite-state machines for the registration and reset wizards.
//!
//! The states and transitions are decoupled from any rendering concern; the
//! frontend mirrors them, and the root handler uses [`ResetFlow::from_query`]
//! to resolve deep links into a concrete step.

use super::types::Role;

/// Registration wizard: pick a role, fill the form, submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFlow {
    RoleSelect,
    FormFill(Role),
    Submit(Role),
}

impl RegisterFlow {
    #[must_use]
    pub const fn start() -> Self {
        Self::RoleSelect
    }

    /// Choosing a role moves the wizard forward; choosing again while
    /// filling the form switches the role in place.
    #[must_use]
    pub const fn choose_role(self, role: Role) -> Self {
        match self {
            Self::RoleSelect | Self::FormFill(_) => Self::FormFill(role),
            Self::Submit(_) => self,
        }
    }

    #[must_use]
    pub const fn submit(self) -> Self {
        match self {
            Self::FormFill(role) => Self::Submit(role),
            Self::RoleSelect | Self::Submit(_) => self,
        }
    }

    /// Going back from the form discards the chosen role.
    #[must_use]
    pub const fn back(self) -> Self {
        match self {
            Self::FormFill(_) => Self::RoleSelect,
            Self::RoleSelect | Self::Submit(_) => self,
        }
    }
}

/// Reset wizard: request an email, acknowledge it was sent, set a new
/// password. The last step can be entered directly via the emailed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetFlow {
    RequestEmail,
    EmailSentAck,
    SetNewPassword { token: String },
}

impl ResetFlow {
    #[must_use]
    pub const fn start() -> Self {
        Self::RequestEmail
    }

    #[must_use]
    pub fn email_sent(self) -> Self {
        match self {
            Self::RequestEmail => Self::EmailSentAck,
            other => other,
        }
    }

    /// The emailed deep link jumps straight to the final step.
    #[must_use]
    pub fn open_with_token(token: String) -> Self {
        Self::SetNewPassword { token }
    }

    /// Resolve query parameters like `?auth=reset-password&token=abc` into a
    /// flow step. Anything else means the wizard starts at the beginning.
    #[must_use]
    pub fn from_query<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut dialog = None;
        let mut token = None;
        for (key, value) in pairs {
            match key {
                "auth" => dialog = Some(value),
                "token" => token = Some(value),
                _ => {}
            }
        }
        match (dialog, token) {
            (Some("reset-password"), Some(token)) if !token.is_empty() => {
                Self::SetNewPassword {
                    token: token.to_string(),
                }
            }
            _ => Self::start(),
        }
    }
}
