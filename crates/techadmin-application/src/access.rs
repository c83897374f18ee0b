//! Access gate derived from session and role state.

use crate::role_resolver::RoleState;
use crate::session_store::AuthSnapshot;

/// What the console may show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    /// Startup session restore has not resolved
    Loading,
    /// Nobody is signed in; show the sign-in form
    SignedOut,
    /// Signed in, roles for this user are still being looked up
    ResolvingRoles { email: Option<String> },
    /// Signed in without the admin role; only sign-out is offered
    NotAuthorized { email: Option<String> },
    /// Signed in as an admin; the technique panel is reachable
    Admin { email: Option<String> },
}

impl AccessState {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// The signed-in email, if anyone is signed in.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::ResolvingRoles { email }
            | Self::NotAuthorized { email }
            | Self::Admin { email } => email.as_deref(),
            Self::Loading | Self::SignedOut => None,
        }
    }

    /// Whether the state can still change without user action.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading | Self::ResolvingRoles { .. })
    }
}

/// Combines session and role state into one access decision.
///
/// Roles only count when they belong to the session's current user, so a
/// role set left over from a previous identity never grants access.
pub fn access_state(auth: &AuthSnapshot, roles: &RoleState) -> AccessState {
    if auth.loading {
        return AccessState::Loading;
    }

    let Some(session) = auth.session.as_ref() else {
        return AccessState::SignedOut;
    };

    let email = session.email().map(str::to_string);
    if roles.user_id.as_deref() != Some(session.user_id()) || roles.resolving {
        return AccessState::ResolvingRoles { email };
    }

    if roles.is_admin() {
        AccessState::Admin { email }
    } else {
        AccessState::NotAuthorized { email }
    }
}
