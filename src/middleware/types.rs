use crate::types::{Email, UserId, WorkspaceSlug};

/// Session data captured at sign-in time.
///
/// Passed to [`SessionStore::create`](super::SessionStore::create) for the
/// consumer to persist. `user_agent` and `ip_address` come straight from the
/// request headers and are for audit trails only.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// User the session belongs to.
    pub user_id: UserId,
    /// Normalized email the user signed in with.
    pub email: Email,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
}

/// Account facts the credential flows branch on.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: UserId,
    /// True while the account has never had a password chosen by the user.
    pub is_password_autoset: bool,
    pub is_onboarded: bool,
}

/// Profile slice backing the onboarding check.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserProfile {
    pub is_onboarded: bool,
}

/// Per-user workspace preferences.
///
/// Either slug may point at a workspace the user no longer belongs to; the
/// gate treats such slugs as absent.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    pub last_workspace_slug: Option<WorkspaceSlug>,
    pub fallback_workspace_slug: Option<WorkspaceSlug>,
}
