use std::future::Future;

use super::extractor::CurrentUser;
use super::types::{Account, NewSession, UserProfile, UserSettings};
use crate::instance::{InstanceConfig, InstanceStatus};
use crate::magic::MagicToken;
use crate::types::{Email, SessionId, UserId, Workspace};

/// Consumer-provided account lookup and creation.
///
/// Called during the magic-code flows to resolve the submitted email to an
/// account, or to create one on sign-up.
///
/// # Example
///
/// ```rust,ignore
/// impl AccountStore for MyAppState {
///     async fn find_by_email(
///         &self,
///         email: &Email,
///     ) -> Result<Option<Account>, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(self.repo.account_by_email(email.as_str()).await?)
///     }
///
///     async fn create(
///         &self,
///         email: &Email,
///     ) -> Result<Account, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(self.repo.create_account(email.as_str()).await?)
///     }
/// }
/// ```
pub trait AccountStore: Send + Sync + 'static {
    /// Look up an account by its normalized email.
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Account>, Box<dyn std::error::Error + Send + Sync>>>
           + Send;

    /// Create a fresh account for a verified email.
    ///
    /// Accounts created here have no password yet, so `is_password_autoset`
    /// should come back `true`.
    fn create(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Account, Box<dyn std::error::Error + Send + Sync>>> + Send;
}

/// Consumer-provided session persistence.
///
/// Sessions are identified by opaque [`SessionId`]s; the consumer chooses the
/// ID format (ULID, UUID, etc.).
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for MyAppState {
///     async fn create(&self, session: NewSession) -> Result<SessionId, ...> {
///         let id = Ulid::new().to_string();
///         self.db.insert_session(&id, &session).await?;
///         Ok(SessionId(id))
///     }
///
///     async fn find(&self, session_id: &SessionId) -> Result<Option<CurrentUser>, ...> {
///         self.db.find_session(session_id).await
///     }
///
///     async fn delete(&self, session_id: &SessionId) -> Result<(), ...> {
///         self.db.delete_session(session_id).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new session. Returns the session ID.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionId, Box<dyn std::error::Error + Send + Sync>>> + Send;

    /// Look up a session by ID. Returns the signed-in user if the session is
    /// still valid.
    fn find(
        &self,
        session_id: &SessionId,
    ) -> impl Future<
        Output = Result<Option<CurrentUser>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;

    /// Delete a session (sign-out).
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}

/// Consumer-provided profile reads for the render gate.
pub trait ProfileSource: Send + Sync + 'static {
    /// Fetch the user's profile. `None` means no profile row exists yet,
    /// which the gate reads as not onboarded.
    fn fetch_profile(
        &self,
        user_id: &UserId,
    ) -> impl Future<
        Output = Result<Option<UserProfile>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;
}

/// Consumer-provided workspace reads for the render gate.
pub trait WorkspaceSource: Send + Sync + 'static {
    /// Fetch every workspace the user is a member of.
    fn fetch_workspaces(
        &self,
        user_id: &UserId,
    ) -> impl Future<
        Output = Result<Vec<Workspace>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;

    /// Fetch the user's workspace preferences.
    fn fetch_settings(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<UserSettings, Box<dyn std::error::Error + Send + Sync>>>
           + Send;
}

/// Consumer-provided instance state reads.
pub trait InstanceSource: Send + Sync + 'static {
    /// Fetch the deployment record. `None` means the instance has never been
    /// set up, which blocks every credential flow.
    fn fetch_status(
        &self,
    ) -> impl Future<
        Output = Result<Option<InstanceStatus>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;

    /// Fetch the current provider flags.
    fn fetch_config(
        &self,
    ) -> impl Future<Output = Result<InstanceConfig, Box<dyn std::error::Error + Send + Sync>>>
           + Send;
}

/// Consumer-provided delivery of one-time sign-in codes.
///
/// Usually an email sender. The code must reach the address unmodified; the
/// flow compares the submitted string byte for byte.
pub trait MagicLinkSender: Send + Sync + 'static {
    fn deliver(
        &self,
        email: &Email,
        token: &MagicToken,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}
