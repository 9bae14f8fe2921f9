use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::cache::MagicCodeCache;
use super::config::{GateConfig, GateSettings};
use super::extractor::{ProfileSourceDyn, SessionSourceDyn, WorkspaceSourceDyn};
use super::traits::{
    AccountStore, InstanceSource, MagicLinkSender, ProfileSource, SessionStore, WorkspaceSource,
};

/// Shared state for credential route handlers.
pub(super) struct AuthState<A, S, I, M> {
    pub(super) accounts: Arc<A>,
    pub(super) sessions: Arc<S>,
    pub(super) instance: Arc<I>,
    pub(super) sender: Arc<M>,
    pub(super) codes: Arc<MagicCodeCache>,
    pub(super) settings: GateSettings,
}

// Manual Clone: avoid derive adding bounds on the store parameters.
impl<A, S, I, M> Clone for AuthState<A, S, I, M> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            sessions: self.sessions.clone(),
            instance: self.instance.clone(),
            sender: self.sender.clone(),
            codes: self.codes.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<A: AccountStore, S: SessionStore, I: InstanceSource, M: MagicLinkSender>
    FromRef<AuthState<A, S, I, M>> for Key
{
    fn from_ref(state: &AuthState<A, S, I, M>) -> Self {
        state.settings.cookie_key.clone()
    }
}

/// Shared state for the page guards.
///
/// Build one next to your application state and expose it with
/// [`FromRef`] so the guards can reach it from any handler:
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct AppState {
///     gate: GateState,
///     // ...
/// }
///
/// impl FromRef<AppState> for GateState {
///     fn from_ref(app: &AppState) -> Self {
///         app.gate.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct GateState {
    pub(super) sessions: Arc<dyn SessionSourceDyn>,
    pub(super) profiles: Arc<dyn ProfileSourceDyn>,
    pub(super) workspaces: Arc<dyn WorkspaceSourceDyn>,
    pub(super) settings: GateSettings,
}

impl GateState {
    /// Build guard state sharing the settings of `config`.
    ///
    /// The same config should then be handed to
    /// [`auth_routes()`](super::auth_routes) so cookie key and paths agree.
    pub fn new<S, P, W>(config: &GateConfig, sessions: S, profiles: P, workspaces: W) -> Self
    where
        S: SessionStore,
        P: ProfileSource,
        W: WorkspaceSource,
    {
        Self {
            sessions: Arc::new(sessions),
            profiles: Arc::new(profiles),
            workspaces: Arc::new(workspaces),
            settings: config.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<GateState> for Key {
    fn from_ref(state: &GateState) -> Self {
        state.settings.cookie_key.clone()
    }
}
