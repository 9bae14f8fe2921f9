use axum::extract::{FromRef, FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::cookies;
use super::error::GateError;
use super::state::GateState;
use super::types::{UserProfile, UserSettings};
use crate::gate::{
    self, Decision, GateInputs, PageAccess, ProfileSnapshot, SessionSnapshot, SettingsSnapshot,
    WorkspaceSnapshot,
};
use crate::types::{Email, SessionId, UserId};

/// Signed-in user resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Session ID (from cookie).
    pub session_id: SessionId,
    /// User the session belongs to.
    pub user_id: UserId,
    /// Normalized email the session was opened with.
    pub email: Email,
}

/// Guard for pages only signed-in, onboarded users may view.
///
/// Anonymous visitors are redirected to the sign-in page. Signed-in users
/// still in onboarding are pushed to their workspace resolution.
///
/// # Example
///
/// ```rust,ignore
/// async fn workspace_home(
///     RequireAuthenticated(user): RequireAuthenticated,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuthenticated(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuthenticated
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let (user, inputs) = observe(&gate, parts).await;

        match gate::evaluate(PageAccess::Authenticated, &inputs) {
            Decision::Render => {
                Ok(Self(user.expect("render on an authenticated page implies a user")))
            }
            Decision::Redirect(target) => Err(GateError::Redirect(target)),
            Decision::Pending => unreachable!("request snapshots are fully loaded"),
        }
    }
}

/// Guard for pages only anonymous visitors may view (sign-in, sign-up).
///
/// Signed-in users are pushed to onboarding or to their workspace, honoring
/// a safe `next_path` query parameter when one is present.
#[derive(Debug, Clone, Copy)]
pub struct RequireAnonymous;

impl<S> FromRequestParts<S> for RequireAnonymous
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let (_, inputs) = observe(&gate, parts).await;

        match gate::evaluate(PageAccess::NonAuthenticated, &inputs) {
            Decision::Render => Ok(Self),
            Decision::Redirect(target) => Err(GateError::Redirect(target)),
            Decision::Pending => unreachable!("request snapshots are fully loaded"),
        }
    }
}

/// Guard for the onboarding flow: signed-in users who have not finished
/// setup. Everyone else is redirected away.
#[derive(Debug, Clone)]
pub struct RequireOnboarding(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireOnboarding
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let (user, inputs) = observe(&gate, parts).await;

        match gate::evaluate(PageAccess::Onboarding, &inputs) {
            Decision::Render => {
                Ok(Self(user.expect("render on the onboarding page implies a user")))
            }
            Decision::Redirect(target) => Err(GateError::Redirect(target)),
            Decision::Pending => unreachable!("request snapshots are fully loaded"),
        }
    }
}

#[derive(Deserialize)]
struct NextPathQuery {
    next_path: Option<String>,
}

/// Resolve every gate input for this request.
///
/// Store failures degrade to the anonymous or absent reading instead of
/// failing the page; the gate then redirects conservatively.
async fn observe(gate: &GateState, parts: &mut Parts) -> (Option<CurrentUser>, GateInputs) {
    let session_id = match PrivateCookieJar::from_request_parts(parts, gate).await {
        Ok(jar) => cookies::get_session_id(&jar, &gate.settings.session_cookie_name),
        Err(_) => None,
    };

    let user = match &session_id {
        Some(id) => match gate.sessions.find_dyn(id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                None
            }
        },
        None => None,
    };

    let next_path = Query::<NextPathQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.next_path);

    let Some(current) = user else {
        let inputs = GateInputs {
            session: SessionSnapshot::anonymous(),
            profile: ProfileSnapshot::absent(),
            workspaces: WorkspaceSnapshot::loaded(Vec::new()),
            settings: SettingsSnapshot::loaded(None, None),
            next_path,
        };
        return (None, inputs);
    };

    let profile = match gate.profiles.fetch_profile_dyn(&current.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "Profile fetch failed");
            None
        }
    };

    let workspaces = match gate.workspaces.fetch_workspaces_dyn(&current.user_id).await {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, "Workspace fetch failed");
            Vec::new()
        }
    };

    let settings = match gate.workspaces.fetch_settings_dyn(&current.user_id).await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "Settings fetch failed");
            UserSettings::default()
        }
    };

    let inputs = GateInputs {
        session: SessionSnapshot::signed_in(current.user_id.clone()),
        profile: match profile {
            Some(UserProfile { is_onboarded }) => ProfileSnapshot::onboarded(is_onboarded),
            None => ProfileSnapshot::absent(),
        },
        workspaces: WorkspaceSnapshot::loaded(workspaces),
        settings: SettingsSnapshot::loaded(
            settings.last_workspace_slug,
            settings.fallback_workspace_slug,
        ),
        next_path,
    };
    (Some(current), inputs)
}

/// Object-safe wrapper for the read side of SessionStore (needed for Arc<dyn>).
pub(super) trait SessionSourceDyn: Send + Sync {
    fn find_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Option<CurrentUser>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    >;
}

impl<T: super::traits::SessionStore> SessionSourceDyn for T {
    fn find_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Option<CurrentUser>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    > {
        Box::pin(self.find(session_id))
    }
}

/// Object-safe wrapper for ProfileSource (needed for Arc<dyn>).
pub(super) trait ProfileSourceDyn: Send + Sync {
    fn fetch_profile_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Option<UserProfile>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    >;
}

impl<T: super::traits::ProfileSource> ProfileSourceDyn for T {
    fn fetch_profile_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Option<UserProfile>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    > {
        Box::pin(self.fetch_profile(user_id))
    }
}

/// Object-safe wrapper for WorkspaceSource (needed for Arc<dyn>).
pub(super) trait WorkspaceSourceDyn: Send + Sync {
    fn fetch_workspaces_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Vec<crate::types::Workspace>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    >;

    fn fetch_settings_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<UserSettings, Box<dyn std::error::Error + Send + Sync>>,
                > + Send
                + 'a,
        >,
    >;
}

impl<T: super::traits::WorkspaceSource> WorkspaceSourceDyn for T {
    fn fetch_workspaces_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<
                        Vec<crate::types::Workspace>,
                        Box<dyn std::error::Error + Send + Sync>,
                    >,
                > + Send
                + 'a,
        >,
    > {
        Box::pin(self.fetch_workspaces(user_id))
    }

    fn fetch_settings_dyn<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<UserSettings, Box<dyn std::error::Error + Send + Sync>>,
                > + Send
                + 'a,
        >,
    > {
        Box::pin(self.fetch_settings(user_id))
    }
}
