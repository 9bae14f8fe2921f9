use crate::redirect::sanitize_next_path;
use crate::types::{RedirectTarget, UserId, Workspace, WorkspaceSlug};

/// Where anonymous visitors are sent when a page needs a signed-in user.
pub const SIGN_IN_PATH: &str = "/accounts/sign-in";
/// Where signed-in users go until they finish account setup.
pub const ONBOARDING_PATH: &str = "/onboarding";
/// Landing page when no workspace can be resolved for the user.
pub const PROFILE_PATH: &str = "/profile";

/// Access-control category assigned to a page.
///
/// Fixed per page and supplied by the caller; the gate never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageAccess {
    /// Anyone may view the page.
    Public,
    /// Only anonymous visitors; signed-in users are redirected away.
    NonAuthenticated,
    /// Signed-in users mid-onboarding; everyone else is redirected.
    Onboarding,
    /// Signed-in, fully onboarded users only.
    Authenticated,
}

/// Session identity as observed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub is_loading: bool,
    pub current_user: Option<UserId>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, current_user: None }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { is_loading: false, current_user: Some(user) }
    }
}

/// Profile data as observed by the caller. `is_onboarded` is `None` until the
/// profile has been fetched (or when no profile exists).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSnapshot {
    pub is_loading: bool,
    pub is_onboarded: Option<bool>,
}

impl ProfileSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, is_onboarded: None }
    }

    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn onboarded(flag: bool) -> Self {
        Self { is_loading: false, is_onboarded: Some(flag) }
    }
}

/// The workspaces the user belongs to, as observed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceSnapshot {
    pub is_loading: bool,
    pub workspaces: Vec<Workspace>,
}

impl WorkspaceSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, workspaces: Vec::new() }
    }

    #[must_use]
    pub fn loaded(workspaces: Vec<Workspace>) -> Self {
        Self { is_loading: false, workspaces }
    }
}

/// Per-user workspace preferences, as observed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsSnapshot {
    pub is_loading: bool,
    pub last_workspace_slug: Option<WorkspaceSlug>,
    pub fallback_workspace_slug: Option<WorkspaceSlug>,
}

impl SettingsSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, ..Self::default() }
    }

    #[must_use]
    pub fn loaded(
        last_workspace_slug: Option<WorkspaceSlug>,
        fallback_workspace_slug: Option<WorkspaceSlug>,
    ) -> Self {
        Self { is_loading: false, last_workspace_slug, fallback_workspace_slug }
    }
}

/// Everything one evaluation reads: four immutable snapshots plus the
/// caller-supplied `next_path` candidate from the query string.
#[derive(Debug, Clone, Default)]
pub struct GateInputs {
    pub session: SessionSnapshot,
    pub profile: ProfileSnapshot,
    pub workspaces: WorkspaceSnapshot,
    pub settings: SettingsSnapshot,
    pub next_path: Option<String>,
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Show the page's content.
    Render,
    /// Navigate to the target instead of showing the page.
    Redirect(RedirectTarget),
    /// At least one input is still loading; decide nothing yet.
    Pending,
}

/// Decides whether a page renders, redirects, or waits.
///
/// Pure function of its inputs: callers re-invoke it whenever any observed
/// state changes and perform the navigation side effect themselves. No
/// decision other than [`Decision::Pending`] is made while any snapshot is
/// still loading, so a redirect is never issued on partial data.
///
/// ```
/// use slate_access::gate::{self, Decision, GateInputs, PageAccess};
///
/// let decision = gate::evaluate(PageAccess::Authenticated, &GateInputs::default());
/// assert_eq!(decision, Decision::Redirect(gate::SIGN_IN_PATH.into()));
/// ```
#[must_use]
pub fn evaluate(page: PageAccess, inputs: &GateInputs) -> Decision {
    if inputs.session.is_loading
        || inputs.profile.is_loading
        || inputs.workspaces.is_loading
        || inputs.settings.is_loading
    {
        return Decision::Pending;
    }

    let user = inputs.session.current_user.as_ref();
    let onboarded = inputs.profile.is_onboarded.unwrap_or(false);

    match page {
        PageAccess::Public => Decision::Render,
        PageAccess::NonAuthenticated => match user {
            None => Decision::Render,
            Some(_) if onboarded => Decision::Redirect(workspace_target(inputs)),
            Some(_) => Decision::Redirect(RedirectTarget::new(ONBOARDING_PATH)),
        },
        PageAccess::Onboarding => match user {
            None => Decision::Redirect(RedirectTarget::new(SIGN_IN_PATH)),
            Some(_) if onboarded => Decision::Redirect(workspace_target(inputs)),
            Some(_) => Decision::Render,
        },
        PageAccess::Authenticated => match user {
            None => Decision::Redirect(RedirectTarget::new(SIGN_IN_PATH)),
            Some(_) if onboarded => Decision::Render,
            Some(_) => Decision::Redirect(workspace_target(inputs)),
        },
    }
}

/// Resolves where a signed-in user lands when pushed off a page.
///
/// Tie-break order, first match wins:
/// 1. a non-empty, well-formed `next_path` that passes the open-redirect
///    check, verbatim;
/// 2. the last (then fallback) workspace slug, if the user is actually a
///    member of that workspace, as `/{slug}`;
/// 3. [`PROFILE_PATH`].
#[must_use]
pub fn workspace_target(inputs: &GateInputs) -> RedirectTarget {
    if let Some(next) = sanitize_next_path(inputs.next_path.as_deref()) {
        return RedirectTarget::new(next);
    }

    let slug = [
        inputs.settings.last_workspace_slug.as_ref(),
        inputs.settings.fallback_workspace_slug.as_ref(),
    ]
    .into_iter()
    .flatten()
    .find(|slug| !slug.as_str().is_empty());

    if let Some(slug) = slug {
        if inputs.workspaces.workspaces.iter().any(|w| &w.slug == slug) {
            return RedirectTarget::new(format!("/{slug}"));
        }
    }

    RedirectTarget::new(PROFILE_PATH)
}
