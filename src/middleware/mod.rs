//! Plug-and-play access gating and magic-code sign-in for Axum.
//!
//! Two halves share one [`GateConfig`]:
//!
//! - [`auth_routes()`] mounts the credential flows (code generation,
//!   sign-in, sign-up, sign-out);
//! - the guards ([`RequireAuthenticated`], [`RequireAnonymous`],
//!   [`RequireOnboarding`]) enforce page access on your own routes,
//!   redirecting instead of rendering when the visitor does not belong.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use slate_access::middleware::{GateConfig, GateState, auth_routes};
//!
//! // 1. Implement the store traits for your app
//! // 2. Configure from environment
//! let config = GateConfig::from_env()?;
//!
//! // 3. Build guard state and mount the credential routes
//! let gate = GateState::new(&config, store.clone(), store.clone(), store.clone());
//! let app = axum::Router::new()
//!     .route("/{workspace_slug}", axum::routing::get(workspace_home))
//!     .with_state(AppState { gate })
//!     .merge(auth_routes(config, store.clone(), store, instance, mailer));
//!
//! // 4. Guard handlers with extractors
//! async fn workspace_home(
//!     RequireAuthenticated(user): RequireAuthenticated,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}", user.email)
//! }
//! ```

mod cache;
mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod state;
mod traits;
mod types;

pub use cache::{AttemptsExhausted, MagicCodeCache, RedeemError};
pub use config::GateConfig;
pub use error::{FlowErrorCode, GateError};
pub use extractor::{CurrentUser, RequireAnonymous, RequireAuthenticated, RequireOnboarding};
pub use routes::auth_routes;
pub use state::GateState;
pub use traits::{
    AccountStore, InstanceSource, MagicLinkSender, ProfileSource, SessionStore, WorkspaceSource,
};
pub use types::{Account, NewSession, UserProfile, UserSettings};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
