use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use super::cache::MagicCodeCache;
use super::error::GateError;
use crate::gate;

/// Shared gate settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct GateSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_days: i64,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) sign_in_path: String,
    pub(crate) set_password_path: String,
    pub(crate) landing_path: String,
    pub(crate) sign_out_redirect: String,
}

impl GateSettings {
    pub(super) fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "__slate_session".into(),
            session_ttl_days: 30,
            secure_cookies: true,
            auth_path: "/auth".into(),
            sign_in_path: gate::SIGN_IN_PATH.into(),
            set_password_path: "/accounts/set-password".into(),
            landing_path: "/".into(),
            sign_out_redirect: "/".into(),
        }
    }
}

/// Access gate configuration.
///
/// Everything has a sensible default, including an ephemeral cookie key.
/// Deployments that must survive restarts without dropping sessions should
/// set a stable key via [`with_cookie_key()`](GateConfig::with_cookie_key)
/// or the `COOKIE_KEY` env var.
///
/// Use [`from_env()`](GateConfig::from_env) for convention-based setup, or
/// [`new()`](GateConfig::new) with `with_*` methods for full control.
pub struct GateConfig {
    pub(super) settings: GateSettings,
    pub(super) magic_cache: Option<Arc<MagicCodeCache>>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfig {
    /// Create config with defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: GateSettings::defaults(),
            magic_cache: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `SLATE_AUTH_PATH`: Mount point for the credential routes
    /// - `SLATE_SIGN_IN_PATH`: Sign-in page path used in error redirects
    /// - `SLATE_LANDING_PATH`: Default post-sign-in destination
    /// - `SLATE_SESSION_COOKIE`: Session cookie name
    /// - `COOKIE_KEY`: Cookie encryption key bytes
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to disable secure cookies for
    ///   local plain-HTTP work
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if `COOKIE_KEY` is set but invalid.
    pub fn from_env() -> Result<Self, GateError> {
        let mut config = Self::new();

        if let Ok(path) = std::env::var("SLATE_AUTH_PATH") {
            config = config.with_auth_path(path);
        }
        if let Ok(path) = std::env::var("SLATE_SIGN_IN_PATH") {
            config = config.with_sign_in_path(path);
        }
        if let Ok(path) = std::env::var("SLATE_LANDING_PATH") {
            config = config.with_landing_path(path);
        }
        if let Ok(name) = std::env::var("SLATE_SESSION_COOKIE") {
            config = config.with_session_cookie_name(name);
        }

        let dev_auth = matches!(
            std::env::var("DEV_AUTH").as_deref(),
            Ok("1") | Ok("true"),
        );

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                GateError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        Ok(config
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    /// Sign-in page path; failed credential flows redirect here with
    /// `error_code` and `error_message` query parameters.
    #[must_use]
    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.settings.sign_in_path = path.into();
        self
    }

    /// Destination for users whose password was autoset at account creation.
    #[must_use]
    pub fn with_set_password_path(mut self, path: impl Into<String>) -> Self {
        self.settings.set_password_path = path.into();
        self
    }

    /// Post-sign-in destination when no usable `next_path` was submitted.
    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.settings.landing_path = path.into();
        self
    }

    #[must_use]
    pub fn with_sign_out_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.sign_out_redirect = path.into();
        self
    }

    /// Share a pending-code cache with the routes.
    ///
    /// By default each [`auth_routes()`](super::auth_routes) call owns a
    /// private cache. Injecting one lets the application hold the `Arc` and
    /// run [`MagicCodeCache::sweep`] on its own schedule.
    #[must_use]
    pub fn with_magic_cache(mut self, cache: Arc<MagicCodeCache>) -> Self {
        self.magic_cache = Some(cache);
        self
    }
}
