use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::USER_AGENT};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::cache::RedeemError;
use super::config::{GateConfig, GateSettings};
use super::cookies;
use super::error::{FlowErrorCode, GateError};
use super::state::AuthState;
use super::traits::{AccountStore, InstanceSource, MagicLinkSender, SessionStore};
use super::types::{Account, NewSession};
use crate::magic::MagicKey;
use crate::redirect::sanitize_next_path;
use crate::types::Email;

/// Create the credential-flow router.
///
/// Mounts, under the configured `auth_path`:
/// - `POST {auth_path}/magic-generate`: JSON; issue and deliver a one-time code
/// - `POST {auth_path}/magic-sign-in`: form; redeem a code for a session
/// - `POST {auth_path}/magic-sign-up`: form; redeem a code, creating the account
/// - `GET|POST {auth_path}/sign-out`: drop the session
pub fn auth_routes<A, S, I, M>(
    config: GateConfig,
    accounts: A,
    sessions: S,
    instance: I,
    sender: M,
) -> Router
where
    A: AccountStore,
    S: SessionStore,
    I: InstanceSource,
    M: MagicLinkSender,
{
    let auth_path = config.settings.auth_path.clone();

    let state = AuthState {
        accounts: Arc::new(accounts),
        sessions: Arc::new(sessions),
        instance: Arc::new(instance),
        sender: Arc::new(sender),
        codes: config.magic_cache.unwrap_or_default(),
        settings: config.settings,
    };

    Router::new()
        .route(
            &format!("{auth_path}/magic-generate"),
            post(magic_generate::<A, S, I, M>),
        )
        .route(
            &format!("{auth_path}/magic-sign-in"),
            post(magic_sign_in::<A, S, I, M>),
        )
        .route(
            &format!("{auth_path}/magic-sign-up"),
            post(magic_sign_up::<A, S, I, M>),
        )
        .route(
            &format!("{auth_path}/sign-out"),
            get(sign_out::<A, S, I, M>).post(sign_out::<A, S, I, M>),
        )
        .with_state(state)
}

// ── Magic code generation ──────────────────────────────────────────

#[derive(Deserialize)]
struct MagicGenerateRequest {
    email: String,
}

#[derive(Serialize)]
struct MagicGenerateResponse {
    key: String,
}

async fn magic_generate<A: AccountStore, S: SessionStore, I: InstanceSource, M: MagicLinkSender>(
    State(state): State<AuthState<A, S, I, M>>,
    Json(body): Json<MagicGenerateRequest>,
) -> Result<Json<MagicGenerateResponse>, Response> {
    let status = state
        .instance
        .fetch_status()
        .await
        .map_err(|e| GateError::Store(format!("instance status fetch: {e}")).into_response())?;

    if !status.is_some_and(|s| s.is_setup_done) {
        return Err(flow_json(FlowErrorCode::InstanceNotConfigured));
    }

    let instance_config = state
        .instance
        .fetch_config()
        .await
        .map_err(|e| GateError::Store(format!("instance config fetch: {e}")).into_response())?;

    if !instance_config.enable_magic_link_login {
        return Err(flow_json(FlowErrorCode::MagicLinkLoginDisabled));
    }

    let email: Email = body
        .email
        .parse()
        .map_err(|_| flow_json(FlowErrorCode::InvalidEmail))?;

    let key = MagicKey::for_email(&email);
    let token = state
        .codes
        .issue(key.clone(), OffsetDateTime::now_utc())
        .await
        .map_err(|_| flow_json(FlowErrorCode::EmailCodeAttemptExhausted))?;

    state
        .sender
        .deliver(&email, &token)
        .await
        .map_err(|e| GateError::Store(format!("magic code delivery: {e}")).into_response())?;

    tracing::info!(key = %key, "Magic code issued");

    Ok(Json(MagicGenerateResponse { key: key.to_string() }))
}

// ── Magic sign-in ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct MagicSignForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    code: String,
    next_path: Option<String>,
}

async fn magic_sign_in<A: AccountStore, S: SessionStore, I: InstanceSource, M: MagicLinkSender>(
    State(state): State<AuthState<A, S, I, M>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Form(form): Form<MagicSignForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let sign_in_path = &state.settings.sign_in_path;
    let submitted_email = form.email.trim();
    let code = form.code.trim();
    let next_path = form.next_path.as_deref();

    if submitted_email.is_empty() || code.is_empty() {
        return Err(flow_redirect(
            sign_in_path,
            FlowErrorCode::MagicSignInEmailCodeRequired,
            next_path,
        ));
    }

    let email: Email = submitted_email
        .parse()
        .map_err(|_| flow_redirect(sign_in_path, FlowErrorCode::InvalidEmail, next_path))?;

    let account = state
        .accounts
        .find_by_email(&email)
        .await
        .map_err(|e| GateError::Store(format!("account lookup: {e}")).into_response())?
        .ok_or_else(|| {
            flow_redirect(sign_in_path, FlowErrorCode::UserDoesNotExist, next_path)
        })?;

    let key = MagicKey::for_email(&email);
    state
        .codes
        .redeem(&key, code, OffsetDateTime::now_utc())
        .await
        .map_err(|e| {
            let flow_code = match e {
                RedeemError::Expired => FlowErrorCode::ExpiredMagicCode,
                RedeemError::Mismatch => FlowErrorCode::InvalidMagicCode,
            };
            flow_redirect(sign_in_path, flow_code, next_path)
        })?;

    let target = sign_in_target(&account, &email, &state.settings, next_path);

    let session = NewSession {
        user_id: account.user_id.clone(),
        email,
        user_agent: extract_user_agent(&headers),
        ip_address: extract_client_ip(&headers),
    };

    let session_id = state
        .sessions
        .create(session)
        .await
        .map_err(|e| GateError::Store(format!("session create: {e}")).into_response())?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        &session_id.to_string(),
        state.settings.session_ttl_days,
        state.settings.secure_cookies,
    );

    tracing::info!(user_id = %account.user_id, "Magic sign-in successful");

    Ok((jar.add(session_cookie), Redirect::to(&target)))
}

// ── Magic sign-up ──────────────────────────────────────────────────

async fn magic_sign_up<A: AccountStore, S: SessionStore, I: InstanceSource, M: MagicLinkSender>(
    State(state): State<AuthState<A, S, I, M>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Form(form): Form<MagicSignForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let sign_in_path = &state.settings.sign_in_path;
    let submitted_email = form.email.trim();
    let code = form.code.trim();
    let next_path = form.next_path.as_deref();

    if submitted_email.is_empty() || code.is_empty() {
        return Err(flow_redirect(
            sign_in_path,
            FlowErrorCode::MagicSignUpEmailCodeRequired,
            next_path,
        ));
    }

    let email: Email = submitted_email
        .parse()
        .map_err(|_| flow_redirect(sign_in_path, FlowErrorCode::InvalidEmail, next_path))?;

    let existing = state
        .accounts
        .find_by_email(&email)
        .await
        .map_err(|e| GateError::Store(format!("account lookup: {e}")).into_response())?;

    if existing.is_some() {
        return Err(flow_redirect(
            sign_in_path,
            FlowErrorCode::UserAlreadyExist,
            next_path,
        ));
    }

    let key = MagicKey::for_email(&email);
    state
        .codes
        .redeem(&key, code, OffsetDateTime::now_utc())
        .await
        .map_err(|e| {
            let flow_code = match e {
                RedeemError::Expired => FlowErrorCode::ExpiredMagicCode,
                RedeemError::Mismatch => FlowErrorCode::InvalidMagicCode,
            };
            flow_redirect(sign_in_path, flow_code, next_path)
        })?;

    let account = state
        .accounts
        .create(&email)
        .await
        .map_err(|e| GateError::Store(format!("account create: {e}")).into_response())?;

    let session = NewSession {
        user_id: account.user_id.clone(),
        email,
        user_agent: extract_user_agent(&headers),
        ip_address: extract_client_ip(&headers),
    };

    let session_id = state
        .sessions
        .create(session)
        .await
        .map_err(|e| GateError::Store(format!("session create: {e}")).into_response())?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        &session_id.to_string(),
        state.settings.session_ttl_days,
        state.settings.secure_cookies,
    );

    let target = match sanitize_next_path(next_path) {
        Some(next) => next.to_string(),
        None => state.settings.landing_path.clone(),
    };

    tracing::info!(user_id = %account.user_id, "Magic sign-up successful");

    Ok((jar.add(session_cookie), Redirect::to(&target)))
}

// ── Sign-out ───────────────────────────────────────────────────────

async fn sign_out<A: AccountStore, S: SessionStore, I: InstanceSource, M: MagicLinkSender>(
    State(state): State<AuthState<A, S, I, M>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(session_id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) {
        if let Err(e) = state.sessions.delete(&session_id).await {
            tracing::warn!(error = %e, "Session deletion failed during sign-out");
        }
    }

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);

    tracing::info!("Sign-out successful");

    (
        jar.remove(clear_cookie),
        Redirect::to(&state.settings.sign_out_redirect),
    )
}

// ── Helpers ────────────────────────────────────────────────────────

/// Post-sign-in destination.
///
/// Accounts that never chose a password are detoured to the set-password
/// page once they are onboarded; everyone else follows the sanitized
/// `next_path` or lands on the configured default.
fn sign_in_target(
    account: &Account,
    email: &Email,
    settings: &GateSettings,
    next_path: Option<&str>,
) -> String {
    if account.is_password_autoset && account.is_onboarded {
        let encoded = urlencoding::encode(email.as_str());
        return format!("{}?email={encoded}", settings.set_password_path);
    }
    match sanitize_next_path(next_path) {
        Some(next) => next.to_string(),
        None => settings.landing_path.clone(),
    }
}

fn flow_redirect(sign_in_path: &str, code: FlowErrorCode, next_path: Option<&str>) -> Response {
    tracing::warn!(code = %code.code(), "Credential flow rejected");
    let mut query = format!(
        "error_code={}&error_message={}",
        urlencoding::encode(code.code()),
        urlencoding::encode(code.message()),
    );
    if let Some(next) = next_path.filter(|next| !next.is_empty()) {
        query.push_str("&next_path=");
        query.push_str(&urlencoding::encode(next));
    }
    Redirect::to(&format!("{sign_in_path}?{query}")).into_response()
}

#[derive(Serialize)]
struct FlowErrorBody {
    error_code: &'static str,
    error_message: &'static str,
}

fn flow_json(code: FlowErrorCode) -> Response {
    tracing::warn!(code = %code.code(), "Magic code request rejected");
    let body = FlowErrorBody {
        error_code: code.code(),
        error_message: code.message(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

#[cfg(test)]
mod tests {
    use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};

    use super::super::{CurrentUser, MagicCodeCache};
    use super::*;
    use crate::instance::{InstanceConfig, InstanceStatus};
    use crate::magic::MagicToken;
    use crate::types::{SessionId, UserId};

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    fn account(autoset: bool, onboarded: bool) -> Account {
        Account {
            user_id: UserId::from("user-1".to_string()),
            is_password_autoset: autoset,
            is_onboarded: onboarded,
        }
    }

    // ── handler fixtures ───────────────────────────────────────────

    struct Stubs;

    impl AccountStore for Stubs {
        async fn find_by_email(
            &self,
            _email: &Email,
        ) -> Result<Option<Account>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(None)
        }

        async fn create(
            &self,
            _email: &Email,
        ) -> Result<Account, Box<dyn std::error::Error + Send + Sync>> {
            Ok(account(true, false))
        }
    }

    impl SessionStore for Stubs {
        async fn create(
            &self,
            _session: NewSession,
        ) -> Result<SessionId, Box<dyn std::error::Error + Send + Sync>> {
            Ok(SessionId("sess-1".to_string()))
        }

        async fn find(
            &self,
            _session_id: &SessionId,
        ) -> Result<Option<CurrentUser>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(None)
        }

        async fn delete(
            &self,
            _session_id: &SessionId,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    impl InstanceSource for Stubs {
        async fn fetch_status(
            &self,
        ) -> Result<Option<InstanceStatus>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(Some(InstanceStatus { is_setup_done: true }))
        }

        async fn fetch_config(
            &self,
        ) -> Result<InstanceConfig, Box<dyn std::error::Error + Send + Sync>> {
            Ok(InstanceConfig {
                enable_magic_link_login: true,
                ..InstanceConfig::default()
            })
        }
    }

    impl MagicLinkSender for Stubs {
        async fn deliver(
            &self,
            _email: &Email,
            _token: &MagicToken,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    fn stub_state() -> AuthState<Stubs, Stubs, Stubs, Stubs> {
        AuthState {
            accounts: Arc::new(Stubs),
            sessions: Arc::new(Stubs),
            instance: Arc::new(Stubs),
            sender: Arc::new(Stubs),
            codes: Arc::new(MagicCodeCache::default()),
            settings: GateSettings::defaults(),
        }
    }

    fn empty_jar(settings: &GateSettings) -> PrivateCookieJar {
        PrivateCookieJar::from_headers(&HeaderMap::new(), settings.cookie_key.clone())
    }

    fn sign_form(email: &str, code: &str) -> Form<MagicSignForm> {
        Form(MagicSignForm {
            email: email.to_string(),
            code: code.to_string(),
            next_path: None,
        })
    }

    #[test]
    fn flow_redirect_carries_code_message_and_next_path() {
        let response = flow_redirect(
            "/accounts/sign-in",
            FlowErrorCode::UserDoesNotExist,
            Some("/acme/issues"),
        );
        assert_eq!(
            location(&response),
            "/accounts/sign-in?error_code=USER_DOES_NOT_EXIST\
             &error_message=User%20does%20not%20exist\
             &next_path=%2Facme%2Fissues",
        );
    }

    #[test]
    fn flow_redirect_omits_empty_next_path() {
        let response = flow_redirect("/accounts/sign-in", FlowErrorCode::InvalidEmail, Some(""));
        assert!(!location(&response).contains("next_path"));
    }

    #[test]
    fn flow_json_is_a_bad_request() {
        let response = flow_json(FlowErrorCode::InstanceNotConfigured);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sign_in_target_detours_autoset_onboarded_accounts() {
        let email: Email = "visitor@example.com".parse().unwrap();
        let target = sign_in_target(
            &account(true, true),
            &email,
            &GateSettings::defaults(),
            Some("/acme"),
        );
        assert_eq!(target, "/accounts/set-password?email=visitor%40example.com");
    }

    #[test]
    fn sign_in_target_honors_a_safe_next_path() {
        let email: Email = "visitor@example.com".parse().unwrap();
        let settings = GateSettings::defaults();
        assert_eq!(
            sign_in_target(&account(true, false), &email, &settings, Some("/acme")),
            "/acme",
        );
        assert_eq!(
            sign_in_target(&account(false, true), &email, &settings, Some("/acme")),
            "/acme",
        );
    }

    #[test]
    fn sign_in_target_drops_external_urls() {
        let email: Email = "visitor@example.com".parse().unwrap();
        let target = sign_in_target(
            &account(false, false),
            &email,
            &GateSettings::defaults(),
            Some("https://evil.example/x"),
        );
        assert_eq!(target, "/");
    }

    #[tokio::test]
    async fn sign_out_clears_the_session_cookie_and_redirects() {
        let state = stub_state();
        let settings = state.settings.clone();

        // Round-trip an issued cookie through headers so the jar holds it as
        // an original, the way a real request would.
        let issued = empty_jar(&settings)
            .add(cookies::session_cookie(
                &settings.session_cookie_name,
                "sess-1",
                30,
                true,
            ))
            .into_response();
        let pair = issued
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, pair.parse().unwrap());
        let jar = PrivateCookieJar::from_headers(&headers, settings.cookie_key.clone());

        let response = sign_out(State(state), jar).await.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("__slate_session="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn sign_in_rejects_a_malformed_email_before_lookup() {
        let state = stub_state();
        let jar = empty_jar(&state.settings);
        let form = sign_form("not-an-address", "aaaa-bbbb-cccc");

        let response = magic_sign_in(State(state), jar, HeaderMap::new(), form)
            .await
            .into_response();

        assert!(location(&response).contains("error_code=INVALID_EMAIL"));
    }

    #[tokio::test]
    async fn sign_in_reports_unknown_emails_after_lookup() {
        let state = stub_state();
        let jar = empty_jar(&state.settings);
        let form = sign_form("ghost@example.com", "aaaa-bbbb-cccc");

        let response = magic_sign_in(State(state), jar, HeaderMap::new(), form)
            .await
            .into_response();

        assert!(location(&response).contains("error_code=USER_DOES_NOT_EXIST"));
    }

    #[test]
    fn client_ip_prefers_the_forwarded_chain_head() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 5.6.7.8".parse().unwrap());
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }
}
