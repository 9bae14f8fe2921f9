use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::types::RedirectTarget;

/// Errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A route guard decided the page must not render.
    #[error("Redirect to {0}")]
    Redirect(RedirectTarget),

    /// Backing store operation failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(target) => Redirect::to(target.as_str()).into_response(),
            Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Gate internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

/// Machine-readable codes carried on failed credential-flow responses.
///
/// Redirect responses put `error_code` and `error_message` in the sign-in
/// page query string; JSON responses put them in the body. The code strings
/// are a wire contract and never change spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlowErrorCode {
    InstanceNotConfigured,
    MagicLinkLoginDisabled,
    InvalidEmail,
    MagicSignInEmailCodeRequired,
    MagicSignUpEmailCodeRequired,
    UserDoesNotExist,
    UserAlreadyExist,
    InvalidMagicCode,
    ExpiredMagicCode,
    EmailCodeAttemptExhausted,
}

impl FlowErrorCode {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InstanceNotConfigured => "INSTANCE_NOT_CONFIGURED",
            Self::MagicLinkLoginDisabled => "MAGIC_LINK_LOGIN_DISABLED",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MagicSignInEmailCodeRequired => "MAGIC_SIGN_IN_EMAIL_CODE_REQUIRED",
            Self::MagicSignUpEmailCodeRequired => "MAGIC_SIGN_UP_EMAIL_CODE_REQUIRED",
            Self::UserDoesNotExist => "USER_DOES_NOT_EXIST",
            // No trailing S; the spelling is load-bearing for existing clients.
            Self::UserAlreadyExist => "USER_ALREADY_EXIST",
            Self::InvalidMagicCode => "INVALID_MAGIC_CODE",
            Self::ExpiredMagicCode => "EXPIRED_MAGIC_CODE",
            Self::EmailCodeAttemptExhausted => "EMAIL_CODE_ATTEMPT_EXHAUSTED",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::InstanceNotConfigured => "Instance is not configured",
            Self::MagicLinkLoginDisabled => {
                "Magic link login is not enabled for this instance"
            }
            Self::InvalidEmail => "Please provide a valid email address",
            Self::MagicSignInEmailCodeRequired => {
                "Email and code are required to sign in"
            }
            Self::MagicSignUpEmailCodeRequired => {
                "Email and code are required to sign up"
            }
            Self::UserDoesNotExist => "User does not exist",
            Self::UserAlreadyExist => "User already exists",
            Self::InvalidMagicCode => "The sign-in code is invalid",
            Self::ExpiredMagicCode => "The sign-in code has expired",
            Self::EmailCodeAttemptExhausted => {
                "Too many codes requested. Please try again later"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_spellings_are_stable() {
        assert_eq!(FlowErrorCode::UserAlreadyExist.code(), "USER_ALREADY_EXIST");
        assert_eq!(
            FlowErrorCode::MagicSignInEmailCodeRequired.code(),
            "MAGIC_SIGN_IN_EMAIL_CODE_REQUIRED",
        );
        assert_eq!(
            FlowErrorCode::EmailCodeAttemptExhausted.code(),
            "EMAIL_CODE_ATTEMPT_EXHAUSTED",
        );
    }
}
