use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Normalized e-mail address.
///
/// Guaranteed well-formed by construction: the input is trimmed and lowercased
/// before a structural check (`local@domain` with a dotted domain), so holding
/// an `Email` proves the cleanup already happened. Use
/// `"User@Example.com".parse::<Email>()` or `Email::try_from(string)` to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for Email {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let normalized = s.trim().to_lowercase();
        if has_email_shape(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::InvalidEmail(s))
        }
    }
}

impl From<Email> for String {
    fn from(e: Email) -> Self {
        e.0
    }
}

fn has_email_shape(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return false;
    }
    !domain.split('.').any(str::is_empty)
}

/// Consumer-defined user identifier (opaque string).
///
/// Returned by the middleware's session and account stores. The consumer
/// chooses the format (ULID, UUID, etc.).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Consumer-defined session identifier (opaque string).
///
/// Issued by the middleware's session store at sign-in. The consumer
/// chooses the format (ULID, UUID, etc.).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Workspace slug (opaque string, compared by equality).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct WorkspaceSlug(pub String);

impl WorkspaceSlug {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A workspace the user belongs to. The gate only ever matches on the slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub slug: WorkspaceSlug,
}

impl Workspace {
    #[must_use]
    pub fn new(slug: impl Into<WorkspaceSlug>) -> Self {
        Self { slug: slug.into() }
    }
}

/// A client-side navigation target produced by the gate.
///
/// Always a path (`/acme`, `/onboarding`, …), never an absolute URL derived
/// from caller input; see [`redirect::is_safe_next_path`](crate::redirect::is_safe_next_path).
/// The caller performs the actual navigation; the gate only names the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Into)]
pub struct RedirectTarget(String);

impl RedirectTarget {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RedirectTarget {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalizes_case_and_whitespace() {
        let email: Email = "  User@Example.COM ".parse().unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn email_accepts_plain_addresses() {
        assert!("a@b.c".parse::<Email>().is_ok());
        assert!("first.last+tag@mail.example.org".parse::<Email>().is_ok());
    }

    #[test]
    fn email_rejects_missing_or_doubled_at() {
        assert!("".parse::<Email>().is_err());
        assert!("plainaddress".parse::<Email>().is_err());
        assert!("a@b@c.d".parse::<Email>().is_err());
    }

    #[test]
    fn email_rejects_empty_parts_and_undotted_domain() {
        assert!("@example.com".parse::<Email>().is_err());
        assert!("user@".parse::<Email>().is_err());
        assert!("user@localhost".parse::<Email>().is_err());
        assert!("user@example..com".parse::<Email>().is_err());
        assert!("user@.example.com".parse::<Email>().is_err());
    }

    #[test]
    fn email_rejects_inner_whitespace() {
        assert!("us er@example.com".parse::<Email>().is_err());
        assert!("user@exam ple.com".parse::<Email>().is_err());
    }

    #[test]
    fn email_serde_roundtrip_normalizes() {
        let email: Email = serde_json::from_str("\"Dev@Slate.App\"").unwrap();
        assert_eq!(email.as_str(), "dev@slate.app");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"dev@slate.app\"");
    }

    #[test]
    fn workspace_slug_matches_by_equality() {
        let a = WorkspaceSlug::from("acme".to_string());
        let b: WorkspaceSlug = "acme".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "acme");
    }

    #[test]
    fn redirect_target_displays_its_path() {
        let target = RedirectTarget::new("/acme");
        assert_eq!(target.as_str(), "/acme");
        assert_eq!(target.to_string(), "/acme");
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_user_id(_: &UserId) {}
        fn takes_session_id(_: &SessionId) {}

        let user = UserId::from("id".to_string());
        let session = SessionId::from("id".to_string());

        takes_user_id(&user);
        takes_session_id(&session);
        // takes_user_id(&session);  // Compile error!
        // takes_session_id(&user);  // Compile error!
    }
}
