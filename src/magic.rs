//! One-time sign-in code material.
//!
//! Codes are short-lived, scoped to a single normalized email address, and
//! rate-limited at generation time. Redemption is single-use.

use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::types::Email;

/// How long an issued code stays redeemable.
pub const CODE_TTL: Duration = Duration::seconds(600);

/// Total codes a single email may be sent before the window must lapse.
pub const MAX_GENERATE_ATTEMPTS: u32 = 5;

const GROUP_COUNT: usize = 3;
const GROUP_LEN: usize = 4;

/// A one-time sign-in code, formatted as `xxxx-xxxx-xxxx`.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub struct MagicToken(String);

impl MagicToken {
    /// Generates a fresh code: three dash-joined groups of four lowercase
    /// ASCII letters.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut token = String::with_capacity(GROUP_COUNT * (GROUP_LEN + 1) - 1);
        for group in 0..GROUP_COUNT {
            if group > 0 {
                token.push('-');
            }
            for _ in 0..GROUP_LEN {
                token.push(char::from(rng.random_range(b'a'..=b'z')));
            }
        }
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cache key binding one pending code to one normalized email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct MagicKey(String);

impl MagicKey {
    #[must_use]
    pub fn for_email(email: &Email) -> Self {
        Self(format!("magic_{email}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A pending code together with its issue bookkeeping.
#[derive(Debug, Clone)]
pub struct MagicCodeRecord {
    pub token: MagicToken,
    /// Zero for the first code, bumped once per re-issue.
    pub attempt: u32,
    pub issued_at: OffsetDateTime,
}

impl MagicCodeRecord {
    #[must_use]
    pub fn fresh(now: OffsetDateTime) -> Self {
        Self {
            token: MagicToken::generate(),
            attempt: 0,
            issued_at: now,
        }
    }

    /// Replaces the code and restarts the expiry clock; the attempt counter
    /// carries over so re-issues stay bounded.
    #[must_use]
    pub fn reissued(&self, now: OffsetDateTime) -> Self {
        Self {
            token: MagicToken::generate(),
            attempt: self.attempt + 1,
            issued_at: now,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now - self.issued_at >= CODE_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_the_dashed_group_shape() {
        let token = MagicToken::generate();
        let text = token.as_str();
        assert_eq!(text.len(), 14);
        let groups: Vec<&str> = text.split('-').collect();
        assert_eq!(groups.len(), 3);
        for group in groups {
            assert_eq!(group.len(), 4);
            assert!(group.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn tokens_do_not_repeat() {
        let first = MagicToken::generate();
        let second = MagicToken::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn key_scopes_to_the_normalized_email() {
        let email: Email = "  Visitor@Example.COM ".parse().unwrap();
        let key = MagicKey::for_email(&email);
        assert_eq!(key.as_str(), "magic_visitor@example.com");
    }

    #[test]
    fn record_expires_at_the_ttl_boundary() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let record = MagicCodeRecord::fresh(now);
        assert!(!record.is_expired(now));
        assert!(!record.is_expired(now + CODE_TTL - Duration::seconds(1)));
        assert!(record.is_expired(now + CODE_TTL));
    }

    #[test]
    fn reissue_swaps_the_code_and_counts_the_attempt() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let first = MagicCodeRecord::fresh(now);
        let second = first.reissued(now + Duration::seconds(30));
        assert_eq!(second.attempt, 1);
        assert_ne!(second.token, first.token);
        assert_eq!(second.issued_at, now + Duration::seconds(30));
    }
}
