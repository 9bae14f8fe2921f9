use std::collections::HashMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::magic::{MAX_GENERATE_ATTEMPTS, MagicCodeRecord, MagicKey, MagicToken};

/// Issue refused: the email hit its generation cap for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptsExhausted;

/// Why a submitted code was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemError {
    /// No live code for this email; also covers codes past their TTL.
    Expired,
    /// A live code exists but the submitted string does not match it.
    Mismatch,
}

/// In-process store for pending sign-in codes.
///
/// Expiry is checked on every access, so a long-lived process stays correct
/// without maintenance; [`sweep`](MagicCodeCache::sweep) only reclaims memory
/// from entries nobody redeemed.
#[derive(Debug, Default)]
pub struct MagicCodeCache {
    entries: RwLock<HashMap<MagicKey, MagicCodeRecord>>,
}

impl MagicCodeCache {
    /// Issue a code for `key`, replacing any live one.
    ///
    /// Re-issuing bumps the attempt counter; once [`MAX_GENERATE_ATTEMPTS`]
    /// codes have been handed out the key stays refused until the last code
    /// expires or is redeemed.
    pub async fn issue(
        &self,
        key: MagicKey,
        now: OffsetDateTime,
    ) -> Result<MagicToken, AttemptsExhausted> {
        let mut entries = self.entries.write().await;
        let record = match entries.get(&key) {
            Some(existing) if !existing.is_expired(now) => {
                if existing.attempt + 1 >= MAX_GENERATE_ATTEMPTS {
                    return Err(AttemptsExhausted);
                }
                existing.reissued(now)
            }
            _ => MagicCodeRecord::fresh(now),
        };
        let token = record.token.clone();
        entries.insert(key, record);
        Ok(token)
    }

    /// Redeem `submitted` against the live code for `key`.
    ///
    /// Success consumes the code. A mismatch leaves it live, so a typo does
    /// not invalidate the email the user is holding.
    pub async fn redeem(
        &self,
        key: &MagicKey,
        submitted: &str,
        now: OffsetDateTime,
    ) -> Result<(), RedeemError> {
        let mut entries = self.entries.write().await;
        let Some(record) = entries.get(key) else {
            return Err(RedeemError::Expired);
        };
        if record.is_expired(now) {
            entries.remove(key);
            return Err(RedeemError::Expired);
        }
        if record.token.as_str() != submitted {
            return Err(RedeemError::Mismatch);
        }
        entries.remove(key);
        Ok(())
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn sweep(&self, now: OffsetDateTime) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, record| !record.is_expired(now));
        before - entries.len()
    }
}
