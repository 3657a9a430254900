//! Short-lived anti-forgery state values for in-flight authorizations

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::models::Provider;

/// How long a state value stays redeemable after it is issued
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// What a state value was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePurpose {
    SignIn,
    /// Attach the identity to this signed-in account
    Link(i64),
}

#[derive(Debug, Clone, Copy)]
struct PendingState {
    provider: Provider,
    purpose: StatePurpose,
    issued_at: Instant,
}

/// Single-use, provider-bound state values held in memory
#[derive(Debug)]
pub struct OAuthStateStore {
    ttl: Duration,
    pending: RwLock<HashMap<String, PendingState>>,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, state: &str, provider: Provider, purpose: StatePurpose) {
        let mut pending = self.pending.write().await;
        let ttl = self.ttl;
        pending.retain(|_, p| p.issued_at.elapsed() < ttl);
        pending.insert(
            state.to_string(),
            PendingState {
                provider,
                purpose,
                issued_at: Instant::now(),
            },
        );
    }

    /// Purpose of a live state without redeeming it
    pub async fn peek(&self, state: &str) -> Option<StatePurpose> {
        self.pending
            .read()
            .await
            .get(state)
            .filter(|p| p.issued_at.elapsed() < self.ttl)
            .map(|p| p.purpose)
    }

    /// Removes the state and reports whether it was valid for `provider` and
    /// `purpose`. A value is consumed even when it fails any check.
    pub async fn consume(&self, state: &str, provider: Provider, purpose: StatePurpose) -> bool {
        let entry = self.pending.write().await.remove(state);

        match entry {
            Some(p) if p.provider != provider => {
                debug!(expected = p.provider.as_str(), got = provider.as_str(), "State issued for another provider");
                false
            }
            Some(p) if p.purpose != purpose => {
                debug!(issued = ?p.purpose, redeemed = ?purpose, "State issued for another purpose");
                false
            }
            Some(p) if p.issued_at.elapsed() >= self.ttl => {
                debug!("State expired");
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub async fn prune_expired(&self) -> usize {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        let ttl = self.ttl;
        pending.retain(|_, p| p.issued_at.elapsed() < ttl);
        before - pending.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}
