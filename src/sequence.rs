use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Proof that a request for `key` was issued as number `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    seq: u64,
}

#[cfg(test)]
impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Hands out increasing tickets per logical query. Only the newest ticket for a key may
/// write its result to shared state; older responses are served to their own caller only.
#[derive(Debug, Default)]
pub struct Sequencer {
    counter: AtomicU64,
    latest: Mutex<HashMap<String, u64>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: &str) -> Ticket {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut latest) = self.latest.lock() {
            let slot = latest.entry(key.to_string()).or_insert(0);
            *slot = (*slot).max(seq);
        }
        Ticket {
            key: key.to_string(),
            seq,
        }
    }

    #[cfg(test)]
    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.latest
            .lock()
            .map(|latest| latest.get(&ticket.key) == Some(&ticket.seq))
            .unwrap_or(false)
    }

    /// Run `apply` only if `ticket` is still the newest for its key. The check and the
    /// write happen under one lock so a newer ticket cannot be issued in between.
    pub fn apply_if_latest<F: FnOnce()>(&self, ticket: &Ticket, apply: F) -> bool {
        let Ok(latest) = self.latest.lock() else {
            return false;
        };
        if latest.get(&ticket.key) != Some(&ticket.seq) {
            tracing::debug!(key = %ticket.key, seq = ticket.seq, "Dropping stale response");
            return false;
        }
        apply();
        true
    }
}
