use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The ordered `(source, destination)` pair identifying one counter.
///
/// Equality is structural; `("US", "CN")` and `("CN", "US")` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateKey {
    pub source: String,
    pub destination: String,
}

impl AggregateKey {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// A windowed counter for one key pair.
///
/// Records are owned exclusively by the aggregate store. A record is created on
/// the first event for its key and refreshed in place on every subsequent one.
/// The invariant `expires_at == last_seen + ttl` holds for the store's
/// configured TTL at all times; a record whose deadline has passed is treated
/// as gone by every read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub key: AggregateKey,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AggregateRecord {
    /// Creates a fresh record with `count = 1` for the first event of a key.
    pub fn first(key: AggregateKey, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key,
            count: 1,
            last_seen: now,
            expires_at: now + ttl,
        }
    }

    /// Registers one more event: bumps the count and refreshes the window.
    pub fn observe(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.count += 1;
        self.last_seen = now;
        self.expires_at = now + ttl;
    }

    /// Whether the record's window has closed as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
