use crate::error::{CarrierError, Result};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// AppliedSet
// ---------------------------------------------------------------------------

/// Persistent set of unit names that have already been applied.
///
/// Invariant: after `add(x)` returns `Ok`, `contains(x)` is true for every
/// subsequent call in this process, and in any process that re-opens the
/// same backing store. Entries are only ever added, never removed.
pub trait AppliedSet {
    /// Membership test against the materialized in-process view. O(1).
    fn contains(&self, name: &str) -> bool;

    /// Persist `name` to the backing store, then update the in-process
    /// view. Adding an already-present name is a no-op. On a store I/O
    /// failure the name is NOT recorded locally, so the caller never
    /// observes an apply the store did not durably accept.
    fn add(&mut self, name: &str) -> Result<()>;

    /// Full materialized set. Startup/inspection only, not the hot path.
    fn all(&self) -> &HashSet<String>;
}

// ---------------------------------------------------------------------------
// RedisAppliedSet
// ---------------------------------------------------------------------------

/// Production applied-set backed by a Redis set.
///
/// The store is a hard dependency, not a soft cache: without it the run
/// cannot guarantee at-most-once application, so `open` fails fast when
/// the server is unreachable instead of degrading to an empty set.
pub struct RedisAppliedSet {
    conn: redis::Connection,
    key: String,
    members: HashSet<String>,
}

impl RedisAppliedSet {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`) and load the
    /// full persisted set stored under `key`.
    pub fn open(url: &str, key: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(store_unavailable)?;
        let mut conn = client.get_connection().map_err(store_unavailable)?;
        let members: HashSet<String> = redis::cmd("SMEMBERS")
            .arg(key)
            .query(&mut conn)
            .map_err(store_unavailable)?;

        tracing::debug!(key, count = members.len(), "loaded applied-set");
        Ok(Self {
            conn,
            key: key.to_string(),
            members,
        })
    }
}

impl AppliedSet for RedisAppliedSet {
    fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    fn add(&mut self, name: &str) -> Result<()> {
        if self.members.contains(name) {
            return Ok(());
        }
        // Persist first; the local view is only updated once the store
        // has durably accepted the member.
        let _: i64 = redis::cmd("SADD")
            .arg(&self.key)
            .arg(name)
            .query(&mut self.conn)
            .map_err(store_unavailable)?;
        self.members.insert(name.to_string());
        Ok(())
    }

    fn all(&self) -> &HashSet<String> {
        &self.members
    }
}

fn store_unavailable(e: redis::RedisError) -> CarrierError {
    CarrierError::StoreUnavailable {
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MemoryAppliedSet
// ---------------------------------------------------------------------------

/// In-memory applied-set for tests and dry runs. Never fails, never
/// persists.
#[derive(Debug, Default)]
pub struct MemoryAppliedSet {
    members: HashSet<String>,
}

impl MemoryAppliedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the set, standing in for state left by an earlier run.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

impl AppliedSet for MemoryAppliedSet {
    fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    fn add(&mut self, name: &str) -> Result<()> {
        self.members.insert(name.to_string());
        Ok(())
    }

    fn all(&self) -> &HashSet<String> {
        &self.members
    }
}
