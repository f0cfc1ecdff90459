use crate::aggregate::WorldwideStats;
use crate::error::StorageError;
use crate::progression::UserProfile;
use crate::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

pub const PROFILE_KEY: &str = "typex_user_profile";
pub const STATS_KEY: &str = "typex_worldwide_stats";

/// Typed access to the two persisted documents.
///
/// Reads never fail: missing, unreadable or malformed state yields `None`
/// (callers fall back to defaults). Writes report success as a bool and
/// log the cause on failure.
#[derive(Debug)]
pub struct ProgressStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(json) = self.store.load(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    fn read_or_log<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read(key) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                debug!(key, "no stored state, using defaults");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "failed to load stored state, using defaults");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.store.save(key, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(key, error = %e, "failed to save state");
                false
            }
        }
    }

    pub fn load_profile(&self) -> Option<UserProfile> {
        self.read_or_log::<UserProfile>(PROFILE_KEY)
            .map(UserProfile::normalized)
    }

    /// Stored profile, or a fresh one for `username` on first run.
    pub fn load_profile_or_default(&self, username: &str) -> UserProfile {
        self.load_profile()
            .unwrap_or_else(|| UserProfile::with_username(username))
    }

    pub fn save_profile(&self, profile: &UserProfile) -> bool {
        self.write(PROFILE_KEY, profile)
    }

    pub fn load_world(&self) -> Option<WorldwideStats> {
        self.read_or_log(STATS_KEY)
    }

    /// Stored global stats; on first run the initial state is written back.
    pub fn load_world_or_init(&self) -> WorldwideStats {
        match self.load_world() {
            Some(world) => world,
            None => {
                let world = WorldwideStats::first_run();
                self.save_world(&world);
                world
            }
        }
    }

    pub fn save_world(&self, world: &WorldwideStats) -> bool {
        self.write(STATS_KEY, world)
    }
}
