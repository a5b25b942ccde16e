use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{KeyValueStore, StorageError};

pub const SETTINGS_KEY: &str = "offer-decider:v1:settings";
pub const DRAFT_KEY: &str = "offer-decider:v1:draft";

/// Shift-level values remembered across sessions. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rate_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_so_far: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_mile: Option<f64>,
}

impl ShiftSettings {
    /// Overlays every field that `other` sets.
    pub fn merge(&mut self, other: ShiftSettings) {
        if other.target_rate_per_hour.is_some() {
            self.target_rate_per_hour = other.target_rate_per_hour;
        }
        if other.shift_start.is_some() {
            self.shift_start = other.shift_start;
        }
        if other.earned_so_far.is_some() {
            self.earned_so_far = other.earned_so_far;
        }
        if other.cost_per_mile.is_some() {
            self.cost_per_mile = other.cost_per_mile;
        }
    }
}

/// In-progress offer fields kept for the current session only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_finish: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_minutes: Option<f64>,
}

impl OfferDraft {
    pub fn merge(&mut self, other: OfferDraft) {
        if other.payout.is_some() {
            self.payout = other.payout;
        }
        if other.projected_finish.is_some() {
            self.projected_finish = other.projected_finish;
        }
        if other.miles.is_some() {
            self.miles = other.miles;
        }
        if other.buffer_minutes.is_some() {
            self.buffer_minutes = other.buffer_minutes;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == OfferDraft::default()
    }
}

fn load_record<T, S>(backend: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(key, error = %err, "store unreadable, using defaults");
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(key, error = %err, "stored record is corrupt, using defaults");
        T::default()
    })
}

fn save_record<T, S>(backend: &S, key: &str, record: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let outcome = serde_json::to_string(record)
        .map_err(StorageError::from)
        .and_then(|raw| backend.set(key, raw));
    if let Err(err) = outcome {
        warn!(key, error = %err, "failed to persist record");
    }
}

fn clear_record<S>(backend: &S, key: &str)
where
    S: KeyValueStore + ?Sized,
{
    if let Err(err) = backend.remove(key) {
        warn!(key, error = %err, "failed to clear record");
    }
}

/// Persistent shift settings. Reads never fail; unreadable data yields empty settings.
///
/// Writes through one handle are serialized, so concurrent read-modify-write cycles such as
/// crediting earnings never overwrite each other.
pub struct SettingsStore<S> {
    backend: Arc<S>,
    writes: Mutex<()>,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(backend: Arc<S>) -> Self {
        Self {
            backend,
            writes: Mutex::new(()),
        }
    }

    pub fn load(&self) -> ShiftSettings {
        load_record(self.backend.as_ref(), SETTINGS_KEY)
    }

    pub fn save(&self, settings: &ShiftSettings) {
        let _guard = self.write_lock();
        save_record(self.backend.as_ref(), SETTINGS_KEY, settings);
    }

    /// Merges `changes` over the stored settings and returns the result.
    pub fn update(&self, changes: ShiftSettings) -> ShiftSettings {
        let _guard = self.write_lock();
        let mut settings = self.load();
        settings.merge(changes);
        save_record(self.backend.as_ref(), SETTINGS_KEY, &settings);
        settings
    }

    /// Runs `apply` against the freshly loaded settings while holding the write lock. The
    /// settings are saved only when `apply` succeeds.
    pub fn modify<T, E, F>(&self, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut ShiftSettings) -> Result<T, E>,
    {
        let _guard = self.write_lock();
        let mut settings = self.load();
        let outcome = apply(&mut settings)?;
        save_record(self.backend.as_ref(), SETTINGS_KEY, &settings);
        Ok(outcome)
    }

    pub fn clear(&self) {
        let _guard = self.write_lock();
        clear_record(self.backend.as_ref(), SETTINGS_KEY);
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Session-scoped offer draft.
pub struct DraftStore<S> {
    backend: Arc<S>,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(backend: Arc<S>) -> Self {
        Self { backend }
    }

    pub fn load(&self) -> OfferDraft {
        load_record(self.backend.as_ref(), DRAFT_KEY)
    }

    pub fn save(&self, draft: &OfferDraft) {
        save_record(self.backend.as_ref(), DRAFT_KEY, draft);
    }

    pub fn update(&self, changes: OfferDraft) -> OfferDraft {
        let mut draft = self.load();
        draft.merge(changes);
        self.save(&draft);
        draft
    }

    pub fn clear(&self) {
        clear_record(self.backend.as_ref(), DRAFT_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".to_string()))
        }

        fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn settings_default_when_nothing_stored() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load(), ShiftSettings::default());
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(SETTINGS_KEY, "{\"target_rate_per_hour\": \"lots\"".to_string())
            .expect("seed corrupt record");

        let store = SettingsStore::new(backend);
        assert_eq!(store.load(), ShiftSettings::default());
    }

    #[test]
    fn broken_backend_never_surfaces_errors() {
        let store = SettingsStore::new(Arc::new(BrokenStore));
        assert_eq!(store.load(), ShiftSettings::default());
        store.save(&ShiftSettings {
            target_rate_per_hour: Some(30.0),
            ..ShiftSettings::default()
        });
        store.clear();
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        store.save(&ShiftSettings {
            target_rate_per_hour: Some(22.0),
            shift_start: Some("17:00".to_string()),
            earned_so_far: Some(40.0),
            cost_per_mile: Some(0.3),
        });

        let updated = store.update(ShiftSettings {
            earned_so_far: Some(55.5),
            ..ShiftSettings::default()
        });

        assert_eq!(updated.target_rate_per_hour, Some(22.0));
        assert_eq!(updated.shift_start.as_deref(), Some("17:00"));
        assert_eq!(updated.earned_so_far, Some(55.5));
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn failed_modification_leaves_settings_untouched() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        store.update(ShiftSettings {
            earned_so_far: Some(10.0),
            ..ShiftSettings::default()
        });

        let outcome: Result<(), &str> = store.modify(|settings| {
            settings.earned_so_far = Some(99.0);
            Err("rejected")
        });

        assert_eq!(outcome, Err("rejected"));
        assert_eq!(store.load().earned_so_far, Some(10.0));
    }

    #[test]
    fn concurrent_modifications_are_not_lost() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let _: Result<(), ()> = store.modify(|settings| {
                            let earned = settings.earned_so_far.unwrap_or(0.0);
                            settings.earned_so_far = Some(earned + 1.0);
                            Ok(())
                        });
                    }
                });
            }
        });

        assert_eq!(store.load().earned_so_far, Some(800.0));
    }

    #[test]
    fn settings_and_draft_use_independent_keys() {
        let backend = Arc::new(MemoryStore::new());
        let settings = SettingsStore::new(backend.clone());
        let drafts = DraftStore::new(backend.clone());

        settings.update(ShiftSettings {
            cost_per_mile: Some(0.5),
            ..ShiftSettings::default()
        });
        drafts.update(OfferDraft {
            payout: Some(9.0),
            ..OfferDraft::default()
        });
        drafts.clear();

        assert!(drafts.load().is_empty());
        assert_eq!(settings.load().cost_per_mile, Some(0.5));
    }
}
