//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Sanitizing of loaded progress
//! - Corruption detection (a bad save is reported, never half-loaded)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{KeyValueStore, StorageError};
use crate::sim::GameState;

/// Storage key for the progression save
pub const SAVE_KEY: &str = "orb-ascent-save";
/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("save data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEnvelope {
    #[serde(default)]
    pub version: u32,
    /// Unix time of the save in ms (0 when unknown)
    #[serde(default)]
    pub saved_at: f64,
    pub state: GameState,
}

impl SaveEnvelope {
    pub fn new(state: GameState, saved_at: f64) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at,
            state,
        }
    }
}

/// Write the current progress
pub fn save(store: &mut dyn KeyValueStore, state: &GameState, now: f64) -> Result<(), PersistError> {
    let envelope = SaveEnvelope::new(state.clone(), now);
    let json = serde_json::to_string(&envelope)?;
    store.set(SAVE_KEY, &json)?;
    log::debug!("Saved progress ({} bytes)", json.len());
    Ok(())
}

/// Read the saved progress, if any
pub fn load(store: &dyn KeyValueStore) -> Result<Option<SaveEnvelope>, PersistError> {
    let Some(json) = store.get(SAVE_KEY) else {
        return Ok(None);
    };
    let mut envelope: SaveEnvelope = serde_json::from_str(&json)?;
    if envelope.version > SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: envelope.version,
            supported: SAVE_VERSION,
        });
    }

    envelope.state.sanitize();
    // A run cannot be resumed after a reload
    envelope.state.scrap_run_active = false;
    envelope.version = SAVE_VERSION;

    log::info!(
        "Loaded save: {:.0} energy, {} scrap, prestige {}",
        envelope.state.energy,
        envelope.state.scrap,
        envelope.state.prestige_level
    );
    Ok(Some(envelope))
}

/// Load progress, falling back to a fresh game when missing or unreadable
pub fn load_or_default(store: &dyn KeyValueStore) -> (GameState, Option<f64>) {
    match load(store) {
        Ok(Some(envelope)) => {
            let saved_at = (envelope.saved_at > 0.0).then_some(envelope.saved_at);
            (envelope.state, saved_at)
        }
        Ok(None) => {
            log::info!("No save found, starting fresh");
            (GameState::new(), None)
        }
        Err(e) => {
            log::warn!("Ignoring unreadable save: {}", e);
            (GameState::new(), None)
        }
    }
}

pub fn clear(store: &mut dyn KeyValueStore) {
    store.remove(SAVE_KEY);
    log::info!("Save cleared");
}

/// "Last saved" label for the HUD
pub fn format_save_age(saved_at: Option<f64>, now: f64) -> String {
    let Some(saved_at) = saved_at else {
        return "Pending".to_string();
    };
    let diff = (now - saved_at).max(0.0);
    if diff < 15_000.0 {
        "Just now".to_string()
    } else if diff < 60_000.0 {
        format!("{}s ago", (diff / 1000.0).floor())
    } else if diff < 3_600_000.0 {
        format!("{}m ago", (diff / 60_000.0).floor())
    } else {
        format!("{}h ago", (diff / 3_600_000.0).floor())
    }
}

/// Cooldown as `m:ss`
pub fn format_cooldown(ms: f64) -> String {
    let ms = ms.max(0.0) as u64;
    format!("{}:{:02}", ms / 60_000, (ms % 60_000) / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::sim::UpgradeId;

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStorage::new();
        let mut state = GameState::new();
        state.add_energy(1234.0);
        state.add_scrap(56);
        state.upgrades.set(UpgradeId::TractorBeam, 2);

        save(&mut store, &state, 1_000.0).unwrap();
        let envelope = load(&store).unwrap().unwrap();
        assert_eq!(envelope.version, SAVE_VERSION);
        assert_eq!(envelope.saved_at, 1_000.0);
        assert_eq!(envelope.state, state);
    }

    #[test]
    fn test_missing_save() {
        let store = MemoryStorage::new();
        assert!(load(&store).unwrap().is_none());
        let (state, saved_at) = load_or_default(&store);
        assert_eq!(state, GameState::new());
        assert_eq!(saved_at, None);
    }

    #[test]
    fn test_active_run_is_not_restored() {
        let mut store = MemoryStorage::new();
        let mut state = GameState::new();
        state.scrap_run_active = true;
        save(&mut store, &state, 5.0).unwrap();
        assert!(!load(&store).unwrap().unwrap().state.scrap_run_active);
    }

    #[test]
    fn test_corrupt_and_future_saves() {
        let mut store = MemoryStorage::new();
        store.set(SAVE_KEY, "{\"state\": [").unwrap();
        assert!(matches!(load(&store), Err(PersistError::Corrupt(_))));
        assert_eq!(load_or_default(&store).0, GameState::new());

        store.set(SAVE_KEY, r#"{"version": 9, "state": {}}"#).unwrap();
        assert!(matches!(
            load(&store),
            Err(PersistError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_unversioned_save_is_accepted_and_sanitized() {
        let mut store = MemoryStorage::new();
        store
            .set(
                SAVE_KEY,
                r#"{"state": {"energy": 50, "charge": 3.5, "upgrades": {"shieldGenerator": 99}}, "version": 0}"#,
            )
            .unwrap();
        let (state, saved_at) = load_or_default(&store);
        assert_eq!(saved_at, None);
        assert_eq!(state.energy, 50.0);
        assert_eq!(state.charge, 1.0);
        assert_eq!(state.level(UpgradeId::ShieldGenerator), 3);
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryStorage::new();
        save(&mut store, &GameState::new(), 1.0).unwrap();
        clear(&mut store);
        assert!(load(&store).unwrap().is_none());
    }

    #[test]
    fn test_save_age_labels() {
        assert_eq!(format_save_age(None, 0.0), "Pending");
        assert_eq!(format_save_age(Some(0.0), 14_999.0), "Just now");
        assert_eq!(format_save_age(Some(0.0), 42_500.0), "42s ago");
        assert_eq!(format_save_age(Some(0.0), 300_001.0), "5m ago");
        assert_eq!(format_save_age(Some(0.0), 7_300_000.0), "2h ago");
    }

    #[test]
    fn test_cooldown_format() {
        assert_eq!(format_cooldown(120_000.0), "2:00");
        assert_eq!(format_cooldown(65_900.0), "1:05");
        assert_eq!(format_cooldown(999.0), "0:00");
        assert_eq!(format_cooldown(-5.0), "0:00");
    }
}
