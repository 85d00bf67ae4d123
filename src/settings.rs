//! Game settings and preferences
//!
//! Persisted separately from game saves in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::KeyValueStore;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Sparks orbiting the charged orb
    pub fn orb_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 120,
            QualityPreset::High => 300,
        }
    }

    /// Bloom strength floor; charge can push it higher
    pub fn bloom_floor(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.0,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }

    /// Whether the background starfield drifts
    pub fn starfield_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Feel ===
    /// Vibrate on touch holds
    pub haptics: bool,
    /// Orb glow and particles
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Debug overlays ===
    /// Draw debris hitboxes during Scrap Runs
    pub show_hitboxes: bool,
    /// Draw debris flight curves during Scrap Runs
    pub show_curvature: bool,

    // === Accessibility ===
    /// Reduced motion (no orb bob or heartbeat)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            haptics: true,
            particles: true,
            show_fps: false,
            show_hitboxes: false,
            show_curvature: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops the particle cloud for performance
        if preset == QualityPreset::Low {
            self.particles = false;
        }
    }

    /// Effective particle count cap
    pub fn orb_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.orb_particles()
        }
    }

    /// Effective orb motion (respects reduced_motion)
    pub fn orb_motion(&self) -> bool {
        !self.reduced_motion
    }

    /// Storage key
    pub const STORAGE_KEY: &'static str = "orb_ascent_settings";

    /// Load settings, falling back to defaults on missing or corrupt data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Settings not saved: {}", e),
            },
            Err(e) => log::warn!("Settings not serialized: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[test]
    fn test_low_preset_drops_particles() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.orb_particles(), 0);
        assert_eq!(Settings::default().orb_particles(), 120);
    }

    #[test]
    fn test_settings_persist() {
        let mut store = MemoryStorage::new();
        assert_eq!(Settings::load(&store), Settings::default());

        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.haptics = false;
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_or_partial_settings() {
        let mut store = MemoryStorage::new();
        store.set(Settings::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());

        store.set(Settings::STORAGE_KEY, r#"{"quality":"High"}"#).unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.quality, QualityPreset::High);
        assert!(loaded.haptics);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }
}
