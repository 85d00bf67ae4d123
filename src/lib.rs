//! Orb Ascent - an idle orb-charging game with arcade Scrap Runs
//!
//! Core modules:
//! - `sim`: Deterministic simulation (orb charging, scrap runs, progression)
//! - `assets`: Scrap definitions and the FBX classification pipeline
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Versioned save/load of progression
//! - `settings`: Player preferences

pub mod assets;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one animation frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Scrap run frame length in milliseconds
    pub const RUN_TICK_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Energy needed before a prestige is allowed
    pub const PRESTIGE_ENERGY_THRESHOLD: f64 = 10_000.0;
    /// Divisor inside the essence square root
    pub const ESSENCE_DIVISOR: f64 = 10_000.0;

    /// Scrap run launch cooldown before upgrades (2 minutes)
    pub const BASE_COOLDOWN_MS: f64 = 2.0 * 60.0 * 1000.0;
    /// Cooldown removed per Warp Breaker level
    pub const COOLDOWN_REDUCTION_PER_LEVEL_MS: f64 = 2.0 * 60.0 * 1000.0;
    /// Cooldown floor regardless of upgrades
    pub const MIN_COOLDOWN_MS: f64 = 30_000.0;

    /// Charge above which a finished run pays the charge bonus
    pub const RUN_CHARGE_BONUS_THRESHOLD: f64 = 0.9;
    /// Charge above which letting go of the orb plays the release womp
    pub const RELEASE_WOMP_THRESHOLD: f32 = 0.35;

    /// Autosave cadence while the orb is idling
    pub const AUTOSAVE_INTERVAL_MS: f64 = 5_000.0;
}

/// Linear interpolation, matching the per-frame smoothing used by the run
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Round to four decimals (the precision written to generated data)
#[inline]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
