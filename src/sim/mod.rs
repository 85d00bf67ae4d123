//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Wall-clock time is passed in, never read
//! - No rendering or platform dependencies

pub mod error;
pub mod orb;
pub mod scrap_run;
pub mod state;
pub mod upgrades;

pub use error::{GameError, GameResult};
pub use orb::{
    OrbContext, OrbInput, OrbMood, OrbPose, OrbState, OrbTick, OrbTimingConfig, OrbTimingOverride,
};
pub use scrap_run::{
    Debris, DebrisKind, RunEvent, RunInput, RunOutcome, RunState, ScrapRunConfig, junk_slot,
};
pub use state::{GameState, PhysicsParams, PhysicsPatch, StatePatch, essence_for};
pub use upgrades::{
    CategoryId, Upgrade, UpgradeCategory, UpgradeId, UpgradeLevels, UpgradeRole, categories,
    upgrade, upgrade_cost,
};
