//! Game progression state
//!
//! Everything that survives between sessions lives here: energy, scrap,
//! upgrade levels and prestige. Every mutation goes through a reducer
//! method so clamping rules hold no matter who calls it.

use serde::{Deserialize, Serialize};

use super::error::{GameError, GameResult};
use super::upgrades::{UpgradeId, UpgradeLevels, upgrade, upgrade_cost};
use crate::consts::*;

/// Orb flight tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsParams {
    pub gravity: f32,
    pub thrust_force: f32,
    pub terminal_velocity: f32,
    /// Per-tick charge retention while released
    pub charge_damping: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            thrust_force: 1.2,
            terminal_velocity: 5.0,
            charge_damping: 0.95,
        }
    }
}

/// Partial physics update (dev inspection)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsPatch {
    pub gravity: Option<f32>,
    pub thrust_force: Option<f32>,
    pub terminal_velocity: Option<f32>,
    pub charge_damping: Option<f32>,
}

/// Partial state update (dev inspection). Physics and upgrades merge,
/// everything else replaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    pub energy: Option<f64>,
    pub total_energy: Option<f64>,
    pub charge: Option<f64>,
    pub scrap: Option<u64>,
    pub total_scrap: Option<u64>,
    pub last_run_time: Option<f64>,
    pub best_run_score: Option<u64>,
    pub scrap_run_active: Option<bool>,
    pub prestige_level: Option<u32>,
    pub cosmic_essence: Option<u64>,
    pub physics: Option<PhysicsPatch>,
    pub upgrades: Option<UpgradeLevels>,
}

/// Persisted progression (the client-side store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub energy: f64,
    pub total_energy: f64,
    /// Orb charge in [0, 1]
    pub charge: f64,
    pub scrap: u64,
    pub total_scrap: u64,
    /// Unix timestamp (ms) of the last run launch
    pub last_run_time: f64,
    pub best_run_score: u64,
    pub scrap_run_active: bool,
    pub prestige_level: u32,
    pub cosmic_essence: u64,
    pub physics: PhysicsParams,
    pub upgrades: UpgradeLevels,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            energy: 0.0,
            total_energy: 0.0,
            charge: 0.0,
            scrap: 0,
            total_scrap: 0,
            last_run_time: 0.0,
            best_run_score: 0,
            scrap_run_active: false,
            prestige_level: 0,
            cosmic_essence: 0,
            physics: PhysicsParams::default(),
            upgrades: UpgradeLevels::new(),
        }
    }
}

/// Essence awarded for a lifetime energy total
pub fn essence_for(total_energy: f64) -> u64 {
    (total_energy.max(0.0) / ESSENCE_DIVISOR).sqrt().floor() as u64
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, id: UpgradeId) -> u32 {
        self.upgrades.level(id)
    }

    /// Add (or drain, when negative) energy. Only gains count toward the total.
    pub fn add_energy(&mut self, n: f64) {
        self.energy = (self.energy + n).max(0.0);
        if n > 0.0 {
            self.total_energy += n;
        }
    }

    pub fn set_charge(&mut self, n: f64) {
        self.charge = if n.is_nan() { 0.0 } else { n.clamp(0.0, 1.0) };
    }

    pub fn add_scrap(&mut self, n: u64) {
        self.scrap += n;
        self.total_scrap += n;
    }

    /// Launch cooldown after Warp Breaker levels
    pub fn effective_cooldown_ms(&self) -> f64 {
        let reduction = self.level(UpgradeId::WarpCooldown) as f64 * COOLDOWN_REDUCTION_PER_LEVEL_MS;
        (BASE_COOLDOWN_MS - reduction).max(MIN_COOLDOWN_MS)
    }

    pub fn cooldown_remaining_ms(&self, now: f64) -> f64 {
        (self.effective_cooldown_ms() - (now - self.last_run_time)).max(0.0)
    }

    pub fn can_launch(&self, now: f64) -> bool {
        !self.scrap_run_active && self.cooldown_remaining_ms(now) <= 0.0
    }

    /// Begin a scrap run at `now` (ms)
    pub fn start_scrap_run(&mut self, now: f64) -> GameResult<()> {
        if self.scrap_run_active {
            return Err(GameError::RunAlreadyActive);
        }
        let remaining_ms = self.cooldown_remaining_ms(now);
        if remaining_ms > 0.0 {
            return Err(GameError::CoolingDown { remaining_ms });
        }
        self.scrap_run_active = true;
        self.last_run_time = now;
        log::info!("Scrap run started");
        Ok(())
    }

    /// Scrap a run would pay out with the current charge and prestige
    pub fn run_payout(&self, score: u64, collected: u32) -> u64 {
        let base_scrap = (score / 10) as f64;
        let charge_bonus = if self.charge > RUN_CHARGE_BONUS_THRESHOLD { 1.5 } else { 1.0 };
        let prestige_bonus = 1.0 + self.prestige_level as f64 * 0.1;
        ((base_scrap + collected as f64) * charge_bonus * prestige_bonus).floor() as u64
    }

    /// Close out a run and bank its scrap. Returns scrap earned.
    pub fn end_scrap_run(&mut self, score: u64, collected: u32) -> u64 {
        let earned = self.run_payout(score, collected);
        self.add_scrap(earned);
        self.best_run_score = self.best_run_score.max(score);
        self.scrap_run_active = false;
        self.charge = 0.0;
        log::info!("Scrap run ended: score {}, collected {}, +{} scrap", score, collected, earned);
        earned
    }

    /// Buy the next level of an upgrade. Returns the new level.
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> GameResult<u32> {
        let current = self.level(id);
        let max = upgrade(id).max;
        if current >= max {
            return Err(GameError::UpgradeMaxed { id, max });
        }
        let cost = upgrade_cost(id, current);
        if self.scrap < cost {
            return Err(GameError::InsufficientScrap {
                cost,
                available: self.scrap,
            });
        }
        self.scrap -= cost;
        self.upgrades.set(id, current + 1);
        log::info!("Purchased {} level {} for {} scrap", id.as_str(), current + 1, cost);
        Ok(current + 1)
    }

    pub fn can_prestige(&self) -> bool {
        self.energy >= PRESTIGE_ENERGY_THRESHOLD
    }

    /// Essence the next prestige would award
    pub fn prestige_preview(&self) -> u64 {
        essence_for(self.total_energy)
    }

    /// Reset energy, scrap and upgrades for a permanent prestige level.
    /// Returns essence gained.
    pub fn prestige(&mut self) -> GameResult<u64> {
        if !self.can_prestige() {
            return Err(GameError::PrestigeLocked {
                energy: self.energy,
                required: PRESTIGE_ENERGY_THRESHOLD,
            });
        }
        let gained = essence_for(self.total_energy);
        self.energy = 0.0;
        self.scrap = 0;
        self.upgrades.clear();
        self.prestige_level += 1;
        self.cosmic_essence += gained;
        log::info!("Prestige {} reached (+{} essence)", self.prestige_level, gained);
        Ok(gained)
    }

    /// Clamp fields into their valid ranges (after loading untrusted data)
    pub fn sanitize(&mut self) {
        self.set_charge(self.charge);
        if !self.energy.is_finite() || self.energy < 0.0 {
            self.energy = 0.0;
        }
        if !self.total_energy.is_finite() || self.total_energy < self.energy {
            self.total_energy = self.energy;
        }
        let clamped: UpgradeLevels = self
            .upgrades
            .iter()
            .map(|(id, level)| (id, level.min(upgrade(id).max)))
            .collect();
        self.upgrades = clamped;
    }

    // === Dev inspection ===

    pub fn dev_set_state(&mut self, patch: StatePatch) {
        if let Some(v) = patch.energy {
            self.energy = v;
        }
        if let Some(v) = patch.total_energy {
            self.total_energy = v;
        }
        if let Some(v) = patch.charge {
            self.charge = v;
        }
        if let Some(v) = patch.scrap {
            self.scrap = v;
        }
        if let Some(v) = patch.total_scrap {
            self.total_scrap = v;
        }
        if let Some(v) = patch.last_run_time {
            self.last_run_time = v;
        }
        if let Some(v) = patch.best_run_score {
            self.best_run_score = v;
        }
        if let Some(v) = patch.scrap_run_active {
            self.scrap_run_active = v;
        }
        if let Some(v) = patch.prestige_level {
            self.prestige_level = v;
        }
        if let Some(v) = patch.cosmic_essence {
            self.cosmic_essence = v;
        }
        if let Some(physics) = patch.physics {
            let p = &mut self.physics;
            p.gravity = physics.gravity.unwrap_or(p.gravity);
            p.thrust_force = physics.thrust_force.unwrap_or(p.thrust_force);
            p.terminal_velocity = physics.terminal_velocity.unwrap_or(p.terminal_velocity);
            p.charge_damping = physics.charge_damping.unwrap_or(p.charge_damping);
        }
        if let Some(upgrades) = patch.upgrades {
            self.upgrades.merge(&upgrades);
        }
    }

    pub fn dev_reset(&mut self) {
        *self = Self::default();
    }

    /// Nudge an upgrade level, clamped to [0, max]
    pub fn dev_adjust_upgrade(&mut self, id: UpgradeId, delta: i32) {
        let current = self.level(id) as i64;
        let next = (current + delta as i64).clamp(0, upgrade(id).max as i64);
        if next != current {
            self.upgrades.set(id, next as u32);
        }
    }
}
