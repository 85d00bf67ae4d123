//! The charging orb
//!
//! Holding the orb thrusts it and builds charge; letting go bleeds charge
//! away. Any charge burns into energy every tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::PhysicsParams;
use super::upgrades::{UpgradeId, UpgradeLevels};
use crate::consts::RELEASE_WOMP_THRESHOLD;

/// Charge below this is treated as fully drained
const CHARGE_EPSILON: f32 = 1e-6;
/// Surge chance gained per Toxic Surge level
const SURGE_CHANCE_PER_LEVEL: f32 = 0.05;
const SURGE_MULTIPLIER: f64 = 10.0;

/// State transition tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbTimingConfig {
    /// Charge needed (while holding) to leave Calm
    pub charging_threshold: f32,
    /// Seconds of continuous hold before going super-critical
    pub super_critical_hold_time: f32,
    /// Multiplier on orb spin rate
    pub spin_speed: f32,
}

impl Default for OrbTimingConfig {
    fn default() -> Self {
        Self {
            charging_threshold: 0.4,
            super_critical_hold_time: 15.0,
            spin_speed: 1.0,
        }
    }
}

/// Partial timing override layered over the defaults
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbTimingOverride {
    pub charging_threshold: Option<f32>,
    pub super_critical_hold_time: Option<f32>,
    pub spin_speed: Option<f32>,
}

impl OrbTimingConfig {
    pub fn with_override(self, o: &OrbTimingOverride) -> Self {
        Self {
            charging_threshold: o.charging_threshold.unwrap_or(self.charging_threshold),
            super_critical_hold_time: o
                .super_critical_hold_time
                .unwrap_or(self.super_critical_hold_time),
            spin_speed: o.spin_speed.unwrap_or(self.spin_speed),
        }
    }
}

/// Audiovisual mood of the orb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrbMood {
    #[default]
    Calm,
    Charging,
    SuperCritical,
}

impl OrbMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrbMood::Calm => "calm",
            OrbMood::Charging => "charging",
            OrbMood::SuperCritical => "super-critical",
        }
    }
}

/// Per-tick input
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbInput {
    pub holding: bool,
}

/// Everything outside the orb that shapes a tick
#[derive(Debug, Clone, Copy)]
pub struct OrbContext<'a> {
    pub physics: &'a PhysicsParams,
    pub upgrades: &'a UpgradeLevels,
    pub prestige_level: u32,
    pub timing: &'a OrbTimingConfig,
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbTick {
    /// Energy generated this tick
    pub energy: f64,
    /// Whether a Toxic Surge fired
    pub surged: bool,
    /// Charge after the tick
    pub charge: f32,
    /// New mood, if it changed this tick
    pub mood_changed: Option<OrbMood>,
    /// Release womp intensity when the orb was let go with enough charge
    pub release_womp: Option<f32>,
}

/// Orb simulation state (not persisted; charge is mirrored into `GameState`)
#[derive(Debug, Clone, Default)]
pub struct OrbState {
    pub velocity: f32,
    pub charge: f32,
    /// Continuous hold duration (seconds)
    pub hold_time: f32,
    /// Time since the orb scene started (seconds)
    pub elapsed: f32,
    pub holding: bool,
    pub mood: OrbMood,
}

impl OrbState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a stored charge level
    pub fn with_charge(charge: f32) -> Self {
        Self {
            charge: charge.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Advance one fixed step
    pub fn tick<R: Rng>(&mut self, input: OrbInput, ctx: &OrbContext, dt: f32, rng: &mut R) -> OrbTick {
        let physics = ctx.physics;
        let mut out = OrbTick::default();

        self.elapsed += dt;

        if self.holding && !input.holding && self.charge > RELEASE_WOMP_THRESHOLD {
            out.release_womp = Some((0.4 + self.charge * 0.6).clamp(0.4, 1.0));
        }
        self.holding = input.holding;

        if input.holding {
            self.velocity += physics.thrust_force * dt;
            self.charge = (self.charge + dt * 2.0).min(1.0);
            self.hold_time += dt;
        } else {
            let stabilization = ctx.upgrades.level(UpgradeId::OrbitalStabilization) as f32 * 0.02;
            let damping = (physics.charge_damping - stabilization).max(0.7);
            self.velocity -= physics.gravity * dt;
            self.charge *= damping;
            if self.charge < CHARGE_EPSILON {
                self.charge = 0.0;
            }
            self.hold_time = 0.0;
        }

        self.velocity = self
            .velocity
            .clamp(-physics.terminal_velocity, physics.terminal_velocity);

        if self.charge > 0.0 {
            let base = self.charge as f64 * 10.0 * dt as f64;
            let resonance = 1.0 + ctx.upgrades.level(UpgradeId::ResonanceTuner) as f64 * 0.15;
            let prestige = 1.0 + ctx.prestige_level as f64 * 0.5;
            let surge_chance =
                (ctx.upgrades.level(UpgradeId::CriticalSurge) as f32 * SURGE_CHANCE_PER_LEVEL).min(1.0);
            out.surged = surge_chance > 0.0 && rng.random::<f32>() < surge_chance;
            let surge = if out.surged { SURGE_MULTIPLIER } else { 1.0 };
            out.energy = base * resonance * prestige * surge;
        }

        let mood = self.mood_for(ctx.timing);
        if mood != self.mood {
            log::debug!("Orb mood {} -> {}", self.mood.as_str(), mood.as_str());
            self.mood = mood;
            out.mood_changed = Some(mood);
        }

        out.charge = self.charge;
        out
    }

    fn mood_for(&self, timing: &OrbTimingConfig) -> OrbMood {
        if !self.holding {
            OrbMood::Calm
        } else if self.hold_time >= timing.super_critical_hold_time {
            OrbMood::SuperCritical
        } else if self.charge >= timing.charging_threshold {
            OrbMood::Charging
        } else {
            OrbMood::Calm
        }
    }

    /// Presentation values derived from the current state
    pub fn pose(&self, timing: &OrbTimingConfig, bloom_floor: f32) -> OrbPose {
        let t = self.elapsed;
        let heartbeat = 1.0 + (t * if self.holding { 2.0 } else { 1.0 }).sin() * 0.05;
        let spin = (0.5 + self.charge * 3.0) * timing.spin_speed;
        OrbPose {
            scale: heartbeat + self.charge * 0.2,
            rotation_y: t * spin,
            rotation_x: (t * 0.3).sin() * 0.2,
            bob: (t * 2.0).sin() * 0.1 * (1.0 - self.charge * 0.5),
            particle_opacity: self.charge * 0.8,
            light_intensity: self.charge * 5.0,
            bloom: bloom_floor.max(self.charge * 2.0),
        }
    }
}

/// Orb transform and glow for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbPose {
    pub scale: f32,
    pub rotation_y: f32,
    pub rotation_x: f32,
    /// Vertical bob offset
    pub bob: f32,
    pub particle_opacity: f32,
    pub light_intensity: f32,
    pub bloom: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn run_ticks(
        orb: &mut OrbState,
        holding: bool,
        ticks: u32,
        physics: &PhysicsParams,
        upgrades: &UpgradeLevels,
        prestige_level: u32,
        rng: &mut Pcg32,
    ) -> (f64, Vec<OrbTick>) {
        let timing = OrbTimingConfig::default();
        let ctx = OrbContext {
            physics,
            upgrades,
            prestige_level,
            timing: &timing,
        };
        let mut energy = 0.0;
        let mut ticks_out = Vec::new();
        for _ in 0..ticks {
            let t = orb.tick(OrbInput { holding }, &ctx, SIM_DT, rng);
            energy += t.energy;
            ticks_out.push(t);
        }
        (energy, ticks_out)
    }

    #[test]
    fn test_holding_builds_charge_and_energy() {
        let mut orb = OrbState::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let physics = PhysicsParams::default();
        let upgrades = UpgradeLevels::new();

        let (energy, _) = run_ticks(&mut orb, true, 40, &physics, &upgrades, 0, &mut rng);
        assert!((orb.charge - 1.0).abs() < 1e-5);
        assert!(energy > 0.0);
        assert!(orb.velocity > 0.0);
        assert!(orb.velocity <= physics.terminal_velocity);
    }

    #[test]
    fn test_release_bleeds_charge_with_floor_on_damping() {
        let physics = PhysicsParams::default();
        let mut rng = Pcg32::seed_from_u64(2);

        let mut plain = OrbState::with_charge(1.0);
        run_ticks(&mut plain, false, 1, &physics, &UpgradeLevels::new(), 0, &mut rng);
        assert!((plain.charge - 0.95).abs() < 1e-6);

        // Gyro Binders subtract 0.02 per level, floored at 0.7
        let upgrades: UpgradeLevels = [(UpgradeId::OrbitalStabilization, 5)].into_iter().collect();
        let mut gyro = OrbState::with_charge(1.0);
        run_ticks(&mut gyro, false, 1, &physics, &upgrades, 0, &mut rng);
        assert!((gyro.charge - 0.85).abs() < 1e-6);

        let harsh = PhysicsParams {
            charge_damping: 0.5,
            ..physics
        };
        let mut floored = OrbState::with_charge(1.0);
        run_ticks(&mut floored, false, 1, &harsh, &UpgradeLevels::new(), 0, &mut rng);
        assert!((floored.charge - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_charge_eventually_drains_to_zero() {
        let physics = PhysicsParams::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut orb = OrbState::with_charge(1.0);
        let (_, ticks) = run_ticks(&mut orb, false, 900, &physics, &UpgradeLevels::new(), 0, &mut rng);
        assert_eq!(orb.charge, 0.0);
        assert_eq!(ticks.last().map(|t| t.energy), Some(0.0));
        assert_eq!(orb.velocity, -physics.terminal_velocity);
    }

    #[test]
    fn test_multipliers_scale_energy() {
        let physics = PhysicsParams::default();
        let timing = OrbTimingConfig::default();
        let base_levels = UpgradeLevels::new();
        let tuned: UpgradeLevels = [(UpgradeId::ResonanceTuner, 2)].into_iter().collect();

        let energy_for = |levels: &UpgradeLevels, prestige_level: u32| {
            let mut orb = OrbState::with_charge(0.5);
            orb.holding = true;
            let mut rng = Pcg32::seed_from_u64(4);
            let ctx = OrbContext {
                physics: &physics,
                upgrades: levels,
                prestige_level,
                timing: &timing,
            };
            orb.tick(OrbInput { holding: true }, &ctx, SIM_DT, &mut rng).energy
        };

        let base = energy_for(&base_levels, 0);
        assert!((energy_for(&tuned, 0) / base - 1.3).abs() < 1e-9);
        assert!((energy_for(&base_levels, 2) / base - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_surge_frequency_tracks_chance() {
        // Five levels give a 25% chance
        let physics = PhysicsParams::default();
        let upgrades: UpgradeLevels = [(UpgradeId::CriticalSurge, 5)].into_iter().collect();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut orb = OrbState::new();
        let (_, ticks) = run_ticks(&mut orb, true, 2000, &physics, &upgrades, 0, &mut rng);
        let surges = ticks.iter().filter(|t| t.surged).count();
        assert!(surges > 350 && surges < 650, "surges: {}", surges);
    }

    #[test]
    fn test_mood_transitions() {
        let physics = PhysicsParams::default();
        let upgrades = UpgradeLevels::new();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut orb = OrbState::new();

        // 0.4 charge needs 12 ticks at 2/s
        let (_, ticks) = run_ticks(&mut orb, true, 20, &physics, &upgrades, 0, &mut rng);
        assert_eq!(orb.mood, OrbMood::Charging);
        assert_eq!(ticks.iter().filter(|t| t.mood_changed.is_some()).count(), 1);

        run_ticks(&mut orb, true, 15 * 60, &physics, &upgrades, 0, &mut rng);
        assert_eq!(orb.mood, OrbMood::SuperCritical);

        let (_, ticks) = run_ticks(&mut orb, false, 1, &physics, &upgrades, 0, &mut rng);
        assert_eq!(orb.mood, OrbMood::Calm);
        assert_eq!(ticks[0].mood_changed, Some(OrbMood::Calm));
        assert_eq!(ticks[0].release_womp, Some(1.0));
    }

    #[test]
    fn test_no_womp_for_low_charge_release() {
        let physics = PhysicsParams::default();
        let upgrades = UpgradeLevels::new();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut orb = OrbState::new();
        run_ticks(&mut orb, true, 5, &physics, &upgrades, 0, &mut rng);
        let (_, ticks) = run_ticks(&mut orb, false, 1, &physics, &upgrades, 0, &mut rng);
        assert_eq!(ticks[0].release_womp, None);
    }

    #[test]
    fn test_timing_override() {
        let timing = OrbTimingConfig::default().with_override(&OrbTimingOverride {
            spin_speed: Some(2.0),
            ..Default::default()
        });
        assert_eq!(timing.spin_speed, 2.0);
        assert_eq!(timing.charging_threshold, 0.4);
    }

    #[test]
    fn test_pose_tracks_charge() {
        let timing = OrbTimingConfig::default();
        let idle = OrbState::new().pose(&timing, 0.6);
        assert_eq!(idle.bloom, 0.6);
        assert_eq!(idle.particle_opacity, 0.0);

        let charged = OrbState::with_charge(1.0).pose(&timing, 0.6);
        assert_eq!(charged.bloom, 2.0);
        assert_eq!(charged.light_intensity, 5.0);
        assert!((charged.scale - 1.2).abs() < 1e-6);
    }
}
