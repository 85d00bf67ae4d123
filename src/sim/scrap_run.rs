//! Scrap Run: the arcade sub-game
//!
//! The player hovers between two orbits and strafes sideways while debris
//! streams toward the camera along a curved path. Scrap is collected, bad
//! debris costs shields, then scrap, then the run.
//!
//! A tick is one animation frame. Position smoothing is per frame; only
//! the spawn clock uses the elapsed milliseconds.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::upgrades::{UpgradeId, UpgradeLevels};
use crate::lerp;

/// Collected pieces per ring around the player
const JUNK_PER_RING: u32 = 20;
/// Extra reach added to the hitbox for contact tests
const CONTACT_MARGIN: f32 = 0.3;
const MAX_LOSS_PER_HIT: u32 = 3;
const SCORE_PER_SCRAP: u64 = 10;

/// Tunnel tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapRunConfig {
    /// Resting orbit height
    pub inner_orbit: f32,
    /// Orbit height while holding
    pub outer_orbit: f32,
    /// Per-frame lerp factor toward the orbit target
    pub orbit_speed: f32,
    /// Per-frame lerp factor toward the strafe target
    pub strafe_speed: f32,
    pub max_strafe: f32,
    /// Debris z advance per frame
    pub debris_speed: f32,
    pub spawn_distance: f32,
    pub despawn_distance: f32,
    /// Milliseconds between spawns
    pub spawn_interval: f64,
    pub curvature_strength: f32,
    /// Probability that a spawn is collectable scrap
    pub good_ratio: f32,
}

impl Default for ScrapRunConfig {
    fn default() -> Self {
        Self {
            inner_orbit: -2.0,
            outer_orbit: 1.0,
            orbit_speed: 0.08,
            strafe_speed: 0.1,
            max_strafe: 3.0,
            debris_speed: 0.15,
            spawn_distance: -40.0,
            despawn_distance: 8.0,
            spawn_interval: 1000.0,
            curvature_strength: 0.15,
            good_ratio: 0.7,
        }
    }
}

impl ScrapRunConfig {
    /// Effective config after Thruster Fins and Landfill Slowdown
    pub fn apply_upgrades(&self, levels: &UpgradeLevels) -> Self {
        let afterburners = levels.level(UpgradeId::Afterburners) as f32;
        let dilation = levels.level(UpgradeId::TimeDilation);
        Self {
            strafe_speed: self.strafe_speed + afterburners * 0.04,
            max_strafe: self.max_strafe + afterburners * 0.5,
            debris_speed: self.debris_speed * (1.0 - dilation as f32 * 0.12),
            spawn_interval: self.spawn_interval * (1.0 + dilation as f64 * 0.15),
            ..*self
        }
    }

    /// Sideways/vertical bend at a given depth
    fn curve_at(&self, z: f32) -> f32 {
        let progress = (z - self.spawn_distance) / (self.despawn_distance - self.spawn_distance);
        (progress * std::f32::consts::PI).sin() * self.curvature_strength
    }

    /// Debris position on its curved path
    pub fn path_point(&self, origin: Vec2, z: f32) -> Vec3 {
        let curve = self.curve_at(z);
        Vec3::new(
            origin.x + origin.x * curve * 0.5,
            origin.y + origin.x.abs() * curve,
            z,
        )
    }

    /// Sampled trajectory from spawn to despawn (`steps + 1` points)
    pub fn curve_preview(&self, origin: Vec2, steps: u32) -> Vec<Vec3> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|step| {
                let t = step as f32 / steps as f32;
                let z = self.spawn_distance + t * (self.despawn_distance - self.spawn_distance);
                self.path_point(origin, z)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebrisKind {
    /// Collectable scrap
    Good,
    /// Hazard
    Bad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debris {
    pub id: u32,
    pub kind: DebrisKind,
    /// Spawn x/y; the path bends relative to this
    pub origin: Vec2,
    pub position: Vec3,
    /// Tumble angles (x, y)
    pub rotation: Vec2,
    pub spin: Vec2,
}

/// Per-frame player input
#[derive(Debug, Clone, Copy, Default)]
pub struct RunInput {
    pub holding: bool,
    /// Horizontal pointer position normalized to [-1, 1]
    pub pointer: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    GoodScrap { collected: u32, score: u64 },
    /// A shield charge absorbed a hit
    Shield { remaining: u32 },
    /// Hit while unshielded; `lost` pieces of scrap dropped
    BadDebris { lost: u32 },
    GameOver,
}

/// Final tally handed back to the progression store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    pub score: u64,
    pub collected: u32,
}

/// A single Scrap Run
#[derive(Debug, Clone)]
pub struct RunState {
    pub config: ScrapRunConfig,
    pub endless: bool,
    pub score: u64,
    pub collected: u32,
    pub shields: u32,
    pub game_over: bool,
    pub player: Vec3,
    pub player_spin: f32,
    pub debris: Vec<Debris>,
    pub holding: bool,
    tractor_level: u32,
    elapsed_ms: f64,
    last_spawn_ms: f64,
    next_id: u32,
    rng: Pcg32,
}

impl RunState {
    pub fn new(seed: u64, base: &ScrapRunConfig, levels: &UpgradeLevels, endless: bool) -> Self {
        let config = base.apply_upgrades(levels);
        let shields = levels.level(UpgradeId::ShieldGenerator);
        log::info!(
            "Scrap run started (seed {}, shields {}, endless {})",
            seed,
            shields,
            endless
        );
        Self {
            player: Vec3::new(0.0, config.inner_orbit, 5.0),
            config,
            endless,
            score: 0,
            collected: 0,
            shields,
            game_over: false,
            player_spin: 0.0,
            debris: Vec::new(),
            holding: false,
            tractor_level: levels.level(UpgradeId::TractorBeam),
            elapsed_ms: 0.0,
            last_spawn_ms: 0.0,
            next_id: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Whether the run still accepts ticks
    pub fn is_running(&self) -> bool {
        !self.game_over || self.endless
    }

    /// Current pickup radius
    pub fn hitbox_radius(&self) -> f32 {
        0.5 + self.collected as f32 * 0.1 + self.tractor_level as f32 * 0.2
    }

    /// Advance one frame, `dt_ms` milliseconds after the previous one
    pub fn tick(&mut self, input: RunInput, dt_ms: f64) -> Vec<RunEvent> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }

        self.holding = input.holding;
        self.elapsed_ms += dt_ms;

        let orbit_target = if input.holding {
            self.config.outer_orbit
        } else {
            self.config.inner_orbit
        };
        let strafe_target = input
            .pointer
            .map(|p| p.clamp(-1.0, 1.0) * self.config.max_strafe)
            .unwrap_or(0.0);
        self.player.y = lerp(self.player.y, orbit_target, self.config.orbit_speed);
        self.player.x = lerp(self.player.x, strafe_target, self.config.strafe_speed);
        self.player_spin += 0.01;

        if self.elapsed_ms - self.last_spawn_ms > self.config.spawn_interval {
            self.last_spawn_ms = self.elapsed_ms;
            self.spawn();
        }

        let reach = self.hitbox_radius() + CONTACT_MARGIN;
        let mut i = self.debris.len();
        while i > 0 {
            i -= 1;
            let config = self.config;
            let piece = &mut self.debris[i];
            piece.position = config.path_point(piece.origin, piece.position.z + config.debris_speed);
            piece.rotation += piece.spin;

            if piece.position.distance(self.player) < reach {
                let kind = piece.kind;
                self.debris.remove(i);
                events.push(self.resolve_contact(kind));
                continue;
            }

            if piece.position.z > config.despawn_distance {
                self.debris.remove(i);
            }
        }

        events
    }

    fn resolve_contact(&mut self, kind: DebrisKind) -> RunEvent {
        match kind {
            DebrisKind::Good => {
                self.collected += 1;
                self.score += SCORE_PER_SCRAP;
                RunEvent::GoodScrap {
                    collected: self.collected,
                    score: self.score,
                }
            }
            DebrisKind::Bad if self.shields > 0 => {
                self.shields -= 1;
                RunEvent::Shield {
                    remaining: self.shields,
                }
            }
            DebrisKind::Bad if self.collected > 0 => {
                let lost = self.collected.min(MAX_LOSS_PER_HIT);
                self.collected -= lost;
                RunEvent::BadDebris { lost }
            }
            DebrisKind::Bad => {
                if !self.endless {
                    self.game_over = true;
                    log::info!("Scrap run over: score {} collected {}", self.score, self.collected);
                }
                RunEvent::GameOver
            }
        }
    }

    fn spawn(&mut self) {
        let kind = if self.rng.random::<f32>() < self.config.good_ratio {
            DebrisKind::Good
        } else {
            DebrisKind::Bad
        };
        let x0 = (self.rng.random::<f32>() - 0.5) * 6.0;
        let y0 = (self.rng.random::<f32>() - 0.5) * 4.0 - 1.0;
        let spin = Vec2::new(
            self.rng.random::<f32>() * 0.04 - 0.02,
            self.rng.random::<f32>() * 0.04 - 0.02,
        );
        self.add_debris(kind, Vec2::new(x0, y0), self.config.spawn_distance, spin);
    }

    fn add_debris(&mut self, kind: DebrisKind, origin: Vec2, z: f32, spin: Vec2) {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.debris.push(Debris {
            id,
            kind,
            origin,
            position: Vec3::new(origin.x, origin.y, z),
            rotation: Vec2::ZERO,
            spin,
        });
    }

    /// Orb glow level shown during the run
    pub fn visual_charge(&self) -> f32 {
        let hold = if self.holding { 0.4 } else { 0.0 };
        (0.2 + self.collected as f32 * 0.05 + hold).min(1.0)
    }

    pub fn outcome(&self) -> RunOutcome {
        RunOutcome {
            score: self.score,
            collected: self.collected,
        }
    }

    /// Forfeit: an aborted run pays nothing
    pub fn abort(&mut self) -> RunOutcome {
        log::info!("Scrap run aborted with {} scrap aboard", self.collected);
        self.game_over = true;
        self.endless = false;
        RunOutcome::default()
    }
}

/// Offset of the `index`-th collected piece orbiting the player
pub fn junk_slot(index: u32) -> Vec3 {
    let angle = (index as f32 / JUNK_PER_RING as f32) * std::f32::consts::TAU;
    let radius = 0.8 + (index / JUNK_PER_RING) as f32 * 0.3;
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}
