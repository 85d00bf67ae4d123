//! Scrap upgrade catalog
//!
//! Upgrades are bought with scrap and grouped into three categories:
//! idle multipliers (Compactors), run helpers (Scavengers), and pacing
//! tweaks (Time-Shifted Landfill).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upgrade identifiers (serialized with the camelCase save keys)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeId {
    ResonanceTuner,
    CriticalSurge,
    OrbitalStabilization,
    TractorBeam,
    ShieldGenerator,
    Afterburners,
    WarpCooldown,
    TimeDilation,
}

impl UpgradeId {
    /// Every upgrade in catalog order
    pub const ALL: [UpgradeId; 8] = [
        UpgradeId::ResonanceTuner,
        UpgradeId::CriticalSurge,
        UpgradeId::OrbitalStabilization,
        UpgradeId::TractorBeam,
        UpgradeId::ShieldGenerator,
        UpgradeId::Afterburners,
        UpgradeId::WarpCooldown,
        UpgradeId::TimeDilation,
    ];

    /// Save key / DOM key
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::ResonanceTuner => "resonanceTuner",
            UpgradeId::CriticalSurge => "criticalSurge",
            UpgradeId::OrbitalStabilization => "orbitalStabilization",
            UpgradeId::TractorBeam => "tractorBeam",
            UpgradeId::ShieldGenerator => "shieldGenerator",
            UpgradeId::Afterburners => "afterburners",
            UpgradeId::WarpCooldown => "warpCooldown",
            UpgradeId::TimeDilation => "timeDilation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Catalog entry for this id
    pub fn info(&self) -> &'static Upgrade {
        upgrade(*self)
    }
}

/// What part of the loop an upgrade helps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeRole {
    Idle,
    Runner,
    Tempo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryId {
    Harmonic,
    Scavenger,
    Chronos,
}

/// A purchasable upgrade
#[derive(Debug)]
pub struct Upgrade {
    pub id: UpgradeId,
    pub base_cost: u64,
    /// Cost growth per level
    pub scale: f64,
    pub max: u32,
    pub label: &'static str,
    pub desc: &'static str,
    pub role: UpgradeRole,
    pub per_level: &'static str,
    /// (level, unlock text)
    pub breakpoints: &'static [(u32, &'static str)],
    pub hint: &'static str,
}

#[derive(Debug)]
pub struct UpgradeCategory {
    pub id: CategoryId,
    pub label: &'static str,
    /// CSS colour used by the upgrade panel
    pub accent: &'static str,
    pub upgrades: &'static [Upgrade],
}

static HARMONIC: [Upgrade; 3] = [
    Upgrade {
        id: UpgradeId::ResonanceTuner,
        base_cost: 100,
        scale: 1.8,
        max: 15,
        label: "Compactor Rhythm",
        desc: "+15% trash compression per level",
        role: UpgradeRole::Idle,
        per_level: "+15% mass gain",
        breakpoints: &[],
        hint: "Best early pick for idle growth.",
    },
    Upgrade {
        id: UpgradeId::CriticalSurge,
        base_cost: 400,
        scale: 2.0,
        max: 5,
        label: "Toxic Surge",
        desc: "5% chance per level to ignite a 10x burn tick while holding",
        role: UpgradeRole::Idle,
        per_level: "+5% surge chance",
        breakpoints: &[(3, "Surge streaks extend while charging")],
        hint: "Pair with high charge to spike prestige income.",
    },
    Upgrade {
        id: UpgradeId::OrbitalStabilization,
        base_cost: 750,
        scale: 2.1,
        max: 5,
        label: "Gyro Binders",
        desc: "Locks charge longer when you let go",
        role: UpgradeRole::Idle,
        per_level: "-2% charge bleed",
        breakpoints: &[(4, "Charge ring stays lit when gliding")],
        hint: "Stretches idle gains between taps.",
    },
];

static SCAVENGER: [Upgrade; 3] = [
    Upgrade {
        id: UpgradeId::TractorBeam,
        base_cost: 500,
        scale: 2.0,
        max: 5,
        label: "Junk Magnet",
        desc: "Pull in stray trash from further away",
        role: UpgradeRole::Runner,
        per_level: "+0.2 pickup radius",
        breakpoints: &[
            (3, "Visible magnet trails on close scrap"),
            (5, "Auto-collect field engages on near-misses"),
        ],
        hint: "Best opener for safer Scrap Runs.",
    },
    Upgrade {
        id: UpgradeId::ShieldGenerator,
        base_cost: 900,
        scale: 2.2,
        max: 3,
        label: "Hazmat Shielding",
        desc: "Ignore one collision per shield charge",
        role: UpgradeRole::Runner,
        per_level: "+1 shield charge",
        breakpoints: &[
            (2, "Pulse tap gains wider blast"),
            (3, "Forcefield aura stays active"),
        ],
        hint: "Great for spiky tunnels and learning routes.",
    },
    Upgrade {
        id: UpgradeId::Afterburners,
        base_cost: 1200,
        scale: 2.3,
        max: 3,
        label: "Thruster Fins",
        desc: "Sharper strafe speed for lane changes",
        role: UpgradeRole::Runner,
        per_level: "+0.04 strafe speed, +0.5 lane span",
        breakpoints: &[(2, "Adds exhaust trail for motion cues")],
        hint: "Pairs with Junk Magnet for aggressive scoops.",
    },
];

static CHRONOS: [Upgrade; 2] = [
    Upgrade {
        id: UpgradeId::WarpCooldown,
        base_cost: 1500,
        scale: 2.6,
        max: 5,
        label: "Warp Breaker",
        desc: "-2 min launch cooldown per level",
        role: UpgradeRole::Tempo,
        per_level: "-2 min launch cooldown",
        breakpoints: &[],
        hint: "Prestige-gated pacing unlock.",
    },
    Upgrade {
        id: UpgradeId::TimeDilation,
        base_cost: 2000,
        scale: 2.8,
        max: 3,
        label: "Landfill Slowdown",
        desc: "Trash tunnel debris moves slower",
        role: UpgradeRole::Tempo,
        per_level: "-12% debris speed, +15% spawn spacing",
        breakpoints: &[],
        hint: "Great for high-speed lanes with afterburners.",
    },
];

static CATEGORIES: [UpgradeCategory; 3] = [
    UpgradeCategory {
        id: CategoryId::Harmonic,
        label: "Compactors",
        accent: "#f97316",
        upgrades: &HARMONIC,
    },
    UpgradeCategory {
        id: CategoryId::Scavenger,
        label: "Scavengers",
        accent: "#22c55e",
        upgrades: &SCAVENGER,
    },
    UpgradeCategory {
        id: CategoryId::Chronos,
        label: "Time-Shifted Landfill",
        accent: "#38bdf8",
        upgrades: &CHRONOS,
    },
];

/// All categories in display order
pub fn categories() -> &'static [UpgradeCategory] {
    &CATEGORIES
}

/// Look up an upgrade definition
pub fn upgrade(id: UpgradeId) -> &'static Upgrade {
    match id {
        UpgradeId::ResonanceTuner => &HARMONIC[0],
        UpgradeId::CriticalSurge => &HARMONIC[1],
        UpgradeId::OrbitalStabilization => &HARMONIC[2],
        UpgradeId::TractorBeam => &SCAVENGER[0],
        UpgradeId::ShieldGenerator => &SCAVENGER[1],
        UpgradeId::Afterburners => &SCAVENGER[2],
        UpgradeId::WarpCooldown => &CHRONOS[0],
        UpgradeId::TimeDilation => &CHRONOS[1],
    }
}

/// Scrap cost of buying the next level from `current_level`
pub fn upgrade_cost(id: UpgradeId, current_level: u32) -> u64 {
    let upgrade = upgrade(id);
    (upgrade.base_cost as f64 * upgrade.scale.powi(current_level as i32)).floor() as u64
}

/// Purchased levels per upgrade (missing = level 0)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeLevels(BTreeMap<UpgradeId, u32>);

impl UpgradeLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, id: UpgradeId) -> u32 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// Set a level; zero removes the entry
    pub fn set(&mut self, id: UpgradeId, level: u32) {
        if level == 0 {
            self.0.remove(&id);
        } else {
            self.0.insert(id, level);
        }
    }

    /// Overlay another map on top of this one
    pub fn merge(&mut self, other: &UpgradeLevels) {
        for (id, level) in other.iter() {
            self.set(id, level);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UpgradeId, u32)> + '_ {
        self.0.iter().map(|(id, level)| (*id, *level))
    }
}

impl FromIterator<(UpgradeId, u32)> for UpgradeLevels {
    fn from_iter<T: IntoIterator<Item = (UpgradeId, u32)>>(iter: T) -> Self {
        let mut levels = Self::new();
        for (id, level) in iter {
            levels.set(id, level);
        }
        levels
    }
}
