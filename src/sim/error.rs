//! Errors returned by progression actions
//!
//! A failed action leaves the game state untouched.

use thiserror::Error;

use super::upgrades::UpgradeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// Upgrade is already at its maximum level
    #[error("upgrade {} is already at max level {max}", id.as_str())]
    UpgradeMaxed { id: UpgradeId, max: u32 },

    /// Not enough scrap for the next level
    #[error("need {cost} scrap, have {available}")]
    InsufficientScrap { cost: u64, available: u64 },

    /// A scrap run is already in progress
    #[error("a scrap run is already active")]
    RunAlreadyActive,

    /// Launch cooldown has not elapsed yet
    #[error("scrap run cooling down ({remaining_ms:.0} ms left)")]
    CoolingDown { remaining_ms: f64 },

    /// Not enough energy to prestige
    #[error("prestige needs {required} energy, have {energy:.0}")]
    PrestigeLocked { energy: f64, required: f64 },
}

pub type GameResult<T> = Result<T, GameError>;
