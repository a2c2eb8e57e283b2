//! Game policies.
//!
//! A policy decides the outcome of a single-shot game. Everything around the
//! outcome (the loan gate, debiting the bet, skimming pools, crediting the
//! payout and recording statistics) is done by [crate::Layer::play], so a
//! policy only has to describe its odds.

use croupier_types::casino::{GameKind, PoolKind};
use rand::RngCore;

mod coinflip;

pub use coinflip::{CoinFlip, Side};

/// Outcome of one resolved game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The bet is kept by the house.
    Lose,
    /// Total returned to the player (stake included).
    Win { payout: u64 },
    /// The player takes the whole pool instead of a fixed payout.
    Jackpot(PoolKind),
}

/// Trait for single-shot game implementations.
pub trait Policy: Send + Sync {
    fn game(&self) -> GameKind;

    /// Pools skimmed from every bet on this game.
    fn pools(&self) -> &[PoolKind] {
        &[PoolKind::Lottery]
    }

    fn resolve(&self, bet: u64, rng: &mut dyn RngCore) -> Resolution;
}
