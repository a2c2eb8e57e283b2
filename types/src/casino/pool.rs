use serde::{Deserialize, Serialize};
use std::fmt;

use super::{apply_bps, JACKPOT_BASE, LOTTERY_BASE, POOL_SKIM_BPS};

/// The shared prize pools
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Casino (slots) jackpot
    Jackpot,
    /// Lottery jackpot
    Lottery,
}

impl PoolKind {
    pub const ALL: [PoolKind; 2] = [PoolKind::Jackpot, PoolKind::Lottery];

    /// Fresh pool with this kind's base and skim.
    pub fn genesis(self) -> Pool {
        match self {
            Self::Jackpot => Pool::new(JACKPOT_BASE, POOL_SKIM_BPS),
            Self::Lottery => Pool::new(LOTTERY_BASE, POOL_SKIM_BPS),
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jackpot => write!(f, "jackpot"),
            Self::Lottery => write!(f, "lottery"),
        }
    }
}

/// A globally accumulating prize, paid out in full and reset to `base` on a win.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub amount: u64,
    pub base: u64,
    pub skim_bps: u64,
}

impl Pool {
    pub fn new(base: u64, skim_bps: u64) -> Self {
        Self {
            amount: base,
            base,
            skim_bps,
        }
    }

    /// Portion of `wager` routed into the pool.
    pub fn skim(&self, wager: u64) -> u64 {
        apply_bps(wager, self.skim_bps)
    }

    /// Add the skim of `wager`, returning the contribution.
    pub fn contribute(&mut self, wager: u64) -> u64 {
        let contribution = self.skim(wager);
        self.amount = self.amount.saturating_add(contribution);
        contribution
    }

    /// Take the whole amount and reset to base.
    pub fn drain(&mut self) -> u64 {
        std::mem::replace(&mut self.amount, self.base)
    }
}

/// Result of paying out a pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAward {
    pub pool: PoolKind,
    pub awarded: u64,
    pub new_amount: u64,
}

/// House-wide counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoStats {
    pub total_played: u64,
    pub total_wagered: u64,
    pub total_paid_out: u64,
}

impl CasinoStats {
    pub fn record(&mut self, wager: u64, payout: u64) {
        self.total_played = self.total_played.saturating_add(1);
        self.total_wagered = self.total_wagered.saturating_add(wager);
        self.total_paid_out = self.total_paid_out.saturating_add(payout);
    }
}
