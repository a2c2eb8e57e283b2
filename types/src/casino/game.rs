use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PoolAward, PoolKind};

/// Casino games that settle against the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Slots,
    Blackjack,
    Roulette,
    Baccarat,
    Crash,
    Mines,
    Plinko,
    Wheel,
    Dice,
    Coinflip,
    War,
    Lottery,
}

impl GameKind {
    /// Games played over several interactions hold a session while in flight.
    pub fn is_session_based(self) -> bool {
        matches!(self, Self::Blackjack | Self::Crash | Self::Mines)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Slots => "slots",
            Self::Blackjack => "blackjack",
            Self::Roulette => "roulette",
            Self::Baccarat => "baccarat",
            Self::Crash => "crash",
            Self::Mines => "mines",
            Self::Plinko => "plinko",
            Self::Wheel => "wheel",
            Self::Dice => "dice",
            Self::Coinflip => "coinflip",
            Self::War => "war",
            Self::Lottery => "lottery",
        };
        f.write_str(name)
    }
}

/// A debited wager recorded on the account until it is settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWager {
    pub game: GameKind,
    pub bet: u64,
}

/// A wager that has been debited and skimmed, awaiting settlement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerReceipt {
    pub game: GameKind,
    pub bet: u64,
    pub contributions: Vec<(PoolKind, u64)>,
    pub balance: u64,
}

/// Final result of a wager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub game: GameKind,
    pub bet: u64,
    /// Total credited to the player, including any pool award.
    pub payout: u64,
    pub won: bool,
    pub jackpot: Option<PoolAward>,
    pub balance: u64,
}

