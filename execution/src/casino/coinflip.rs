use super::{Policy, Resolution};
use croupier_types::casino::GameKind;
use rand::{Rng, RngCore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Heads,
    Tails,
}

impl std::str::FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heads" | "h" => Ok(Self::Heads),
            "tails" | "t" => Ok(Self::Tails),
            _ => Err(()),
        }
    }
}

/// Even-money coin flip: a correct call returns double the bet.
#[derive(Clone, Copy, Debug)]
pub struct CoinFlip {
    pub call: Side,
}

impl CoinFlip {
    pub fn new(call: Side) -> Self {
        Self { call }
    }
}

impl Policy for CoinFlip {
    fn game(&self) -> GameKind {
        GameKind::Coinflip
    }

    fn resolve(&self, bet: u64, rng: &mut dyn RngCore) -> Resolution {
        let landed = if rng.gen_bool(0.5) {
            Side::Heads
        } else {
            Side::Tails
        };
        if landed == self.call {
            Resolution::Win {
                payout: bet.saturating_mul(2),
            }
        } else {
            Resolution::Lose
        }
    }
}
