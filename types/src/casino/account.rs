use serde::{Deserialize, Serialize};

use super::{GameKind, LoanId, OpenWager};
use crate::execution::Failure;

/// External identity of an account (the chat platform's user id).
pub type AccountId = String;

/// Lifetime gambling statistics for an account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub games_played: u64,
    pub games_won: u64,
    pub total_winnings: u64,
    pub total_lost: u64,
    pub biggest_win: u64,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl Stats {
    /// Record the result of one settled game.
    pub fn record_game(&mut self, won: bool) {
        self.games_played = self.games_played.saturating_add(1);
        if won {
            self.games_won = self.games_won.saturating_add(1);
            self.current_streak = self.current_streak.saturating_add(1);
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    /// Share of games won, in basis points.
    pub fn win_rate_bps(&self) -> u64 {
        if self.games_played == 0 {
            return 0;
        }
        self.games_won.saturating_mul(10_000) / self.games_played
    }
}

/// Daily bonus bookkeeping
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyBonus {
    pub last_claim_ms: Option<u64>,
    pub streak: u32,
}

/// Result of a successful daily claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyClaim {
    pub amount: u64,
    pub streak: u32,
    pub multiplier_bps: u64,
    pub next_claim_ms: u64,
    pub balance: u64,
}

/// Ids of the open (pending or active) loans an account takes part in.
///
/// The loan records themselves live in the loan table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanRefs {
    pub borrowed: Vec<LoanId>,
    pub lent: Vec<LoanId>,
}

impl LoanRefs {
    /// Drop `id` from both lists.
    pub fn release(&mut self, id: LoanId) {
        self.borrowed.retain(|l| *l != id);
        self.lent.retain(|l| *l != id);
    }
}

/// Balance and statistics of a single user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: AccountId,
    pub balance: u64,
    pub stats: Stats,
    pub daily: DailyBonus,
    pub loans: LoanRefs,
    /// Wagers debited but not yet settled.
    pub open_wagers: Vec<OpenWager>,
    pub joined_at_ms: u64,
}

impl Account {
    pub fn new(id: AccountId, balance: u64, joined_at_ms: u64) -> Self {
        Self {
            id,
            balance,
            stats: Stats::default(),
            daily: DailyBonus::default(),
            loans: LoanRefs::default(),
            open_wagers: Vec::new(),
            joined_at_ms,
        }
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Apply a signed balance change and fold it into the win/loss statistics.
    ///
    /// A negative change the account cannot cover fails without touching the balance.
    pub fn adjust(&mut self, delta: i64) -> Result<u64, Failure> {
        let magnitude = delta.unsigned_abs();
        if delta < 0 {
            self.lose(magnitude)
        } else {
            self.win(magnitude)
        }
    }

    /// Credit `amount` as winnings.
    pub fn win(&mut self, amount: u64) -> Result<u64, Failure> {
        self.deposit(amount)?;
        self.stats.total_winnings = self.stats.total_winnings.saturating_add(amount);
        self.stats.biggest_win = self.stats.biggest_win.max(amount);
        Ok(self.balance)
    }

    /// Debit `amount` as a loss, failing if the balance cannot cover it.
    pub fn lose(&mut self, amount: u64) -> Result<u64, Failure> {
        self.withdraw(amount)?;
        self.stats.total_lost = self.stats.total_lost.saturating_add(amount);
        Ok(self.balance)
    }

    pub fn open_wager(&mut self, game: GameKind, bet: u64) {
        self.open_wagers.push(OpenWager { game, bet });
    }

    /// Remove one open wager matching `game` and `bet`. Returns whether one was found.
    pub fn close_wager(&mut self, game: GameKind, bet: u64) -> bool {
        let wager = OpenWager { game, bet };
        match self.open_wagers.iter().position(|open| *open == wager) {
            Some(index) => {
                self.open_wagers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add funds without counting them as winnings (transfers, loans, bonuses).
    pub fn deposit(&mut self, amount: u64) -> Result<u64, Failure> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| Failure::invalid("balance overflow"))?;
        Ok(self.balance)
    }

    /// Remove funds without counting them as losses.
    pub fn withdraw(&mut self, amount: u64) -> Result<u64, Failure> {
        if !self.can_afford(amount) {
            return Err(Failure::InsufficientFunds {
                payer: self.id.clone(),
                have: self.balance,
                need: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}
