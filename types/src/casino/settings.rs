use serde::{Deserialize, Serialize};

use super::{
    apply_bps, BPS_DENOMINATOR, DAILY_AMOUNT, DAILY_COOLDOWN_MS, DAILY_STREAK_TIERS,
    LEADERBOARD_SIZE, LOAN_DURATION_MS, LOAN_INTEREST_BPS, MAX_LOAN_AMOUNT, MAX_OPEN_LOANS,
    STARTING_BALANCE,
};

/// Economy rules, persisted alongside the ledger so operators can tune them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub starting_balance: u64,
    pub daily_amount: u64,
    pub daily_cooldown_ms: u64,
    pub max_loan_amount: u64,
    pub loan_interest_bps: u64,
    pub loan_duration_ms: u64,
    pub max_open_loans: usize,
    pub leaderboard_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_balance: STARTING_BALANCE,
            daily_amount: DAILY_AMOUNT,
            daily_cooldown_ms: DAILY_COOLDOWN_MS,
            max_loan_amount: MAX_LOAN_AMOUNT,
            loan_interest_bps: LOAN_INTEREST_BPS,
            loan_duration_ms: LOAN_DURATION_MS,
            max_open_loans: MAX_OPEN_LOANS,
            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

impl Settings {
    /// Daily multiplier (basis points) earned by a streak of `streak` days.
    pub fn daily_multiplier_bps(streak: u32) -> u64 {
        DAILY_STREAK_TIERS
            .iter()
            .find(|(min, _)| streak >= *min)
            .map(|(_, bps)| *bps)
            .unwrap_or(BPS_DENOMINATOR)
    }

    pub fn daily_payout(&self, streak: u32) -> u64 {
        apply_bps(self.daily_amount, Self::daily_multiplier_bps(streak))
    }

    pub fn interest(&self, principal: u64) -> u64 {
        apply_bps(principal, self.loan_interest_bps)
    }
}
