use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::{Account, AccountId};

/// Ranking key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Richest,
    BiggestWins,
    MostPlayed,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Richest, Category::BiggestWins, Category::MostPlayed];

    pub fn value_of(self, account: &Account) -> u64 {
        match self {
            Self::Richest => account.balance,
            Self::BiggestWins => account.stats.biggest_win,
            Self::MostPlayed => account.stats.games_played,
        }
    }
}

/// Leaderboard entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub account: AccountId,
    pub value: u64,
}

/// Cached top-N rankings. Not authoritative: always recomputable from accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leaderboard {
    pub richest: Vec<LeaderboardEntry>,
    pub biggest_wins: Vec<LeaderboardEntry>,
    pub most_played: Vec<LeaderboardEntry>,
    pub refreshed_at_ms: u64,
}

impl Leaderboard {
    /// Rank `accounts` in every category, keeping the top `limit` of each.
    pub fn rebuild<'a>(
        accounts: impl IntoIterator<Item = &'a Account>,
        limit: usize,
        now_ms: u64,
    ) -> Self {
        let accounts: Vec<&Account> = accounts.into_iter().collect();
        Self {
            richest: ranked(&accounts, Category::Richest, limit),
            biggest_wins: ranked(&accounts, Category::BiggestWins, limit),
            most_played: ranked(&accounts, Category::MostPlayed, limit),
            refreshed_at_ms: now_ms,
        }
    }

    pub fn entries(&self, category: Category) -> &[LeaderboardEntry] {
        match category {
            Category::Richest => &self.richest,
            Category::BiggestWins => &self.biggest_wins,
            Category::MostPlayed => &self.most_played,
        }
    }

    /// 0-based position of `account` in the cached window, `None` if unranked.
    pub fn rank(&self, account: &str, category: Category) -> Option<usize> {
        self.entries(category)
            .iter()
            .position(|e| e.account == account)
    }
}

// Descending by value; ties go to the lower account id so refreshes are stable.
fn ranked(accounts: &[&Account], category: Category, limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = accounts
        .iter()
        .map(|a| LeaderboardEntry {
            account: a.id.clone(),
            value: category.value_of(a),
        })
        .collect();
    entries.sort_by(|a, b| {
        (Reverse(a.value), &a.account).cmp(&(Reverse(b.value), &b.account))
    });
    entries.truncate(limit);
    entries
}
