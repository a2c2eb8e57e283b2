use thiserror::Error;

use crate::casino::{
    Account, AccountId, CasinoStats, Category, DailyClaim, GameKind, Leaderboard, Loan, LoanId,
    LoanSummary, Pool, PoolAward, PoolKind, Settings, Settlement, WagerReceipt,
    ERROR_GAMBLING_BLOCKED, ERROR_INSUFFICIENT_FUNDS, ERROR_INVALID_REQUEST,
    ERROR_LOAN_NOT_PENDING, ERROR_NOT_FOUND, ERROR_RATE_LIMITED, ERROR_SESSION_EXISTS,
    ERROR_SESSION_NOT_FOUND, ERROR_SESSION_NOT_OWNED,
};

/// A request against the ledger. Each instruction executes atomically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    // Accounts
    Account { id: AccountId },
    Credit { id: AccountId, amount: u64 },
    Debit { id: AccountId, amount: u64 },
    CanAfford { id: AccountId, amount: u64 },
    Transfer { from: AccountId, to: AccountId, amount: u64 },
    ClaimDaily { id: AccountId },

    // Loans
    /// Lender offers funds; the transfer happens immediately.
    IssueLoan {
        lender: AccountId,
        borrower: AccountId,
        principal: u64,
    },
    /// Borrower asks for funds; nothing moves until the lender accepts.
    RequestLoan {
        borrower: AccountId,
        lender: AccountId,
        principal: u64,
    },
    AcceptLoan { lender: AccountId, loan: LoanId },
    DeclineLoan { lender: AccountId, loan: LoanId },
    RepayLoan { borrower: AccountId, loan: LoanId },
    Loans { id: AccountId },
    LoanHistory { id: AccountId },
    IsBlocked { id: AccountId },

    // Pools
    Contribute { pool: PoolKind, wager: u64 },
    Award { pool: PoolKind, id: AccountId },
    Peek { pool: PoolKind },

    // Leaderboard
    RefreshLeaderboard,
    Leaderboard,
    Rank { id: AccountId, category: Category },

    // Games
    /// Gate, debit and skim a wager.
    Wager {
        id: AccountId,
        game: GameKind,
        bet: u64,
        pools: Vec<PoolKind>,
    },
    /// Credit the outcome of a previously placed wager.
    Settle {
        id: AccountId,
        game: GameKind,
        bet: u64,
        payout: u64,
        jackpot: Option<PoolKind>,
    },
}

impl Instruction {
    /// Whether executing the instruction can change stored state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Self::CanAfford { .. }
                | Self::Loans { .. }
                | Self::LoanHistory { .. }
                | Self::IsBlocked { .. }
                | Self::Peek { .. }
                | Self::Leaderboard
                | Self::Rank { .. }
        )
    }
}

/// Result of a successful instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Account(Account),
    Affordable(bool),
    Transferred { from: Account, to: Account },
    Daily(DailyClaim),
    Loan(Loan),
    Loans(LoanSummary),
    LoanHistory(Vec<Loan>),
    Blocked(bool),
    Contributed { pool: PoolKind, amount: u64, total: u64 },
    Awarded(PoolAward),
    Pool(u64),
    Leaderboard(Leaderboard),
    Rank(Option<usize>),
    Wagered(WagerReceipt),
    Settled(Settlement),
}

/// Expected business failures. Rejected instructions leave state untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{payer} cannot afford {need} (balance {have})")]
    InsufficientFunds {
        payer: AccountId,
        have: u64,
        need: u64,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("gambling blocked by {overdue} overdue loan(s)")]
    Blocked { overdue: usize },
    #[error("daily bonus available again in {remaining_ms}ms")]
    Cooldown { remaining_ms: u64 },
    #[error("loan {0} is not pending")]
    NotPending(LoanId),
    #[error("a session is already in progress")]
    SessionExists,
    #[error("no session in progress")]
    SessionNotFound,
    #[error("session belongs to another account")]
    SessionNotOwned,
}

impl Failure {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Stable numeric code for callers that render failures.
    pub fn code(&self) -> u8 {
        match self {
            Self::Validation(_) => ERROR_INVALID_REQUEST,
            Self::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
            Self::NotFound(_) => ERROR_NOT_FOUND,
            Self::Blocked { .. } => ERROR_GAMBLING_BLOCKED,
            Self::Cooldown { .. } => ERROR_RATE_LIMITED,
            Self::NotPending(_) => ERROR_LOAN_NOT_PENDING,
            Self::SessionExists => ERROR_SESSION_EXISTS,
            Self::SessionNotFound => ERROR_SESSION_NOT_FOUND,
            Self::SessionNotOwned => ERROR_SESSION_NOT_OWNED,
        }
    }
}

/// Addressable state in the ledger
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Account(AccountId),
    Loan(LoanId),
    LastLoanId,
    Pool(PoolKind),
    CasinoStats,
    Leaderboard,
    Settings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Account(Account),
    Loan(Loan),
    LastLoanId(LoanId),
    Pool(Pool),
    CasinoStats(CasinoStats),
    Leaderboard(Leaderboard),
    Settings(Settings),
}
