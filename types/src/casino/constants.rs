/// Maximum account id length
pub const MAX_ACCOUNT_ID_LENGTH: usize = 64;

/// Starting balance for new accounts
pub const STARTING_BALANCE: u64 = 1_000;

/// Base daily bonus, before the streak multiplier
pub const DAILY_AMOUNT: u64 = 1_000;

/// Minimum time between two daily claims (24 hours)
pub const DAILY_COOLDOWN_MS: u64 = 24 * 60 * 60 * 1_000;

/// Daily streak tiers as (minimum streak, multiplier in basis points), highest first.
/// Streaks below the last tier pay 1x.
pub const DAILY_STREAK_TIERS: [(u32, u64); 4] =
    [(30, 30_000), (14, 25_000), (7, 20_000), (3, 15_000)];

/// Largest principal a single loan may carry
pub const MAX_LOAN_AMOUNT: u64 = 5_000;

/// Loan interest in basis points (10%)
pub const LOAN_INTEREST_BPS: u64 = 1_000;

/// Time a borrower has to repay before gambling is blocked (24 hours)
pub const LOAN_DURATION_MS: u64 = 24 * 60 * 60 * 1_000;

/// Open (pending or active) loans a borrower may hold at once
pub const MAX_OPEN_LOANS: usize = 3;

/// Basis point denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

// Pool base values (pools reset to these after a win).
pub const JACKPOT_BASE: u64 = 10_000;
pub const LOTTERY_BASE: u64 = 10_000;

/// Share of every wager skimmed into a pool, in basis points (10%)
pub const POOL_SKIM_BPS: u64 = 1_000;

/// Entries kept per leaderboard category
pub const LEADERBOARD_SIZE: usize = 10;

/// Error codes carried by failures
pub const ERROR_INVALID_REQUEST: u8 = 1;
pub const ERROR_NOT_FOUND: u8 = 2;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 3;
pub const ERROR_GAMBLING_BLOCKED: u8 = 4;
pub const ERROR_SESSION_EXISTS: u8 = 5;
pub const ERROR_SESSION_NOT_FOUND: u8 = 6;
pub const ERROR_SESSION_NOT_OWNED: u8 = 7;
pub const ERROR_LOAN_NOT_PENDING: u8 = 8;
pub const ERROR_RATE_LIMITED: u8 = 10;
