use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AccountId, BPS_DENOMINATOR};

/// Loan identifier, derived from the issue time in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub u64);

impl LoanId {
    /// Next id after `last`: the current time, bumped past `last` if the clock
    /// has not advanced since the previous loan.
    pub fn next(last: LoanId, now_ms: u64) -> Self {
        Self(now_ms.max(last.0.saturating_add(1)))
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Requested by the borrower, waiting for the lender.
    Pending,
    /// Funds transferred, waiting for repayment.
    Active,
    Paid,
    Declined,
}

impl LoanStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

/// A peer-to-peer loan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub lender: AccountId,
    pub borrower: AccountId,
    pub principal: u64,
    pub interest: u64,
    pub total_owed: u64,
    pub created_at_ms: u64,
    pub due_at_ms: u64,
    pub status: LoanStatus,
    #[serde(default)]
    pub accepted_at_ms: Option<u64>,
    #[serde(default)]
    pub closed_at_ms: Option<u64>,
}

impl Loan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LoanId,
        lender: AccountId,
        borrower: AccountId,
        principal: u64,
        interest_bps: u64,
        duration_ms: u64,
        now_ms: u64,
        status: LoanStatus,
    ) -> Self {
        let interest = apply_bps(principal, interest_bps);
        Self {
            id,
            lender,
            borrower,
            principal,
            interest,
            total_owed: principal.saturating_add(interest),
            created_at_ms: now_ms,
            due_at_ms: now_ms.saturating_add(duration_ms),
            status,
            accepted_at_ms: (status == LoanStatus::Active).then_some(now_ms),
            closed_at_ms: None,
        }
    }

    /// Active and past its due time.
    pub fn is_overdue(&self, now_ms: u64) -> bool {
        self.status == LoanStatus::Active && now_ms > self.due_at_ms
    }

    /// Move a pending loan to active; the repayment clock starts now.
    pub fn activate(&mut self, now_ms: u64, duration_ms: u64) {
        self.status = LoanStatus::Active;
        self.accepted_at_ms = Some(now_ms);
        self.due_at_ms = now_ms.saturating_add(duration_ms);
    }

    pub fn close(&mut self, status: LoanStatus, now_ms: u64) {
        self.status = status;
        self.closed_at_ms = Some(now_ms);
    }
}

/// `floor(amount * bps / 10_000)`
pub fn apply_bps(amount: u64, bps: u64) -> u64 {
    let scaled = amount as u128 * bps as u128 / BPS_DENOMINATOR as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Open loans of one account, as seen at a point in time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub borrowed: Vec<Loan>,
    pub lent: Vec<Loan>,
    pub overdue: Vec<Loan>,
}

impl LoanSummary {
    pub fn total_borrowed(&self) -> u64 {
        self.borrowed.iter().map(|l| l.total_owed).sum()
    }

    pub fn is_blocked(&self) -> bool {
        !self.overdue.is_empty()
    }
}
