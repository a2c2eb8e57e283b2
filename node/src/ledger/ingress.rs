use commonware_macros::select;
use commonware_runtime::signal::Signal;
use croupier_execution::{
    casino::{CoinFlip, Policy, Side},
    sessions::Session,
};
use croupier_types::{
    casino::{
        Account, Category, DailyClaim, GameKind, Leaderboard, Loan, LoanId, LoanSummary,
        PoolAward, PoolKind, Settlement, WagerReceipt,
    },
    Failure, Instruction, Output,
};
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use thiserror::Error;

use super::SessionState;

type Response<T> = oneshot::Sender<Result<T, MailboxError>>;

pub enum Message {
    Execute {
        instruction: Instruction,
        response: Response<Output>,
    },
    Play {
        id: String,
        bet: u64,
        policy: Box<dyn Policy>,
        response: Response<Settlement>,
    },
    StartSession {
        owner: String,
        game: GameKind,
        payload: SessionState,
        response: Response<Session<SessionState>>,
    },
    Session {
        owner: String,
        actor: String,
        response: Response<Session<SessionState>>,
    },
    UpdateSession {
        owner: String,
        actor: String,
        payload: SessionState,
        response: Response<Session<SessionState>>,
    },
    EndSession {
        owner: String,
        actor: String,
        response: Response<Session<SessionState>>,
    },
}

#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
    stopped: Signal,
}

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("ledger mailbox closed")]
    Closed,
    #[error("ledger request canceled")]
    Canceled,
    #[error("shutdown in progress")]
    ShuttingDown,
    #[error("rejected: {0}")]
    Rejected(#[from] Failure),
    #[error("failed to persist ledger: {0}")]
    Storage(String),
    #[error("unexpected output: {0}")]
    Unexpected(String),
}

impl MailboxError {
    /// The business failure behind a rejection, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

fn unexpected<T>(output: Output) -> Result<T, MailboxError> {
    Err(MailboxError::Unexpected(format!("{output:?}")))
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>, stopped: Signal) -> Self {
        Self { sender, stopped }
    }

    async fn request<T>(
        &mut self,
        message: impl FnOnce(Response<T>) -> Message,
    ) -> Result<T, MailboxError> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut mailbox_sender = self.sender.clone();
            let mut stopped = self.stopped.clone();
            select! {
                result = mailbox_sender.send(message(sender)) => {
                    result.map_err(|_| MailboxError::Closed)?;
                },
                _ = &mut stopped => {
                    return Err(MailboxError::ShuttingDown);
                },
            }
        }

        let mut stopped = self.stopped.clone();
        select! {
            result = receiver => {
                result.map_err(|_| MailboxError::Canceled)?
            },
            _ = &mut stopped => {
                Err(MailboxError::ShuttingDown)
            },
        }
    }

    /// Execute one instruction atomically.
    pub async fn execute(&mut self, instruction: Instruction) -> Result<Output, MailboxError> {
        self.request(|response| Message::Execute {
            instruction,
            response,
        })
        .await
    }

    // === Accounts ===

    /// Account of `id`, opened with the starting balance on first use.
    pub async fn account(&mut self, id: &str) -> Result<Account, MailboxError> {
        match self.execute(Instruction::Account { id: id.to_string() }).await? {
            Output::Account(account) => Ok(account),
            other => unexpected(other),
        }
    }

    /// Add game winnings to `id`.
    pub async fn credit(&mut self, id: &str, amount: u64) -> Result<Account, MailboxError> {
        let instruction = Instruction::Credit {
            id: id.to_string(),
            amount,
        };
        match self.execute(instruction).await? {
            Output::Account(account) => Ok(account),
            other => unexpected(other),
        }
    }

    /// Take a game loss from `id`. Fails rather than overdraw.
    pub async fn debit(&mut self, id: &str, amount: u64) -> Result<Account, MailboxError> {
        let instruction = Instruction::Debit {
            id: id.to_string(),
            amount,
        };
        match self.execute(instruction).await? {
            Output::Account(account) => Ok(account),
            other => unexpected(other),
        }
    }

    pub async fn can_afford(&mut self, id: &str, amount: u64) -> Result<bool, MailboxError> {
        let instruction = Instruction::CanAfford {
            id: id.to_string(),
            amount,
        };
        match self.execute(instruction).await? {
            Output::Affordable(affordable) => Ok(affordable),
            other => unexpected(other),
        }
    }

    pub async fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(Account, Account), MailboxError> {
        let instruction = Instruction::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        };
        match self.execute(instruction).await? {
            Output::Transferred { from, to } => Ok((from, to)),
            other => unexpected(other),
        }
    }

    pub async fn claim_daily(&mut self, id: &str) -> Result<DailyClaim, MailboxError> {
        match self
            .execute(Instruction::ClaimDaily { id: id.to_string() })
            .await?
        {
            Output::Daily(claim) => Ok(claim),
            other => unexpected(other),
        }
    }

    // === Loans ===

    async fn loan(&mut self, instruction: Instruction) -> Result<Loan, MailboxError> {
        match self.execute(instruction).await? {
            Output::Loan(loan) => Ok(loan),
            other => unexpected(other),
        }
    }

    /// Lend `principal` to `borrower` immediately.
    pub async fn issue_loan(
        &mut self,
        lender: &str,
        borrower: &str,
        principal: u64,
    ) -> Result<Loan, MailboxError> {
        self.loan(Instruction::IssueLoan {
            lender: lender.to_string(),
            borrower: borrower.to_string(),
            principal,
        })
        .await
    }

    /// Ask `lender` for `principal`; nothing moves until they accept.
    pub async fn request_loan(
        &mut self,
        borrower: &str,
        lender: &str,
        principal: u64,
    ) -> Result<Loan, MailboxError> {
        self.loan(Instruction::RequestLoan {
            borrower: borrower.to_string(),
            lender: lender.to_string(),
            principal,
        })
        .await
    }

    pub async fn accept_loan(&mut self, lender: &str, loan: LoanId) -> Result<Loan, MailboxError> {
        self.loan(Instruction::AcceptLoan {
            lender: lender.to_string(),
            loan,
        })
        .await
    }

    pub async fn decline_loan(&mut self, lender: &str, loan: LoanId) -> Result<Loan, MailboxError> {
        self.loan(Instruction::DeclineLoan {
            lender: lender.to_string(),
            loan,
        })
        .await
    }

    pub async fn repay_loan(&mut self, borrower: &str, loan: LoanId) -> Result<Loan, MailboxError> {
        self.loan(Instruction::RepayLoan {
            borrower: borrower.to_string(),
            loan,
        })
        .await
    }

    /// Open loans of `id`, both sides.
    pub async fn loans(&mut self, id: &str) -> Result<LoanSummary, MailboxError> {
        match self.execute(Instruction::Loans { id: id.to_string() }).await? {
            Output::Loans(summary) => Ok(summary),
            other => unexpected(other),
        }
    }

    /// Every loan `id` took part in, newest first.
    pub async fn loan_history(&mut self, id: &str) -> Result<Vec<Loan>, MailboxError> {
        match self
            .execute(Instruction::LoanHistory { id: id.to_string() })
            .await?
        {
            Output::LoanHistory(history) => Ok(history),
            other => unexpected(other),
        }
    }

    pub async fn is_blocked(&mut self, id: &str) -> Result<bool, MailboxError> {
        match self
            .execute(Instruction::IsBlocked { id: id.to_string() })
            .await?
        {
            Output::Blocked(blocked) => Ok(blocked),
            other => unexpected(other),
        }
    }

    // === Pools ===

    /// Skim `wager` into `pool`, returning the contribution and the new total.
    pub async fn contribute(
        &mut self,
        pool: PoolKind,
        wager: u64,
    ) -> Result<(u64, u64), MailboxError> {
        match self.execute(Instruction::Contribute { pool, wager }).await? {
            Output::Contributed { amount, total, .. } => Ok((amount, total)),
            other => unexpected(other),
        }
    }

    pub async fn award(&mut self, pool: PoolKind, id: &str) -> Result<PoolAward, MailboxError> {
        let instruction = Instruction::Award {
            pool,
            id: id.to_string(),
        };
        match self.execute(instruction).await? {
            Output::Awarded(award) => Ok(award),
            other => unexpected(other),
        }
    }

    pub async fn peek(&mut self, pool: PoolKind) -> Result<u64, MailboxError> {
        match self.execute(Instruction::Peek { pool }).await? {
            Output::Pool(amount) => Ok(amount),
            other => unexpected(other),
        }
    }

    // === Leaderboard ===

    pub async fn refresh_leaderboard(&mut self) -> Result<Leaderboard, MailboxError> {
        match self.execute(Instruction::RefreshLeaderboard).await? {
            Output::Leaderboard(leaderboard) => Ok(leaderboard),
            other => unexpected(other),
        }
    }

    /// Cached leaderboard as of the last refresh.
    pub async fn leaderboard(&mut self) -> Result<Leaderboard, MailboxError> {
        match self.execute(Instruction::Leaderboard).await? {
            Output::Leaderboard(leaderboard) => Ok(leaderboard),
            other => unexpected(other),
        }
    }

    pub async fn rank_of(
        &mut self,
        id: &str,
        category: Category,
    ) -> Result<Option<usize>, MailboxError> {
        let instruction = Instruction::Rank {
            id: id.to_string(),
            category,
        };
        match self.execute(instruction).await? {
            Output::Rank(rank) => Ok(rank),
            other => unexpected(other),
        }
    }

    // === Games ===

    /// Gate, debit and skim a bet for a game resolved outside the ledger.
    pub async fn wager(
        &mut self,
        id: &str,
        game: GameKind,
        bet: u64,
        pools: Vec<PoolKind>,
    ) -> Result<WagerReceipt, MailboxError> {
        let instruction = Instruction::Wager {
            id: id.to_string(),
            game,
            bet,
            pools,
        };
        match self.execute(instruction).await? {
            Output::Wagered(receipt) => Ok(receipt),
            other => unexpected(other),
        }
    }

    /// Credit the outcome of a wager placed through [Mailbox::wager].
    pub async fn settle(
        &mut self,
        id: &str,
        game: GameKind,
        bet: u64,
        payout: u64,
        jackpot: Option<PoolKind>,
    ) -> Result<Settlement, MailboxError> {
        let instruction = Instruction::Settle {
            id: id.to_string(),
            game,
            bet,
            payout,
            jackpot,
        };
        match self.execute(instruction).await? {
            Output::Settled(settlement) => Ok(settlement),
            other => unexpected(other),
        }
    }

    /// Play one single-shot game under `policy`.
    pub async fn play(
        &mut self,
        id: &str,
        bet: u64,
        policy: impl Policy + 'static,
    ) -> Result<Settlement, MailboxError> {
        self.request(|response| Message::Play {
            id: id.to_string(),
            bet,
            policy: Box::new(policy),
            response,
        })
        .await
    }

    pub async fn play_coinflip(
        &mut self,
        id: &str,
        bet: u64,
        call: Side,
    ) -> Result<Settlement, MailboxError> {
        self.play(id, bet, CoinFlip::new(call)).await
    }

    // === Sessions ===

    pub async fn start_session(
        &mut self,
        owner: &str,
        game: GameKind,
        payload: SessionState,
    ) -> Result<Session<SessionState>, MailboxError> {
        self.request(|response| Message::StartSession {
            owner: owner.to_string(),
            game,
            payload,
            response,
        })
        .await
    }

    /// `owner`'s session as seen by `actor`.
    pub async fn session(
        &mut self,
        owner: &str,
        actor: &str,
    ) -> Result<Session<SessionState>, MailboxError> {
        self.request(|response| Message::Session {
            owner: owner.to_string(),
            actor: actor.to_string(),
            response,
        })
        .await
    }

    pub async fn update_session(
        &mut self,
        owner: &str,
        actor: &str,
        payload: SessionState,
    ) -> Result<Session<SessionState>, MailboxError> {
        self.request(|response| Message::UpdateSession {
            owner: owner.to_string(),
            actor: actor.to_string(),
            payload,
            response,
        })
        .await
    }

    pub async fn end_session(
        &mut self,
        owner: &str,
        actor: &str,
    ) -> Result<Session<SessionState>, MailboxError> {
        self.request(|response| Message::EndSession {
            owner: owner.to_string(),
            actor: actor.to_string(),
            response,
        })
        .await
    }
}
