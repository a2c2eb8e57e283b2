use croupier_types::{
    casino::{Account, Loan, MAX_ACCOUNT_ID_LENGTH},
    Failure, Instruction, Key, Output, Value,
};
use std::collections::BTreeMap;

use crate::state::{State, Status};

mod handlers;

/// Staged view over a [State].
///
/// Reads fall through to the underlying state; writes are held in `pending`
/// until [Layer::commit]. Dropping a layer discards everything it staged, which
/// is how a rejected instruction leaves the ledger untouched.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    now_ms: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, now_ms: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            now_ms,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub async fn execute(&mut self, instruction: &Instruction) -> Result<Output, Failure> {
        match instruction {
            // Accounts
            Instruction::Account { id } => self.handle_account(id).await,
            Instruction::Credit { id, amount } => self.handle_credit(id, *amount).await,
            Instruction::Debit { id, amount } => self.handle_debit(id, *amount).await,
            Instruction::CanAfford { id, amount } => self.handle_can_afford(id, *amount).await,
            Instruction::Transfer { from, to, amount } => {
                self.handle_transfer(from, to, *amount).await
            }
            Instruction::ClaimDaily { id } => self.handle_claim_daily(id).await,

            // Loans
            Instruction::IssueLoan {
                lender,
                borrower,
                principal,
            } => self.handle_issue_loan(lender, borrower, *principal).await,
            Instruction::RequestLoan {
                borrower,
                lender,
                principal,
            } => self.handle_request_loan(borrower, lender, *principal).await,
            Instruction::AcceptLoan { lender, loan } => {
                self.handle_accept_loan(lender, *loan).await
            }
            Instruction::DeclineLoan { lender, loan } => {
                self.handle_decline_loan(lender, *loan).await
            }
            Instruction::RepayLoan { borrower, loan } => {
                self.handle_repay_loan(borrower, *loan).await
            }
            Instruction::Loans { id } => self.handle_loans(id).await,
            Instruction::LoanHistory { id } => self.handle_loan_history(id).await,
            Instruction::IsBlocked { id } => self.handle_is_blocked(id).await,

            // Pools
            Instruction::Contribute { pool, wager } => {
                self.handle_contribute(*pool, *wager).await
            }
            Instruction::Award { pool, id } => self.handle_award(*pool, id).await,
            Instruction::Peek { pool } => self.handle_peek(*pool).await,

            // Leaderboard
            Instruction::RefreshLeaderboard => self.handle_refresh_leaderboard().await,
            Instruction::Leaderboard => self.handle_leaderboard().await,
            Instruction::Rank { id, category } => self.handle_rank(id, *category).await,

            // Games
            Instruction::Wager {
                id,
                game,
                bet,
                pools,
            } => self
                .handle_wager(id, *game, *bet, pools)
                .await
                .map(Output::Wagered),
            Instruction::Settle {
                id,
                game,
                bet,
                payout,
                jackpot,
            } => self
                .handle_settle(id, *game, *bet, *payout, *jackpot)
                .await
                .map(Output::Settled),
        }
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

pub(crate) fn validate_id(id: &str) -> Result<(), Failure> {
    if id.is_empty() {
        return Err(Failure::invalid("account id must not be empty"));
    }
    if id.len() > MAX_ACCOUNT_ID_LENGTH {
        return Err(Failure::invalid(format!(
            "account id longer than {MAX_ACCOUNT_ID_LENGTH} bytes"
        )));
    }
    Ok(())
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }

    async fn accounts(&self) -> Vec<Account> {
        let mut accounts: BTreeMap<String, Account> = self
            .state
            .accounts()
            .await
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        for (key, status) in &self.pending {
            let Key::Account(id) = key else {
                continue;
            };
            match status {
                Status::Update(Value::Account(account)) => {
                    accounts.insert(id.clone(), account.clone());
                }
                Status::Update(_) => {}
                Status::Delete => {
                    accounts.remove(id);
                }
            }
        }
        accounts.into_values().collect()
    }

    async fn loans(&self) -> Vec<Loan> {
        let mut loans: BTreeMap<_, Loan> = self
            .state
            .loans()
            .await
            .into_iter()
            .map(|l| (l.id, l))
            .collect();
        for (key, status) in &self.pending {
            let Key::Loan(id) = key else {
                continue;
            };
            match status {
                Status::Update(Value::Loan(loan)) => {
                    loans.insert(*id, loan.clone());
                }
                Status::Update(_) => {}
                Status::Delete => {
                    loans.remove(id);
                }
            }
        }
        loans.into_values().collect()
    }
}
