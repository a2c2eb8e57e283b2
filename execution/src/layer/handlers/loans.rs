use super::super::*;
use crate::state::load_settings;
use croupier_types::casino::{LoanId, LoanStatus, LoanSummary, Settings};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    async fn load_loan(&self, id: LoanId) -> Option<Loan> {
        match self.get(&Key::Loan(id)).await {
            Some(Value::Loan(loan)) => Some(loan),
            _ => None,
        }
    }

    fn store_loan(&mut self, loan: Loan) {
        self.insert(Key::Loan(loan.id), Value::Loan(loan));
    }

    async fn next_loan_id(&mut self) -> LoanId {
        let last = match self.get(&Key::LastLoanId).await {
            Some(Value::LastLoanId(id)) => id,
            _ => LoanId::default(),
        };
        let id = LoanId::next(last, self.now_ms);
        self.insert(Key::LastLoanId, Value::LastLoanId(id));
        id
    }

    async fn resolve_loans(&self, ids: &[LoanId]) -> Vec<Loan> {
        let mut loans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(loan) = self.load_loan(*id).await {
                loans.push(loan);
            }
        }
        loans
    }

    /// Active loans `account` has borrowed and not repaid in time.
    pub(in crate::layer) async fn overdue_loans(&self, account: &Account) -> Vec<Loan> {
        self.resolve_loans(&account.loans.borrowed)
            .await
            .into_iter()
            .filter(|loan| loan.is_overdue(self.now_ms))
            .collect()
    }

    /// Fail with [Failure::Blocked] if `account` has any overdue loan.
    pub(in crate::layer) async fn ensure_not_blocked(
        &self,
        account: &Account,
    ) -> Result<(), Failure> {
        let overdue = self.overdue_loans(account).await.len();
        if overdue > 0 {
            return Err(Failure::Blocked { overdue });
        }
        Ok(())
    }

    fn check_terms(
        settings: &Settings,
        lender: &str,
        borrower: &str,
        principal: u64,
    ) -> Result<(), Failure> {
        if principal == 0 {
            return Err(Failure::invalid("loan amount must be positive"));
        }
        if principal > settings.max_loan_amount {
            return Err(Failure::invalid(format!(
                "loan amount exceeds maximum of {}",
                settings.max_loan_amount
            )));
        }
        if lender == borrower {
            return Err(Failure::invalid("cannot lend to yourself"));
        }
        Ok(())
    }

    async fn check_borrower(&self, settings: &Settings, borrower: &Account) -> Result<(), Failure> {
        self.ensure_not_blocked(borrower).await?;
        if borrower.loans.borrowed.len() >= settings.max_open_loans {
            return Err(Failure::invalid(format!(
                "{} already has {} open loans",
                borrower.id,
                borrower.loans.borrowed.len()
            )));
        }
        Ok(())
    }

    /// Lender-initiated loan: funds move immediately and the loan starts active.
    pub(in crate::layer) async fn handle_issue_loan(
        &mut self,
        lender: &str,
        borrower: &str,
        principal: u64,
    ) -> Result<Output, Failure> {
        let settings = load_settings(self).await;
        Self::check_terms(&settings, lender, borrower, principal)?;
        let mut lender_account = self.load_or_open(lender).await?;
        let mut borrower_account = self.load_or_open(borrower).await?;
        self.check_borrower(&settings, &borrower_account).await?;

        lender_account.withdraw(principal)?;
        borrower_account.deposit(principal)?;

        let id = self.next_loan_id().await;
        let loan = Loan::new(
            id,
            lender.to_string(),
            borrower.to_string(),
            principal,
            settings.loan_interest_bps,
            settings.loan_duration_ms,
            self.now_ms,
            LoanStatus::Active,
        );
        lender_account.loans.lent.push(id);
        borrower_account.loans.borrowed.push(id);
        self.store_account(lender_account);
        self.store_account(borrower_account);
        self.store_loan(loan.clone());
        info!(%id, lender, borrower, principal, "loan issued");

        Ok(Output::Loan(loan))
    }

    /// Borrower-initiated loan: recorded as pending until the lender responds.
    pub(in crate::layer) async fn handle_request_loan(
        &mut self,
        borrower: &str,
        lender: &str,
        principal: u64,
    ) -> Result<Output, Failure> {
        let settings = load_settings(self).await;
        Self::check_terms(&settings, lender, borrower, principal)?;
        let mut lender_account = self.load_or_open(lender).await?;
        let mut borrower_account = self.load_or_open(borrower).await?;
        self.check_borrower(&settings, &borrower_account).await?;

        let id = self.next_loan_id().await;
        let loan = Loan::new(
            id,
            lender.to_string(),
            borrower.to_string(),
            principal,
            settings.loan_interest_bps,
            settings.loan_duration_ms,
            self.now_ms,
            LoanStatus::Pending,
        );
        lender_account.loans.lent.push(id);
        borrower_account.loans.borrowed.push(id);
        self.store_account(lender_account);
        self.store_account(borrower_account);
        self.store_loan(loan.clone());
        info!(%id, lender, borrower, principal, "loan requested");

        Ok(Output::Loan(loan))
    }

    /// Pending loan addressed to `lender`.
    async fn pending_for(&self, lender: &str, id: LoanId) -> Result<Loan, Failure> {
        let loan = self
            .load_loan(id)
            .await
            .ok_or_else(|| Failure::NotFound(format!("loan {id}")))?;
        if loan.lender != lender {
            return Err(Failure::invalid("only the lender can answer a loan request"));
        }
        if loan.status != LoanStatus::Pending {
            return Err(Failure::NotPending(id));
        }
        Ok(loan)
    }

    pub(in crate::layer) async fn handle_accept_loan(
        &mut self,
        lender: &str,
        id: LoanId,
    ) -> Result<Output, Failure> {
        let settings = load_settings(self).await;
        let mut loan = self.pending_for(lender, id).await?;
        let mut lender_account = self.load_or_open(&loan.lender).await?;
        let mut borrower_account = self.load_or_open(&loan.borrower).await?;

        // Conditions may have changed since the request
        self.ensure_not_blocked(&borrower_account).await?;
        lender_account.withdraw(loan.principal)?;
        borrower_account.deposit(loan.principal)?;

        loan.activate(self.now_ms, settings.loan_duration_ms);
        self.store_account(lender_account);
        self.store_account(borrower_account);
        self.store_loan(loan.clone());
        info!(%id, lender, "loan accepted");

        Ok(Output::Loan(loan))
    }

    pub(in crate::layer) async fn handle_decline_loan(
        &mut self,
        lender: &str,
        id: LoanId,
    ) -> Result<Output, Failure> {
        let mut loan = self.pending_for(lender, id).await?;
        let mut lender_account = self.load_or_open(&loan.lender).await?;
        let mut borrower_account = self.load_or_open(&loan.borrower).await?;

        loan.close(LoanStatus::Declined, self.now_ms);
        lender_account.loans.release(id);
        borrower_account.loans.release(id);
        self.store_account(lender_account);
        self.store_account(borrower_account);
        self.store_loan(loan.clone());
        info!(%id, lender, "loan declined");

        Ok(Output::Loan(loan))
    }

    pub(in crate::layer) async fn handle_repay_loan(
        &mut self,
        borrower: &str,
        id: LoanId,
    ) -> Result<Output, Failure> {
        let mut borrower_account = self.load_or_open(borrower).await?;
        let not_found = || Failure::NotFound(format!("active loan {id} for {borrower}"));
        if !borrower_account.loans.borrowed.contains(&id) {
            return Err(not_found());
        }
        let mut loan = self
            .load_loan(id)
            .await
            .filter(|loan| loan.status == LoanStatus::Active)
            .ok_or_else(not_found)?;
        let mut lender_account = self.load_or_open(&loan.lender).await?;

        borrower_account.withdraw(loan.total_owed)?;
        lender_account.deposit(loan.total_owed)?;

        loan.close(LoanStatus::Paid, self.now_ms);
        borrower_account.loans.release(id);
        lender_account.loans.release(id);
        self.store_account(borrower_account);
        self.store_account(lender_account);
        self.store_loan(loan.clone());
        info!(%id, borrower, total = loan.total_owed, "loan repaid");

        Ok(Output::Loan(loan))
    }

    pub(in crate::layer) async fn handle_loans(&self, id: &str) -> Result<Output, Failure> {
        let account = self.load_or_open(id).await?;
        let borrowed = self.resolve_loans(&account.loans.borrowed).await;
        let lent = self.resolve_loans(&account.loans.lent).await;
        let overdue = borrowed
            .iter()
            .filter(|loan| loan.is_overdue(self.now_ms))
            .cloned()
            .collect();
        Ok(Output::Loans(LoanSummary {
            borrowed,
            lent,
            overdue,
        }))
    }

    /// Every loan `id` took part in, newest first.
    pub(in crate::layer) async fn handle_loan_history(&self, id: &str) -> Result<Output, Failure> {
        validate_id(id)?;
        let mut history: Vec<Loan> = self
            .loans()
            .await
            .into_iter()
            .filter(|loan| loan.lender == id || loan.borrower == id)
            .collect();
        history.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(Output::LoanHistory(history))
    }

    pub(in crate::layer) async fn handle_is_blocked(&self, id: &str) -> Result<Output, Failure> {
        let account = self.load_or_open(id).await?;
        let overdue = self.overdue_loans(&account).await;
        Ok(Output::Blocked(!overdue.is_empty()))
    }
}
