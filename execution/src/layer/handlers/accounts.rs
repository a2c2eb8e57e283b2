use super::super::*;
use crate::state::{load_account, load_settings};
use croupier_types::casino::{DailyBonus, DailyClaim, Settings};
use tracing::debug;

impl<'a, S: State> Layer<'a, S> {
    /// Stored account for `id`, or a freshly opened one (not yet staged).
    pub(in crate::layer) async fn load_or_open(&self, id: &str) -> Result<Account, Failure> {
        validate_id(id)?;
        if let Some(account) = load_account(self, id).await {
            return Ok(account);
        }
        let settings = load_settings(self).await;
        debug!(id, balance = settings.starting_balance, "opening account");
        Ok(Account::new(
            id.to_string(),
            settings.starting_balance,
            self.now_ms,
        ))
    }

    pub(in crate::layer) fn store_account(&mut self, account: Account) {
        self.insert(Key::Account(account.id.clone()), Value::Account(account));
    }

    /// Look up `id`, opening (and staging) the account on first use.
    pub(in crate::layer) async fn handle_account(&mut self, id: &str) -> Result<Output, Failure> {
        validate_id(id)?;
        if let Some(account) = load_account(self, id).await {
            return Ok(Output::Account(account));
        }
        let account = self.load_or_open(id).await?;
        self.store_account(account.clone());
        Ok(Output::Account(account))
    }

    pub(in crate::layer) async fn handle_credit(
        &mut self,
        id: &str,
        amount: u64,
    ) -> Result<Output, Failure> {
        positive(amount)?;
        let mut account = self.load_or_open(id).await?;
        account.win(amount)?;
        self.store_account(account.clone());
        Ok(Output::Account(account))
    }

    pub(in crate::layer) async fn handle_debit(
        &mut self,
        id: &str,
        amount: u64,
    ) -> Result<Output, Failure> {
        positive(amount)?;
        let mut account = self.load_or_open(id).await?;
        account.lose(amount)?;
        self.store_account(account.clone());
        Ok(Output::Account(account))
    }

    pub(in crate::layer) async fn handle_can_afford(
        &self,
        id: &str,
        amount: u64,
    ) -> Result<Output, Failure> {
        let account = self.load_or_open(id).await?;
        Ok(Output::Affordable(account.can_afford(amount)))
    }

    pub(in crate::layer) async fn handle_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<Output, Failure> {
        if amount == 0 {
            return Err(Failure::invalid("transfer amount must be positive"));
        }
        if from == to {
            return Err(Failure::invalid("cannot transfer to yourself"));
        }
        let (from, to) = self.move_funds(from, to, amount).await?;
        Ok(Output::Transferred { from, to })
    }

    /// Move `amount` between two distinct accounts without touching their statistics.
    pub(in crate::layer) async fn move_funds(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(Account, Account), Failure> {
        let mut payer = self.load_or_open(from).await?;
        let mut payee = self.load_or_open(to).await?;
        payer.withdraw(amount)?;
        payee.deposit(amount)?;
        self.store_account(payer.clone());
        self.store_account(payee.clone());
        Ok((payer, payee))
    }

    pub(in crate::layer) async fn handle_claim_daily(
        &mut self,
        id: &str,
    ) -> Result<Output, Failure> {
        let settings = load_settings(self).await;
        let mut account = self.load_or_open(id).await?;
        let cooldown = settings.daily_cooldown_ms.max(1);

        // Claiming exactly one cooldown after the last claim extends the streak;
        // waiting longer starts over.
        let streak = match account.daily.last_claim_ms {
            Some(last) => {
                let elapsed = self.now_ms.saturating_sub(last);
                if elapsed < cooldown {
                    return Err(Failure::Cooldown {
                        remaining_ms: cooldown - elapsed,
                    });
                }
                if elapsed / cooldown == 1 {
                    account.daily.streak.saturating_add(1)
                } else {
                    1
                }
            }
            None => 1,
        };

        let amount = settings.daily_payout(streak);
        let balance = account.deposit(amount)?;
        account.daily = DailyBonus {
            last_claim_ms: Some(self.now_ms),
            streak,
        };
        self.store_account(account);

        Ok(Output::Daily(DailyClaim {
            amount,
            streak,
            multiplier_bps: Settings::daily_multiplier_bps(streak),
            next_claim_ms: self.now_ms.saturating_add(cooldown),
            balance,
        }))
    }
}

fn positive(amount: u64) -> Result<(), Failure> {
    if amount == 0 {
        return Err(Failure::invalid("amount must be positive"));
    }
    Ok(())
}
