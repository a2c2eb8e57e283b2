use super::super::*;
use crate::state::load_pool;
use croupier_types::casino::{Pool, PoolAward, PoolKind};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    fn store_pool(&mut self, kind: PoolKind, pool: Pool) {
        self.insert(Key::Pool(kind), Value::Pool(pool));
    }

    /// Skim `wager` into `kind`, returning the contribution and the new total.
    pub(in crate::layer) async fn contribute(&mut self, kind: PoolKind, wager: u64) -> (u64, u64) {
        let mut pool = load_pool(self, kind).await;
        let amount = pool.contribute(wager);
        let total = pool.amount;
        if amount > 0 {
            self.store_pool(kind, pool);
        }
        (amount, total)
    }

    /// Empty `kind` back to its base, returning what it held.
    pub(in crate::layer) async fn drain(&mut self, kind: PoolKind) -> PoolAward {
        let mut pool = load_pool(self, kind).await;
        let awarded = pool.drain();
        let award = PoolAward {
            pool: kind,
            awarded,
            new_amount: pool.amount,
        };
        self.store_pool(kind, pool);
        award
    }

    pub(in crate::layer) async fn handle_contribute(
        &mut self,
        kind: PoolKind,
        wager: u64,
    ) -> Result<Output, Failure> {
        let (amount, total) = self.contribute(kind, wager).await;
        Ok(Output::Contributed {
            pool: kind,
            amount,
            total,
        })
    }

    /// Pay the whole pool to `id` as winnings.
    pub(in crate::layer) async fn handle_award(
        &mut self,
        kind: PoolKind,
        id: &str,
    ) -> Result<Output, Failure> {
        let mut account = self.load_or_open(id).await?;
        let award = self.drain(kind).await;
        account.win(award.awarded)?;
        self.store_account(account);
        info!(pool = %kind, winner = id, amount = award.awarded, "pool awarded");

        Ok(Output::Awarded(award))
    }

    pub(in crate::layer) async fn handle_peek(&self, kind: PoolKind) -> Result<Output, Failure> {
        Ok(Output::Pool(load_pool(self, kind).await.amount))
    }
}
