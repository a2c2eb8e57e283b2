use super::super::*;
use crate::casino::{Policy, Resolution};
use croupier_types::casino::{CasinoStats, GameKind, PoolKind, Settlement, WagerReceipt};
use rand::RngCore;
use tracing::debug;

impl<'a, S: State> Layer<'a, S> {
    async fn casino_stats(&self) -> CasinoStats {
        match self.get(&Key::CasinoStats).await {
            Some(Value::CasinoStats(stats)) => stats,
            _ => CasinoStats::default(),
        }
    }

    /// Gate, debit and skim a bet. The bet counts as a loss until settled.
    pub(in crate::layer) async fn handle_wager(
        &mut self,
        id: &str,
        game: GameKind,
        bet: u64,
        pools: &[PoolKind],
    ) -> Result<WagerReceipt, Failure> {
        if bet == 0 {
            return Err(Failure::invalid("bet must be greater than zero"));
        }
        let mut account = self.load_or_open(id).await?;
        self.ensure_not_blocked(&account).await?;
        let balance = account.lose(bet)?;
        account.open_wager(game, bet);
        self.store_account(account);

        let mut contributions = Vec::with_capacity(pools.len());
        for kind in PoolKind::ALL {
            if !pools.contains(&kind) {
                continue;
            }
            let (amount, _) = self.contribute(kind, bet).await;
            contributions.push((kind, amount));
        }
        debug!(id, %game, bet, "wager placed");

        Ok(WagerReceipt {
            game,
            bet,
            contributions,
            balance,
        })
    }

    /// Credit `payout` (plus the drained `jackpot`, if any) for a placed wager.
    ///
    /// The wager must still be open on the account. A blocked player cannot
    /// settle; the wager stays open until the block is lifted.
    pub(in crate::layer) async fn handle_settle(
        &mut self,
        id: &str,
        game: GameKind,
        bet: u64,
        payout: u64,
        jackpot: Option<PoolKind>,
    ) -> Result<Settlement, Failure> {
        if bet == 0 {
            return Err(Failure::invalid("bet must be greater than zero"));
        }
        let mut account = self.load_or_open(id).await?;
        self.ensure_not_blocked(&account).await?;
        if !account.close_wager(game, bet) {
            return Err(Failure::NotFound(format!("open {game} wager of {bet} for {id}")));
        }
        let award = match jackpot {
            Some(kind) => Some(self.drain(kind).await),
            None => None,
        };
        let total = payout
            .checked_add(award.as_ref().map_or(0, |a| a.awarded))
            .ok_or_else(|| Failure::invalid("payout overflow"))?;
        if total > 0 {
            account.win(total)?;
        }
        let won = total > bet;
        account.stats.record_game(won);
        let balance = account.balance;
        self.store_account(account);

        let mut stats = self.casino_stats().await;
        stats.record(bet, total);
        self.insert(Key::CasinoStats, Value::CasinoStats(stats));
        debug!(id, %game, bet, payout = total, won, "wager settled");

        Ok(Settlement {
            game,
            bet,
            payout: total,
            won,
            jackpot: award,
            balance,
        })
    }

    /// Place, resolve and settle one single-shot game under `policy`.
    pub async fn play<P: Policy + ?Sized, R: RngCore>(
        &mut self,
        id: &str,
        bet: u64,
        policy: &P,
        rng: &mut R,
    ) -> Result<Settlement, Failure> {
        let game = policy.game();
        self.handle_wager(id, game, bet, policy.pools()).await?;
        let (payout, jackpot) = match policy.resolve(bet, rng) {
            Resolution::Lose => (0, None),
            Resolution::Win { payout } => (payout, None),
            Resolution::Jackpot(kind) => (0, Some(kind)),
        };
        self.handle_settle(id, game, bet, payout, jackpot).await
    }
}
