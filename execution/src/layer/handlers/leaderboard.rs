use super::super::*;
use crate::state::load_settings;
use croupier_types::casino::{Category, Leaderboard};
use tracing::debug;

impl<'a, S: State> Layer<'a, S> {
    async fn cached_leaderboard(&self) -> Leaderboard {
        match self.get(&Key::Leaderboard).await {
            Some(Value::Leaderboard(leaderboard)) => leaderboard,
            _ => Leaderboard::default(),
        }
    }

    pub(in crate::layer) async fn handle_refresh_leaderboard(&mut self) -> Result<Output, Failure> {
        let settings = load_settings(self).await;
        let accounts = self.accounts().await;
        let leaderboard = Leaderboard::rebuild(&accounts, settings.leaderboard_size, self.now_ms);
        debug!(accounts = accounts.len(), "rebuilt leaderboard");
        self.insert(Key::Leaderboard, Value::Leaderboard(leaderboard.clone()));

        Ok(Output::Leaderboard(leaderboard))
    }

    pub(in crate::layer) async fn handle_leaderboard(&self) -> Result<Output, Failure> {
        Ok(Output::Leaderboard(self.cached_leaderboard().await))
    }

    pub(in crate::layer) async fn handle_rank(
        &self,
        id: &str,
        category: Category,
    ) -> Result<Output, Failure> {
        validate_id(id)?;
        Ok(Output::Rank(self.cached_leaderboard().await.rank(id, category)))
    }
}
