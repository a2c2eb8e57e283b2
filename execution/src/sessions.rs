//! In-flight multi-step games.
//!
//! Sessions are keyed by their owner, so a player has at most one game in
//! progress. Only the owner may act on a session, and a session nobody has
//! touched for longer than the idle timeout is dropped by [Registry::expire].
//! Sessions are not persisted.

use croupier_types::{
    casino::{AccountId, GameKind},
    Failure,
};
use std::{collections::HashMap, time::Duration};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session<T> {
    pub owner: AccountId,
    pub game: GameKind,
    pub payload: T,
    pub started_at_ms: u64,
    pub last_active_ms: u64,
}

pub struct Registry<T> {
    sessions: HashMap<AccountId, Session<T>>,
    idle_timeout_ms: u64,
}

impl<T> Registry<T> {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout_ms: u64::try_from(idle_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_idle(&self, session: &Session<T>, now_ms: u64) -> bool {
        now_ms.saturating_sub(session.last_active_ms) > self.idle_timeout_ms
    }

    /// Open a session for `owner`. An idle session still awaiting the sweep is replaced.
    pub fn create(
        &mut self,
        owner: &str,
        game: GameKind,
        payload: T,
        now_ms: u64,
    ) -> Result<&Session<T>, Failure> {
        if !game.is_session_based() {
            return Err(Failure::invalid(format!("{game} is settled in one step")));
        }
        if let Some(existing) = self.sessions.get(owner) {
            if !self.is_idle(existing, now_ms) {
                return Err(Failure::SessionExists);
            }
        }
        let session = Session {
            owner: owner.to_string(),
            game,
            payload,
            started_at_ms: now_ms,
            last_active_ms: now_ms,
        };
        self.sessions.insert(owner.to_string(), session);
        self.sessions.get(owner).ok_or(Failure::SessionNotFound)
    }

    /// Session of `owner` as seen by `actor`; refreshes its idle timer.
    pub fn get(
        &mut self,
        owner: &str,
        actor: &str,
        now_ms: u64,
    ) -> Result<&mut Session<T>, Failure> {
        let idle = match self.sessions.get(owner) {
            Some(session) => self.is_idle(session, now_ms),
            None => return Err(Failure::SessionNotFound),
        };
        if idle {
            self.sessions.remove(owner);
            return Err(Failure::SessionNotFound);
        }
        if actor != owner {
            return Err(Failure::SessionNotOwned);
        }
        let session = self
            .sessions
            .get_mut(owner)
            .ok_or(Failure::SessionNotFound)?;
        session.last_active_ms = now_ms;
        Ok(session)
    }

    /// Replace the payload of `owner`'s session.
    pub fn update(
        &mut self,
        owner: &str,
        actor: &str,
        payload: T,
        now_ms: u64,
    ) -> Result<&Session<T>, Failure> {
        let session = self.get(owner, actor, now_ms)?;
        session.payload = payload;
        Ok(session)
    }

    /// Close `owner`'s session, returning it. An idle session reads as missing.
    pub fn end(&mut self, owner: &str, actor: &str, now_ms: u64) -> Result<Session<T>, Failure> {
        self.get(owner, actor, now_ms)?;
        self.sessions.remove(owner).ok_or(Failure::SessionNotFound)
    }

    /// Drop and return every session idle past the timeout.
    pub fn expire(&mut self, now_ms: u64) -> Vec<Session<T>> {
        let idle: Vec<AccountId> = self
            .sessions
            .values()
            .filter(|session| self.is_idle(session, now_ms))
            .map(|session| session.owner.clone())
            .collect();
        idle.into_iter()
            .filter_map(|owner| self.sessions.remove(&owner))
            .collect()
    }
}
