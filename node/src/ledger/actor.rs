use super::{
    ingress::{Mailbox, MailboxError, Message},
    Config, SessionState,
};
use commonware_macros::select;
use commonware_runtime::{Clock, Handle, Metrics, Spawner};
use croupier_execution::{
    casino::Policy, sessions::Registry, Document, FileStore, Layer, State, Status,
};
use croupier_types::{casino::Settlement, Instruction, Key, Output};
use futures::{channel::mpsc, StreamExt};
use prometheus_client::metrics::counter::Counter;
use rand::RngCore;
use std::{
    sync::atomic::AtomicU64,
    time::{Duration, SystemTime},
};
use tracing::{debug, info, warn};

fn system_time_ms(now: SystemTime) -> u64 {
    match now.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => duration.as_millis() as u64,
        Err(_) => 0,
    }
}

enum Event {
    Sweep,
    Message(Message),
    Closed,
}

/// Ledger actor.
///
/// Owns the document, its file and the session registry. Requests are handled
/// one at a time, so every instruction observes the effects of the previous one.
pub struct Actor<E: Clock + Spawner + Metrics + RngCore> {
    context: E,
    mailbox: mpsc::Receiver<Message>,

    store: FileStore,
    document: Document,
    sessions: Registry<SessionState>,
    sweep_interval: Duration,

    executed: Counter<u64, AtomicU64>,
    rejected: Counter<u64, AtomicU64>,
    expired: Counter<u64, AtomicU64>,
    saves_failed: Counter<u64, AtomicU64>,
}

impl<E: Clock + Spawner + Metrics + RngCore> Actor<E> {
    /// Create a new ledger actor, loading (or initializing) the document at `config.store_path`.
    pub fn new(context: E, config: Config) -> (Self, Mailbox) {
        // Create mailbox
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        let inbound = Mailbox::new(sender, context.stopped());

        // Load ledger
        let store = FileStore::new(config.store_path);
        let document = store.load();

        // Initialize metrics
        let executed: Counter<u64, AtomicU64> = Counter::default();
        let rejected: Counter<u64, AtomicU64> = Counter::default();
        let expired: Counter<u64, AtomicU64> = Counter::default();
        let saves_failed: Counter<u64, AtomicU64> = Counter::default();
        context.register(
            "instructions_executed",
            "Number of instructions applied to the ledger",
            executed.clone(),
        );
        context.register(
            "instructions_rejected",
            "Number of instructions rejected by ledger rules",
            rejected.clone(),
        );
        context.register(
            "sessions_expired",
            "Number of game sessions dropped for inactivity",
            expired.clone(),
        );
        context.register(
            "store_saves_failed",
            "Number of ledger saves that failed and were rolled back",
            saves_failed.clone(),
        );

        (
            Self {
                context,
                mailbox,
                store,
                document,
                sessions: Registry::new(config.session_timeout),
                sweep_interval: config.sweep_interval,
                executed,
                rejected,
                expired,
                saves_failed,
            },
            inbound,
        )
    }

    pub fn start(mut self) -> Handle<()> {
        self.context.spawn_ref()(self.run())
    }

    fn now_ms(&self) -> u64 {
        system_time_ms(self.context.current())
    }

    /// Run the ledger actor until every mailbox is dropped.
    async fn run(mut self) {
        let mut next_sweep = self.context.current() + self.sweep_interval;
        loop {
            let event = select! {
                _ = self.context.sleep_until(next_sweep) => {
                    Event::Sweep
                },
                message = self.mailbox.next() => {
                    match message {
                        Some(message) => Event::Message(message),
                        None => Event::Closed,
                    }
                },
            };
            match event {
                Event::Sweep => {
                    self.sweep();
                    next_sweep = self.context.current() + self.sweep_interval;
                }
                Event::Message(message) => self.handle(message).await,
                Event::Closed => {
                    info!("mailbox closed, stopping ledger");
                    return;
                }
            }
        }
    }

    async fn handle(&mut self, message: Message) {
        match message {
            Message::Execute {
                instruction,
                response,
            } => {
                let result = self.execute(instruction).await;
                let _ = response.send(result);
            }
            Message::Play {
                id,
                bet,
                policy,
                response,
            } => {
                let result = self.play(&id, bet, policy.as_ref()).await;
                let _ = response.send(result);
            }
            Message::StartSession {
                owner,
                game,
                payload,
                response,
            } => {
                let now_ms = self.now_ms();
                let result = self
                    .sessions
                    .create(&owner, game, payload, now_ms)
                    .cloned()
                    .map_err(MailboxError::from);
                if result.is_ok() {
                    debug!(%owner, %game, "session started");
                }
                let _ = response.send(result);
            }
            Message::Session {
                owner,
                actor,
                response,
            } => {
                let now_ms = self.now_ms();
                let result = self
                    .sessions
                    .get(&owner, &actor, now_ms)
                    .map(|session| session.clone())
                    .map_err(MailboxError::from);
                let _ = response.send(result);
            }
            Message::UpdateSession {
                owner,
                actor,
                payload,
                response,
            } => {
                let now_ms = self.now_ms();
                let result = self
                    .sessions
                    .update(&owner, &actor, payload, now_ms)
                    .cloned()
                    .map_err(MailboxError::from);
                let _ = response.send(result);
            }
            Message::EndSession {
                owner,
                actor,
                response,
            } => {
                let now_ms = self.now_ms();
                let result = self
                    .sessions
                    .end(&owner, &actor, now_ms)
                    .map_err(MailboxError::from);
                if result.is_ok() {
                    debug!(%owner, "session ended");
                }
                let _ = response.send(result);
            }
        }
    }

    async fn execute(&mut self, instruction: Instruction) -> Result<Output, MailboxError> {
        let now_ms = self.now_ms();
        let mut layer = Layer::new(&self.document, now_ms);
        let output = match layer.execute(&instruction).await {
            Ok(output) => output,
            Err(failure) => {
                self.rejected.inc();
                debug!(?instruction, %failure, "instruction rejected");
                return Err(failure.into());
            }
        };
        let changes = layer.commit();
        if instruction.is_mutating() {
            self.persist(changes).await?;
        }
        self.executed.inc();
        Ok(output)
    }

    async fn play(
        &mut self,
        id: &str,
        bet: u64,
        policy: &dyn Policy,
    ) -> Result<Settlement, MailboxError> {
        let now_ms = self.now_ms();
        let mut layer = Layer::new(&self.document, now_ms);
        let settlement = match layer.play(id, bet, policy, &mut self.context).await {
            Ok(settlement) => settlement,
            Err(failure) => {
                self.rejected.inc();
                debug!(id, bet, game = %policy.game(), %failure, "play rejected");
                return Err(failure.into());
            }
        };
        let changes = layer.commit();
        self.persist(changes).await?;
        self.executed.inc();
        info!(
            id,
            game = %settlement.game,
            bet,
            payout = settlement.payout,
            won = settlement.won,
            "game settled"
        );
        Ok(settlement)
    }

    /// Apply `changes` and save. If the save fails, the document reverts to
    /// what is on disk.
    async fn persist(&mut self, changes: Vec<(Key, Status)>) -> Result<(), MailboxError> {
        if changes.is_empty() {
            return Ok(());
        }
        let snapshot = self.document.clone();
        self.document.apply(changes).await;
        if let Err(err) = self.store.save(&self.document) {
            self.saves_failed.inc();
            warn!(path = ?self.store.path(), ?err, "failed to save ledger, rolling back");
            self.document = snapshot;
            return Err(MailboxError::Storage(err.to_string()));
        }
        Ok(())
    }

    fn sweep(&mut self) {
        let expired = self.sessions.expire(self.now_ms());
        if expired.is_empty() {
            return;
        }
        for session in &expired {
            info!(owner = %session.owner, game = %session.game, "session expired");
        }
        self.expired.inc_by(expired.len() as u64);
    }
}
