//! Durable ledger document.
//!
//! The whole ledger is one JSON document. Loading never fails: a missing,
//! empty or unreadable file yields a fresh ledger (an unreadable file is moved
//! aside first). Saving writes a sibling temp file and renames it over the
//! original, so a crash mid-save leaves the previous document intact.

use croupier_types::{
    casino::{
        Account, AccountId, CasinoStats, Leaderboard, Loan, LoanId, Pool, PoolKind, Settings,
    },
    Key, Value,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::State;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed ledger: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoSection {
    pub jackpot: Pool,
    pub stats: CasinoStats,
}

impl Default for CasinoSection {
    fn default() -> Self {
        Self {
            jackpot: PoolKind::Jackpot.genesis(),
            stats: CasinoStats::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotterySection {
    pub jackpot: Pool,
}

impl Default for LotterySection {
    fn default() -> Self {
        Self {
            jackpot: PoolKind::Lottery.genesis(),
        }
    }
}

/// In-memory image of the persisted ledger. Sections missing from the file
/// take their defaults, so older documents load without migration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub users: BTreeMap<AccountId, Account>,
    pub loans: BTreeMap<LoanId, Loan>,
    pub last_loan_id: LoanId,
    pub casino: CasinoSection,
    pub lottery: LotterySection,
    pub leaderboard: Leaderboard,
    pub settings: Settings,
}

impl Document {
    pub fn pool(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::Jackpot => &self.casino.jackpot,
            PoolKind::Lottery => &self.lottery.jackpot,
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut Pool {
        match kind {
            PoolKind::Jackpot => &mut self.casino.jackpot,
            PoolKind::Lottery => &mut self.lottery.jackpot,
        }
    }
}

impl State for Document {
    async fn get(&self, key: &Key) -> Option<Value> {
        match key {
            Key::Account(id) => self.users.get(id).cloned().map(Value::Account),
            Key::Loan(id) => self.loans.get(id).cloned().map(Value::Loan),
            Key::LastLoanId => Some(Value::LastLoanId(self.last_loan_id)),
            Key::Pool(kind) => Some(Value::Pool(self.pool(*kind).clone())),
            Key::CasinoStats => Some(Value::CasinoStats(self.casino.stats.clone())),
            Key::Leaderboard => Some(Value::Leaderboard(self.leaderboard.clone())),
            Key::Settings => Some(Value::Settings(self.settings.clone())),
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        match (key, value) {
            (Key::Account(id), Value::Account(account)) => {
                self.users.insert(id, account);
            }
            (Key::Loan(id), Value::Loan(loan)) => {
                self.loans.insert(id, loan);
            }
            (Key::LastLoanId, Value::LastLoanId(id)) => self.last_loan_id = id,
            (Key::Pool(kind), Value::Pool(pool)) => *self.pool_mut(kind) = pool,
            (Key::CasinoStats, Value::CasinoStats(stats)) => self.casino.stats = stats,
            (Key::Leaderboard, Value::Leaderboard(leaderboard)) => self.leaderboard = leaderboard,
            (Key::Settings, Value::Settings(settings)) => self.settings = settings,
            (key, _) => warn!(?key, "ignoring value of mismatched type"),
        }
    }

    async fn delete(&mut self, key: &Key) {
        match key {
            Key::Account(id) => {
                self.users.remove(id);
            }
            Key::Loan(id) => {
                self.loans.remove(id);
            }
            Key::LastLoanId => self.last_loan_id = LoanId::default(),
            Key::Pool(kind) => *self.pool_mut(*kind) = kind.genesis(),
            Key::CasinoStats => self.casino.stats = CasinoStats::default(),
            Key::Leaderboard => self.leaderboard = Leaderboard::default(),
            Key::Settings => self.settings = Settings::default(),
        }
    }

    async fn accounts(&self) -> Vec<Account> {
        self.users.values().cloned().collect()
    }

    async fn loans(&self) -> Vec<Loan> {
        self.loans.values().cloned().collect()
    }
}

/// JSON file backing a [Document].
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable document is moved before reinitializing.
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    /// First unused of `<file>.corrupt`, `<file>.corrupt.1`, `<file>.corrupt.2`, ...
    fn free_corrupt_path(&self) -> PathBuf {
        let mut path = self.corrupt_path();
        let mut attempt = 0u32;
        while path.exists() {
            attempt += 1;
            path = self.sibling(&format!(".corrupt.{attempt}"));
        }
        path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Load the ledger, reinitializing it if the file is missing, empty or corrupt.
    pub fn load(&self) -> Document {
        match self.read() {
            Ok(Some(document)) => {
                info!(
                    path = ?self.path,
                    users = document.users.len(),
                    loans = document.loans.len(),
                    "loaded ledger"
                );
                document
            }
            Ok(None) => {
                info!(path = ?self.path, "no ledger found, initializing");
                self.initialize()
            }
            Err(err) => {
                let preserved = self.free_corrupt_path();
                warn!(path = ?self.path, ?preserved, ?err, "ledger unreadable, reinitializing");
                if let Err(err) = fs::rename(&self.path, &preserved) {
                    warn!(?err, "failed to preserve unreadable ledger");
                }
                self.initialize()
            }
        }
    }

    fn read(&self) -> Result<Option<Document>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn initialize(&self) -> Document {
        let document = Document::default();
        if let Err(err) = self.save(&document) {
            warn!(path = ?self.path, ?err, "failed to write fresh ledger");
        }
        document
    }

    /// Atomically replace the file with `document`.
    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(document)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        debug!(path = ?self.path, bytes = data.len(), "saved ledger");
        Ok(())
    }
}
