use super::*;
use commonware_macros::test_traced;
use commonware_runtime::{
    deterministic::{self, Runner},
    Clock, Metrics, Runner as _,
};
use croupier_execution::{casino::Side, Document, FileStore};
use croupier_types::{
    casino::{Category, GameKind, LoanStatus, PoolKind, LOTTERY_BASE, STARTING_BALANCE},
    Failure,
};
use ledger::{Actor, Mailbox, MailboxError};
use std::fs;
use tempfile::TempDir;

const SESSION_TIMEOUT: Duration = Duration::from_secs(60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

fn ledger_config(dir: &TempDir) -> ledger::Config {
    ledger::Config {
        store_path: dir.path().join("ledger.json"),
        mailbox_size: 16,
        session_timeout: SESSION_TIMEOUT,
        sweep_interval: SWEEP_INTERVAL,
    }
}

fn start(context: &deterministic::Context, config: ledger::Config) -> Mailbox {
    let (actor, mailbox) = Actor::new(context.with_label("ledger"), config);
    actor.start();
    mailbox
}

fn metric(context: &deterministic::Context, name: &str) -> Option<u64> {
    context.encode().lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let metric = parts.next()?;
        if !metric.ends_with(name) {
            return None;
        }
        parts.next()?.parse().ok()
    })
}

#[test]
fn test_config_validation() {
    let yaml = r#"
store_path: data/ledger.json
metrics_port: 9090
worker_threads: 2
log_level: info
mailbox_size: 1024
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let validated = config.validate().unwrap();
    assert_eq!(validated.session_timeout, Duration::from_secs(300));
    assert_eq!(validated.sweep_interval, Duration::from_secs(30));
    assert_eq!(validated.log_level, Level::INFO);
    assert!(!validated.log_json);
    assert_eq!(validated.ledger().store_path, PathBuf::from("data/ledger.json"));

    let config: Config =
        serde_yaml::from_str(&yaml.replace("log_level: info", "log_level: loud")).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidLogLevel { .. })
    ));

    let config: Config =
        serde_yaml::from_str(&yaml.replace("mailbox_size: 1024", "mailbox_size: 0")).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidNonZero {
            field: "mailbox_size",
            ..
        })
    ));

    let config: Config = serde_yaml::from_str(&yaml.replace("data/ledger.json", "\"\"")).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingStorePath)
    ));
}

#[test_traced("INFO")]
fn test_instructions_are_persisted() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let path = config.store_path.clone();
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);

        let alice = mailbox.account("alice").await.unwrap();
        assert_eq!(alice.balance, STARTING_BALANCE);
        let (alice, bob) = mailbox.transfer("alice", "bob", 300).await.unwrap();
        assert_eq!(alice.balance, 700);
        assert_eq!(bob.balance, 1_300);
        let loan = mailbox.issue_loan("bob", "carol", 1_000).await.unwrap();
        assert_eq!(loan.status, LoanStatus::Active);

        let document = FileStore::new(&path).load();
        assert_eq!(document.users["alice"].balance, 700);
        assert_eq!(document.users["bob"].balance, 300);
        assert_eq!(document.users["carol"].balance, 2_000);
        assert_eq!(document.loans[&loan.id], loan);
        assert_eq!(metric(&context, "instructions_executed_total"), Some(3));
    });
}

#[test_traced]
fn test_rejected_instruction_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let path = config.store_path.clone();
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        mailbox.credit("alice", 50).await.unwrap();
        let before = fs::read(&path).unwrap();

        let err = mailbox.debit("alice", 5_000).await.unwrap_err();
        assert!(matches!(
            err.failure(),
            Some(Failure::InsufficientFunds { need: 5_000, .. })
        ));
        let err = mailbox.transfer("alice", "alice", 1).await.unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::Validation(_))));

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(mailbox.account("alice").await.unwrap().balance, 1_050);
        assert_eq!(metric(&context, "instructions_rejected_total"), Some(2));
    });
}

#[test_traced]
fn test_corrupt_store_recovers() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    fs::write(&config.store_path, "not json").unwrap();
    let corrupt = FileStore::new(&config.store_path).corrupt_path();
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        let account = mailbox.account("alice").await.unwrap();
        assert_eq!(account.balance, STARTING_BALANCE);
        assert_eq!(mailbox.peek(PoolKind::Lottery).await.unwrap(), LOTTERY_BASE);
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "not json");
    });
}

#[test_traced]
fn test_failed_save_rolls_back() {
    let dir = TempDir::new().unwrap();
    let mut config = ledger_config(&dir);
    let nested = dir.path().join("nested");
    config.store_path = nested.join("ledger.json");
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        mailbox.credit("alice", 100).await.unwrap();

        // Replace the directory with a file so the next save cannot succeed
        fs::remove_dir_all(&nested).unwrap();
        fs::write(&nested, "in the way").unwrap();

        let err = mailbox.credit("alice", 100).await.unwrap_err();
        assert!(matches!(err, MailboxError::Storage(_)));
        assert_eq!(mailbox.account("alice").await.unwrap().balance, 1_100);
        assert_eq!(metric(&context, "store_saves_failed_total"), Some(1));
    });
}

#[test_traced("INFO")]
fn test_play_coinflip() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        let mut expected = STARTING_BALANCE;
        for _ in 0..10 {
            let settlement = mailbox.play_coinflip("alice", 100, Side::Tails).await.unwrap();
            if settlement.won {
                expected += 100;
            } else {
                expected -= 100;
            }
            assert_eq!(settlement.balance, expected);
        }
        assert_eq!(
            mailbox.peek(PoolKind::Lottery).await.unwrap(),
            LOTTERY_BASE + 10 * 10
        );
        let account = mailbox.account("alice").await.unwrap();
        assert_eq!(account.stats.games_played, 10);

        let err = mailbox
            .play_coinflip("alice", 0, Side::Heads)
            .await
            .unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::Validation(_))));
    });
}

#[test_traced]
fn test_overdue_borrower_cannot_play() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let mut document = Document::default();
    document.settings.loan_duration_ms = 10_000;
    FileStore::new(&config.store_path).save(&document).unwrap();
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        let loan = mailbox.request_loan("bob", "alice", 500).await.unwrap();
        assert!(!mailbox.is_blocked("bob").await.unwrap());
        let loan = mailbox.accept_loan("alice", loan.id).await.unwrap();

        context.sleep(Duration::from_millis(10_001)).await;
        assert!(mailbox.is_blocked("bob").await.unwrap());
        let err = mailbox
            .play_coinflip("bob", 10, Side::Heads)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MailboxError::Rejected(Failure::Blocked { overdue: 1 })
        ));

        let repaid = mailbox.repay_loan("bob", loan.id).await.unwrap();
        assert_eq!(repaid.status, LoanStatus::Paid);
        assert!(!mailbox.is_blocked("bob").await.unwrap());
        assert_eq!(mailbox.loan_history("alice").await.unwrap(), vec![repaid]);
    });
}

#[test_traced]
fn test_idle_session_is_swept() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        let err = mailbox
            .start_session("alice", GameKind::Slots, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::Validation(_))));
        mailbox
            .start_session("alice", GameKind::Mines, vec![1, 2, 3])
            .await
            .unwrap();
        let err = mailbox
            .start_session("alice", GameKind::Crash, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::SessionExists)));
        let err = mailbox.session("alice", "bob").await.unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::SessionNotOwned)));

        let session = mailbox
            .update_session("alice", "alice", vec![4])
            .await
            .unwrap();
        assert_eq!(session.payload, vec![4]);

        // Let the sweep run past the idle timeout
        context.sleep(SESSION_TIMEOUT + 2 * SWEEP_INTERVAL).await;
        assert_eq!(metric(&context, "sessions_expired_total"), Some(1));
        let err = mailbox.session("alice", "alice").await.unwrap_err();
        assert!(matches!(err, MailboxError::Rejected(Failure::SessionNotFound)));

        let session = mailbox
            .start_session("alice", GameKind::Crash, vec![])
            .await
            .unwrap();
        assert_eq!(session.game, GameKind::Crash);
        let ended = mailbox.end_session("alice", "alice").await.unwrap();
        assert_eq!(ended.game, GameKind::Crash);
    });
}

#[test_traced]
fn test_leaderboard_refresh() {
    let dir = TempDir::new().unwrap();
    let config = ledger_config(&dir);
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut mailbox = start(&context, config);
        mailbox.credit("alice", 5_000).await.unwrap();
        mailbox.credit("bob", 1_000).await.unwrap();
        assert_eq!(
            mailbox.rank_of("alice", Category::Richest).await.unwrap(),
            None
        );

        let leaderboard = mailbox.refresh_leaderboard().await.unwrap();
        assert_eq!(leaderboard.richest[0].account, "alice");
        assert_eq!(
            mailbox.rank_of("bob", Category::Richest).await.unwrap(),
            Some(1)
        );
        assert_eq!(mailbox.leaderboard().await.unwrap(), leaderboard);
    });
}
