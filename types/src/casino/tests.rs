use super::*;
use crate::execution::Failure;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

fn account(id: &str, balance: u64) -> Account {
    Account::new(id.to_string(), balance, 0)
}

#[test]
fn test_adjust_credit_then_debit_restores_balance() {
    let mut acct = account("alice", STARTING_BALANCE);
    acct.adjust(250).unwrap();
    acct.adjust(-250).unwrap();
    assert_eq!(acct.balance, STARTING_BALANCE);
    assert_eq!(acct.stats.total_winnings, 250);
    assert_eq!(acct.stats.total_lost, 250);
    assert_eq!(acct.stats.biggest_win, 250);
}

#[test]
fn test_adjust_rejects_overdraw() {
    let mut acct = account("alice", 1_000);
    let err = acct.adjust(-1_500).unwrap_err();
    assert_eq!(
        err,
        Failure::InsufficientFunds {
            payer: "alice".to_string(),
            have: 1_000,
            need: 1_500,
        }
    );
    assert_eq!(acct.balance, 1_000);
    assert_eq!(acct.stats.total_lost, 0);
}

#[test]
fn test_biggest_win_only_grows() {
    let mut acct = account("alice", 0);
    acct.adjust(500).unwrap();
    acct.adjust(200).unwrap();
    assert_eq!(acct.stats.biggest_win, 500);
    acct.adjust(900).unwrap();
    assert_eq!(acct.stats.biggest_win, 900);
}

#[test]
fn test_deposit_and_withdraw_skip_stats() {
    let mut acct = account("alice", 100);
    acct.deposit(1_000).unwrap();
    acct.withdraw(300).unwrap();
    assert_eq!(acct.balance, 800);
    assert_eq!(acct.stats, Stats::default());
}

#[test]
fn test_open_wagers_close_once() {
    let mut acct = account("alice", 100);
    acct.open_wager(GameKind::Dice, 10);
    acct.open_wager(GameKind::Dice, 10);
    assert!(!acct.close_wager(GameKind::Slots, 10));
    assert!(!acct.close_wager(GameKind::Dice, 20));
    assert!(acct.close_wager(GameKind::Dice, 10));
    assert!(acct.close_wager(GameKind::Dice, 10));
    assert!(!acct.close_wager(GameKind::Dice, 10));
}

#[test]
fn test_streak_tracking() {
    let mut stats = Stats::default();
    stats.record_game(true);
    stats.record_game(true);
    stats.record_game(true);
    stats.record_game(false);
    stats.record_game(true);
    assert_eq!(stats.games_played, 5);
    assert_eq!(stats.games_won, 4);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.best_streak, 3);
    assert_eq!(stats.win_rate_bps(), 8_000);
}

#[test]
fn test_loan_terms() {
    let loan = Loan::new(
        LoanId(7),
        "lender".to_string(),
        "borrower".to_string(),
        1_000,
        LOAN_INTEREST_BPS,
        LOAN_DURATION_MS,
        5_000,
        LoanStatus::Active,
    );
    assert_eq!(loan.interest, 100);
    assert_eq!(loan.total_owed, 1_100);
    assert_eq!(loan.due_at_ms, 5_000 + LOAN_DURATION_MS);
    assert_eq!(loan.accepted_at_ms, Some(5_000));
    assert!(!loan.is_overdue(loan.due_at_ms));
    assert!(loan.is_overdue(loan.due_at_ms + 1));
}

#[test]
fn test_interest_is_floored() {
    for principal in [1u64, 9, 10, 19, 333, 4_999] {
        let expected = principal + principal / 10;
        let loan = Loan::new(
            LoanId(1),
            "a".to_string(),
            "b".to_string(),
            principal,
            LOAN_INTEREST_BPS,
            LOAN_DURATION_MS,
            0,
            LoanStatus::Pending,
        );
        assert_eq!(loan.total_owed, expected, "principal {principal}");
    }
}

#[test]
fn test_pending_loan_is_never_overdue() {
    let mut loan = Loan::new(
        LoanId(1),
        "a".to_string(),
        "b".to_string(),
        100,
        LOAN_INTEREST_BPS,
        10,
        0,
        LoanStatus::Pending,
    );
    assert!(!loan.is_overdue(1_000));
    loan.activate(1_000, 10);
    assert_eq!(loan.due_at_ms, 1_010);
    assert!(loan.is_overdue(1_011));
}

#[test]
fn test_loan_id_is_monotonic() {
    let first = LoanId::next(LoanId::default(), 1_000);
    assert_eq!(first, LoanId(1_000));
    let second = LoanId::next(first, 1_000);
    assert_eq!(second, LoanId(1_001));
    let third = LoanId::next(second, 900);
    assert_eq!(third, LoanId(1_002));
}

#[test]
fn test_pool_accumulates_skim() {
    let mut pool = PoolKind::Jackpot.genesis();
    for _ in 0..10 {
        assert_eq!(pool.contribute(100), 10);
    }
    assert_eq!(pool.amount, 10_100);
}

#[test]
fn test_pool_drain_resets_to_base() {
    let mut pool = Pool::new(500, 1_000);
    pool.contribute(1_000);
    assert_eq!(pool.drain(), 600);
    assert_eq!(pool.amount, 500);
    assert_eq!(pool.drain(), 500);
}

#[test]
fn test_daily_multiplier_tiers() {
    let settings = Settings::default();
    assert_eq!(settings.daily_payout(1), 1_000);
    assert_eq!(settings.daily_payout(2), 1_000);
    assert_eq!(settings.daily_payout(3), 1_500);
    assert_eq!(settings.daily_payout(7), 2_000);
    assert_eq!(settings.daily_payout(14), 2_500);
    assert_eq!(settings.daily_payout(29), 2_500);
    assert_eq!(settings.daily_payout(30), 3_000);
}

#[test]
fn test_settings_fill_missing_fields() {
    let settings: Settings = serde_json::from_str(r#"{"daily_amount": 50}"#).unwrap();
    assert_eq!(settings.daily_amount, 50);
    assert_eq!(settings.loan_interest_bps, LOAN_INTEREST_BPS);
    assert_eq!(settings.max_loan_amount, MAX_LOAN_AMOUNT);
}

#[test]
fn test_leaderboard_rebuild() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut accounts: Vec<Account> = (0..15)
        .map(|i| {
            let mut a = account(&format!("player{i:02}"), (i as u64 + 1) * 1_000);
            a.stats.games_played = 15 - i as u64;
            a
        })
        .collect();
    accounts.shuffle(&mut rng);

    let leaderboard = Leaderboard::rebuild(&accounts, LEADERBOARD_SIZE, 99);

    // Should only keep top 10
    assert_eq!(leaderboard.richest.len(), 10);
    assert_eq!(leaderboard.most_played.len(), 10);

    // Should be sorted descending
    for pair in leaderboard.richest.windows(2) {
        assert!(pair[0].value >= pair[1].value);
    }
    assert_eq!(leaderboard.richest[0].account, "player14");
    assert_eq!(leaderboard.most_played[0].account, "player00");
    assert_eq!(leaderboard.refreshed_at_ms, 99);

    assert_eq!(leaderboard.rank("player14", Category::Richest), Some(0));
    assert_eq!(leaderboard.rank("player05", Category::Richest), Some(9));
    assert_eq!(leaderboard.rank("player04", Category::Richest), None);
}

#[test]
fn test_leaderboard_ties_break_by_id() {
    let accounts = vec![account("carol", 10), account("alice", 10), account("bob", 10)];
    let leaderboard = Leaderboard::rebuild(&accounts, 2, 0);
    let ids: Vec<&str> = leaderboard
        .richest
        .iter()
        .map(|e| e.account.as_str())
        .collect();
    assert_eq!(ids, vec!["alice", "bob"]);
}

#[test]
fn test_failure_codes_are_distinct() {
    let failures = [
        Failure::invalid("x"),
        Failure::InsufficientFunds {
            payer: "a".to_string(),
            have: 0,
            need: 1,
        },
        Failure::NotFound("a".to_string()),
        Failure::Blocked { overdue: 1 },
        Failure::Cooldown { remaining_ms: 1 },
        Failure::NotPending(LoanId(1)),
        Failure::SessionExists,
        Failure::SessionNotFound,
        Failure::SessionNotOwned,
    ];
    let mut codes: Vec<u8> = failures.iter().map(Failure::code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), failures.len());
}
