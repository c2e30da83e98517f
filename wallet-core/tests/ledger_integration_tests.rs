//! Integration tests for wallet-core
//!
//! These tests drive the ledger engine and account registry against real
//! DuckDB databases in temporary directories.
//!
//! Run with: cargo test --test ledger_integration_tests -- --nocapture

use std::sync::Arc;

use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use wallet_core::adapters::duckdb::{DuckDbStore, DuckDbUnit};
use wallet_core::config::Config;
use wallet_core::domain::{
    Account, Argon2Params, Error, ErrorKind, LedgerEntry, Result, MAX_MONEY,
};
use wallet_core::ports::{AccountStore, LedgerStore};
use wallet_core::services::{DuplicatePolicy, LedgerEngine};
use wallet_core::{
    LoginRequest, OperationResult, RegisterRequest, TransactionRequest, WalletContext,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Wallet directory with cheap password hashing
fn wallet_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "passwordHashing": { "timeCost": 1, "memoryCost": 8, "parallelism": 1 } }"#,
    )
    .unwrap();
    dir
}

fn test_config(policy: DuplicatePolicy) -> Config {
    Config {
        duplicate_policy: policy,
        password_hashing: Argon2Params::minimal(),
        ..Config::default()
    }
}

fn register(ctx: &WalletContext, username: &str, balance: &str) -> Uuid {
    ctx.register(&RegisterRequest {
        username: username.to_string(),
        password: "pw123456".to_string(),
        name: format!("{} display", username),
        balance: dec(balance),
    })
    .unwrap()
    .player_id
}

fn tx(player_id: Uuid, transaction_id: &str, amount: &str) -> TransactionRequest {
    TransactionRequest::new(player_id, transaction_id, dec(amount))
}

fn seeded_store(temp_dir: &TempDir, balance: &str) -> (Arc<DuckDbStore>, Uuid) {
    let store = Arc::new(DuckDbStore::open(&temp_dir.path().join("wallet.duckdb"), 4).unwrap());
    let account = Account::new("alice", "hash", "Alice", dec(balance));
    store.insert_account(&account).unwrap();
    (store, account.id)
}

// ============================================================================
// Fault injection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    WriteBalance,
    AppendEntry,
    Commit,
}

/// Delegates to DuckDB but fails at one chosen step of the unit
struct FaultyStore {
    inner: Arc<DuckDbStore>,
    fail_at: FailAt,
}

impl LedgerStore for FaultyStore {
    type Unit = DuckDbUnit;

    fn begin_unit(&self) -> Result<DuckDbUnit> {
        self.inner.begin_unit()
    }

    fn read_balance(&self, unit: &mut DuckDbUnit, account_id: Uuid) -> Result<Option<Decimal>> {
        self.inner.read_balance(unit, account_id)
    }

    fn write_balance(&self, unit: &mut DuckDbUnit, account_id: Uuid, balance: Decimal) -> Result<()> {
        if self.fail_at == FailAt::WriteBalance {
            return Err(Error::storage("write balance"));
        }
        self.inner.write_balance(unit, account_id, balance)
    }

    fn append_entry(&self, unit: &mut DuckDbUnit, entry: &LedgerEntry) -> Result<()> {
        if self.fail_at == FailAt::AppendEntry {
            return Err(Error::storage("append entry"));
        }
        self.inner.append_entry(unit, entry)
    }

    fn find_entry(&self, unit: &mut DuckDbUnit, transaction_id: &str) -> Result<Option<LedgerEntry>> {
        self.inner.find_entry(unit, transaction_id)
    }

    fn commit(&self, unit: DuckDbUnit) -> Result<()> {
        if self.fail_at == FailAt::Commit {
            self.inner.abort(unit)?;
            return Err(Error::storage("commit unit"));
        }
        self.inner.commit(unit)
    }

    fn abort(&self, unit: DuckDbUnit) -> Result<()> {
        self.inner.abort(unit)
    }

    fn list_entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        self.inner.list_entries(account_id)
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_alice_scenario_end_to_end() {
    let dir = wallet_dir();
    let ctx = WalletContext::new(dir.path()).unwrap();

    let alice = register(&ctx, "alice", "100.0");

    let after_purchase = ctx.purchase(&tx(alice, "t1", "30.0")).unwrap();
    assert_eq!(after_purchase.balance, dec("70"));

    let after_win = ctx.win(&tx(alice, "t2", "50.0")).unwrap();
    assert_eq!(after_win.balance, dec("120"));

    let err = ctx.purchase(&tx(alice, "t3", "200.0")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let login = ctx
        .login(&LoginRequest {
            username: "alice".to_string(),
            password: "pw123456".to_string(),
        })
        .unwrap();
    assert_eq!(login.player_id, alice);
    assert_eq!(login.balance, dec("120"));

    let history = ctx.history(&alice.to_string()).unwrap();
    let ids: Vec<_> = history.iter().map(|e| e.transaction_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[test]
fn test_state_survives_reopen() {
    let dir = wallet_dir();
    let alice = {
        let ctx = WalletContext::new(dir.path()).unwrap();
        let alice = register(&ctx, "alice", "10.50");
        ctx.win(&tx(alice, "w1", "0.25")).unwrap();
        alice
    };

    let ctx = WalletContext::new(dir.path()).unwrap();
    assert!(ctx.store.run_migrations().unwrap().applied.is_empty());

    let summary = ctx.account(&alice.to_string()).unwrap();
    assert_eq!(summary.balance, dec("10.75"));
    assert_eq!(ctx.history(&alice.to_string()).unwrap().len(), 1);
}

#[test]
fn test_reads_are_idempotent() {
    let dir = wallet_dir();
    let ctx = WalletContext::new(dir.path()).unwrap();
    let alice = register(&ctx, "alice", "5");
    ctx.purchase(&tx(alice, "p1", "1")).unwrap();

    let login = LoginRequest {
        username: "alice".to_string(),
        password: "pw123456".to_string(),
    };
    let first = ctx.login(&login).unwrap();
    let second = ctx.login(&login).unwrap();
    assert_eq!(first, second);

    let h1 = ctx.history(&alice.to_string()).unwrap();
    let h2 = ctx.history(&alice.to_string()).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(ctx.store.count_entries().unwrap(), 1);
}

#[test]
fn test_boundary_errors_render_as_envelopes() {
    let ctx = WalletContext::in_memory(test_config(DuplicatePolicy::Permissive)).unwrap();
    let alice = register(&ctx, "alice", "1");

    let malformed = TransactionRequest {
        player_id: "not-a-uuid".to_string(),
        transaction_id: "t1".to_string(),
        amount: dec("1"),
    };
    let err = ctx.purchase(&malformed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let unknown = ctx.win(&tx(Uuid::new_v4(), "t1", "1")).unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::NotFound);

    let envelope = OperationResult::from(ctx.purchase(&tx(alice, "t2", "2")));
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "insufficient_funds");

    let ok = OperationResult::from(ctx.win(&tx(alice, "t3", "2")));
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["player_id"], alice.to_string());
}

#[test]
fn test_registration_rules() {
    let ctx = WalletContext::in_memory(test_config(DuplicatePolicy::Permissive)).unwrap();
    register(&ctx, "alice", "1");

    let dup = ctx
        .register(&RegisterRequest {
            username: "alice".to_string(),
            password: "other".to_string(),
            name: "Someone".to_string(),
            balance: dec("1"),
        })
        .unwrap_err();
    assert_eq!(dup.kind(), ErrorKind::Conflict);

    let zero = ctx
        .register(&RegisterRequest {
            username: "bob".to_string(),
            password: "pw".to_string(),
            name: "Bob".to_string(),
            balance: Decimal::ZERO,
        })
        .unwrap_err();
    assert_eq!(zero.kind(), ErrorKind::InvalidInput);

    let wrong = ctx
        .login(&LoginRequest {
            username: "alice".to_string(),
            password: "wrong".to_string(),
        })
        .unwrap_err();
    assert_eq!(wrong, Error::InvalidCredentials);
}

// ============================================================================
// Boundary amounts
// ============================================================================

#[test]
fn test_largest_amounts_survive_storage() {
    let dir = wallet_dir();
    let login = LoginRequest {
        username: "alice".to_string(),
        password: "pw123456".to_string(),
    };
    let top_up = MAX_MONEY - Decimal::ONE;

    let alice = {
        let ctx = WalletContext::new(dir.path()).unwrap();
        let alice = register(&ctx, "alice", "1");
        assert_eq!(ctx.win(&tx(alice, "fill", &top_up.to_string())).unwrap().balance, MAX_MONEY);

        let over = ctx.win(&tx(alice, "over", "0.01")).unwrap_err();
        assert!(matches!(over, Error::InvalidAmount(_)));
        assert_eq!(ctx.login(&login).unwrap().balance, MAX_MONEY);
        alice
    };

    // Everything still decodes after a reopen
    let ctx = WalletContext::new(dir.path()).unwrap();
    assert_eq!(ctx.account(&alice.to_string()).unwrap().balance, MAX_MONEY);

    let history = ctx.history(&alice.to_string()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, top_up);

    let after = ctx.purchase(&tx(alice, "spend", "1")).unwrap();
    assert_eq!(after.balance, MAX_MONEY - Decimal::ONE);
    assert_eq!(ctx.login(&login).unwrap().balance, MAX_MONEY - Decimal::ONE);
}

#[test]
fn test_oversized_amounts_are_invalid_input() {
    let dir = wallet_dir();
    let ctx = WalletContext::new(dir.path()).unwrap();
    let alice = register(&ctx, "alice", "1");

    let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
    let err = ctx
        .win(&TransactionRequest::new(alice, "huge", huge))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    // The account is untouched and still readable
    assert_eq!(ctx.purchase(&tx(alice, "p1", "1")).unwrap().balance, Decimal::ZERO);
    assert_eq!(ctx.account(&alice.to_string()).unwrap().balance, Decimal::ZERO);

    let rejected = ctx
        .register(&RegisterRequest {
            username: "whale".to_string(),
            password: "pw".to_string(),
            name: "Whale".to_string(),
            balance: Decimal::MAX,
        })
        .unwrap_err();
    assert_eq!(rejected.kind(), ErrorKind::InvalidInput);

    let whale = ctx
        .register(&RegisterRequest {
            username: "whale".to_string(),
            password: "pw".to_string(),
            name: "Whale".to_string(),
            balance: MAX_MONEY,
        })
        .unwrap();
    assert_eq!(
        ctx.account(&whale.player_id.to_string()).unwrap().balance,
        MAX_MONEY
    );
}

// ============================================================================
// Atomicity
// ============================================================================

#[test]
fn test_failed_step_leaves_no_partial_state() {
    for fail_at in [FailAt::WriteBalance, FailAt::AppendEntry, FailAt::Commit] {
        let dir = TempDir::new().unwrap();
        let (inner, id) = seeded_store(&dir, "100");
        let engine = LedgerEngine::new(
            Arc::new(FaultyStore {
                inner: Arc::clone(&inner),
                fail_at,
            }),
            DuplicatePolicy::Permissive,
        );

        let err = engine.apply_debit(id, "t1", dec("30")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure, "{:?}", fail_at);
        assert!(err.is_retryable());

        // Inspect storage directly
        assert_eq!(inner.get_account(id).unwrap().unwrap().balance, dec("100"), "{:?}", fail_at);
        assert_eq!(inner.count_entries().unwrap(), 0, "{:?}", fail_at);

        // The row lock was released; a healthy engine can proceed
        let healthy = LedgerEngine::new(Arc::clone(&inner), DuplicatePolicy::Permissive);
        assert_eq!(healthy.apply_debit(id, "t1", dec("30")).unwrap(), dec("70"));
    }
}

#[test]
fn test_insufficient_funds_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (store, id) = seeded_store(&dir, "10");
    let engine = LedgerEngine::new(Arc::clone(&store), DuplicatePolicy::Permissive);

    let err = engine.apply_debit(id, "big", dec("10.01")).unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientFunds {
            balance: dec("10"),
            requested: dec("10.01"),
        }
    );
    assert_eq!(store.count_entries().unwrap(), 0);
    assert_eq!(store.get_account(id).unwrap().unwrap().balance, dec("10"));
}

// ============================================================================
// Duplicate transaction ids
// ============================================================================

#[test]
fn test_duplicate_ids_under_each_policy() {
    let dir = TempDir::new().unwrap();
    let (store, id) = seeded_store(&dir, "100");

    let permissive = LedgerEngine::new(Arc::clone(&store), DuplicatePolicy::Permissive);
    permissive.apply_credit(id, "w1", dec("10")).unwrap();
    let err = permissive.apply_credit(id, "w1", dec("10")).unwrap_err();
    assert_eq!(err, Error::DuplicateTransaction("w1".to_string()));
    assert_eq!(store.get_account(id).unwrap().unwrap().balance, dec("110"));

    let reject = LedgerEngine::new(Arc::clone(&store), DuplicatePolicy::Reject);
    let err = reject.apply_debit(id, "w1", dec("5")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let replay = LedgerEngine::new(Arc::clone(&store), DuplicatePolicy::Replay);
    assert_eq!(replay.apply_credit(id, "w1", dec("10")).unwrap(), dec("110"));
    assert!(replay.apply_debit(id, "w1", dec("10")).is_err());

    assert_eq!(store.count_entries().unwrap(), 1);
    assert_eq!(store.get_account(id).unwrap().unwrap().balance, dec("110"));
}

#[test]
fn test_conservation_over_mixed_sequence() {
    let dir = TempDir::new().unwrap();
    let (store, id) = seeded_store(&dir, "50");
    let engine = LedgerEngine::new(Arc::clone(&store), DuplicatePolicy::Permissive);

    let mut expected = dec("50");
    for i in 0..20 {
        let amount = Decimal::new(i * 37 + 1, 2);
        if i % 3 == 0 {
            engine.apply_debit(id, &format!("d{}", i), amount).unwrap();
            expected -= amount;
        } else {
            engine.apply_credit(id, &format!("c{}", i), amount).unwrap();
            expected += amount;
        }
    }

    assert_eq!(store.get_account(id).unwrap().unwrap().balance, expected);
    assert_eq!(store.list_entries(id).unwrap().len(), 20);
}
