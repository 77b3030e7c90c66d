//! PostgreSQL levy store tests
//!
//! These start a PostgreSQL container and need Docker:
//! `cargo test -p infra_db -- --ignored`

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{HealthCheckable, PortError};
use domain_levy::{
    allocate, AllocationCommit, BillLedgerPort, BillStatus, CreditBalance, LevyAccountPort,
    LevyStore, PaymentService, RetryPolicy,
};
use infra_db::PostgresLevyStore;
use test_utils::{
    AccountFixtures, AllocationRequestBuilder, PaymentCommandBuilder,
    PeriodFixtures, TestDatabase,
};

/// Each test owns its container; a pool must not outlive the runtime it was created on
async fn store_with_resident(
    credit: rust_decimal::Decimal,
) -> (TestDatabase, PostgresLevyStore, domain_levy::LevyAccount) {
    let db = TestDatabase::new().await.unwrap();
    let store = PostgresLevyStore::new(db.pool().clone());
    let account = AccountFixtures::resident_with_credit(credit);
    store.insert_account(&account).await.unwrap();
    (db, store, account)
}

#[tokio::test]
#[ignore]
async fn test_account_round_trip() {
    let (_db, store, account) = store_with_resident(dec!(1250.50)).await;

    let loaded = store.get_account(account.resident_id, None).await.unwrap();
    assert_eq!(loaded.full_name, account.full_name);
    assert_eq!(loaded.credit_balance.amount(), dec!(1250.50));
    assert_eq!(loaded.amount_due_per_period, dec!(5000));
}

#[tokio::test]
#[ignore]
async fn test_upsert_replaces_existing_month() {
    let (_db, store, account) = store_with_resident(dec!(0)).await;

    let partial = allocate(
        &AllocationRequestBuilder::new()
            .resident(account.resident_id)
            .received(dec!(2000))
            .build(),
    );
    store.upsert_postings(&partial.postings, None).await.unwrap();

    let full = allocate(
        &AllocationRequestBuilder::new()
            .resident(account.resident_id)
            .received(dec!(5000))
            .build(),
    );
    store.upsert_postings(&full.postings, None).await.unwrap();

    let history = store.postings_for_resident(account.resident_id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BillStatus::Paid);
    assert_eq!(history[0].amount_paid, dec!(5000));
}

#[tokio::test]
#[ignore]
async fn test_commit_is_conditional_on_previous_balance() {
    let (_db, store, account) = store_with_resident(dec!(300)).await;

    let result = allocate(
        &AllocationRequestBuilder::new()
            .resident(account.resident_id)
            .received(dec!(5000))
            .build(),
    );
    let commit = AllocationCommit {
        resident_id: account.resident_id,
        previous_credit: CreditBalance::zero(),
        new_credit: result.new_credit_balance,
        postings: result.postings,
    };

    let err = store.commit_allocation(&commit, None).await.unwrap_err();
    assert!(err.is_conflict());

    // Nothing from the rejected commit may be visible
    assert!(store
        .postings_for_resident(account.resident_id, None)
        .await
        .unwrap()
        .is_empty());
    let stored = store.get_account(account.resident_id, None).await.unwrap();
    assert_eq!(stored.credit_balance.amount(), dec!(300));
}

#[tokio::test]
#[ignore]
async fn test_negative_credit_rejected() {
    let (_db, store, account) = store_with_resident(dec!(0)).await;
    let err = store
        .set_credit_balance(account.resident_id, dec!(-10), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Validation { .. }));
}

#[tokio::test]
#[ignore]
async fn test_history_latest_first() {
    let (_db, store, account) = store_with_resident(dec!(0)).await;
    let result = allocate(
        &AllocationRequestBuilder::new()
            .resident(account.resident_id)
            .received(dec!(15000))
            .months(&["2026-01", "2026-02", "2026-03"])
            .build(),
    );
    store.upsert_postings(&result.postings, None).await.unwrap();

    let history = store.postings_for_resident(account.resident_id, None).await.unwrap();
    let periods: Vec<String> = history.iter().map(|p| p.period.to_string()).collect();
    assert_eq!(periods, vec!["2026-03", "2026-02", "2026-01"]);
}

#[tokio::test]
#[ignore]
async fn test_service_over_postgres() {
    let (_db, store, account) = store_with_resident(dec!(3000)).await;
    let service = PaymentService::new(Arc::new(store.clone())).with_retry_policy(RetryPolicy::none());

    let command = PaymentCommandBuilder::for_account(&account)
        .received(dec!(12000))
        .build();
    let outcome = service.record_payment(command).await.unwrap();
    assert_eq!(outcome.new_credit_balance.amount(), dec!(10000));

    let next = service
        .next_due(account.resident_id, Some(PeriodFixtures::feb_2026()))
        .await
        .unwrap();
    assert_eq!(next.target_period, PeriodFixtures::mar_2026());
    assert!(next.covered_by_credit);
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let (_db, store, _account) = store_with_resident(dec!(0)).await;
    assert!(store.health_check().await.is_healthy());
}
