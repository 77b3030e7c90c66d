//! HTTP tests over the in-memory levy store

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use domain_levy::{InMemoryLevyStore, LevyAccount, PaymentService, RetryPolicy};
use interface_api::{config::ApiConfig, create_router};
use test_utils::AccountFixtures;

struct Harness {
    server: TestServer,
    store: InMemoryLevyStore,
    account: LevyAccount,
}

async fn harness(credit: Decimal) -> Harness {
    let account = AccountFixtures::resident_with_credit(credit);
    let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;
    let service = PaymentService::new(Arc::new(store.clone()))
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)));
    let server = TestServer::new(create_router(Arc::new(service), ApiConfig::default())).unwrap();
    Harness { server, store, account }
}

fn amount(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .unwrap()
}

fn payment_body(account: &LevyAccount, received: &str, months: &[&str]) -> Value {
    json!({
        "residentId": account.resident_id,
        "amountReceived": received,
        "monthsToMark": months,
        "amountDuePerMonth": "5000",
        "notes": "paid at the gate",
        "recordedBy": "estate-admin",
        "paymentMethod": "Transfer"
    })
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let h = harness(dec!(0)).await;
        let response = h.server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_store() {
        let h = harness(dec!(0)).await;
        let response = h.server.get("/health/ready").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["store"]["status"], "healthy");
    }
}

mod payments {
    use super::*;

    #[tokio::test]
    async fn test_exact_two_months() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "10000", &["2026-02", "2026-03"]))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["billsCreated"], 2);
        assert_eq!(amount(&body["newCreditBalance"]), dec!(0));
        assert_eq!(body["receipt"]["monthsCovered"], json!(["2026-02", "2026-03"]));
        assert_eq!(body["receipt"]["recordedBy"], "estate-admin");
    }

    #[tokio::test]
    async fn test_partial_second_month_is_listed_in_history() {
        let h = harness(dec!(0)).await;
        h.server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "7000", &["2026-02", "2026-03"]))
            .await;

        let response = h
            .server
            .get(&format!("/api/v1/residents/{}/bills", h.account.resident_id.as_uuid()))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let bills = response.json::<Value>();
        let bills = bills.as_array().unwrap();
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0]["period"], "2026-03");
        assert_eq!(bills[0]["status"], "partial");
        assert_eq!(amount(&bills[0]["amountPaid"]), dec!(2000));
        assert_eq!(bills[0]["periodLabel"], "March 2026");
        assert_eq!(bills[1]["status"], "paid");
    }

    #[tokio::test]
    async fn test_surplus_becomes_credit() {
        let h = harness(dec!(3000)).await;
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "12000", &["2026-02"]))
            .await;

        let body = response.json::<Value>();
        assert_eq!(amount(&body["newCreditBalance"]), dec!(10000));
        assert_eq!(body["billsCreated"], 1);
    }

    #[tokio::test]
    async fn test_numeric_amounts_accepted() {
        let h = harness(dec!(0)).await;
        let mut body = payment_body(&h.account, "5000", &["2026-02"]);
        body["amountReceived"] = json!(5000);
        body["amountDuePerMonth"] = json!(5000);

        let response = h.server.post("/api/v1/payments").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_empty_months_rejected() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "5000", &[]))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
        assert_eq!(h.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "-1", &["2026-02"]))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(h.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_unstorable_amounts_rejected() {
        let h = harness(dec!(0)).await;

        for received in ["100.005", "79228162514264337593543950335"] {
            let response = h
                .server
                .post("/api/v1/payments")
                .json(&payment_body(&h.account, received, &["2026-02"]))
                .await;

            assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY, "{}", received);
            assert_eq!(response.json::<Value>()["error"], "validation_error");
        }
        assert_eq!(h.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_month_is_bad_request() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "5000", &["2026-13"]))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_unknown_resident_is_not_found() {
        let h = harness(dec!(0)).await;
        let stranger = AccountFixtures::resident();
        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&stranger, "5000", &["2026-02"]))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_credit_is_conflict() {
        let h = harness(dec!(3000)).await;
        let mut body = payment_body(&h.account, "5000", &["2026-02"]);
        body["currentCredit"] = json!("0");

        let response = h.server.post("/api/v1/payments").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "stale_credit_balance");
        assert_eq!(h.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_outage_is_unavailable() {
        let h = harness(dec!(0)).await;
        h.store.fail_next_commits(5);

        let response = h
            .server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "5000", &["2026-02"]))
            .await;

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "service_unavailable");
        assert!(body["message"].as_str().unwrap().contains("2 attempt(s)"));
    }
}

mod preview {
    use super::*;

    #[tokio::test]
    async fn test_preview_lines_and_surplus() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments/preview")
            .json(&json!({
                "amountReceived": "12000",
                "currentCredit": "0",
                "amountDuePerMonth": "5000",
                "startMonth": "2026-02",
                "monthsCount": 3
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        let lines = body["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], "paid");
        assert_eq!(lines[2]["status"], "partial");
        assert_eq!(amount(&lines[2]["projectedAmount"]), dec!(2000));
        assert!(body.get("projectedSurplus").map_or(true, Value::is_null));
        assert_eq!(h.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_rejects_oversized_due() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments/preview")
            .json(&json!({
                "amountReceived": "5000",
                "amountDuePerMonth": "79228162514264337593543950335",
                "startMonth": "2026-02",
                "monthsCount": 12
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_preview_rejects_more_than_twelve_months() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .post("/api/v1/payments/preview")
            .json(&json!({
                "amountReceived": "5000",
                "amountDuePerMonth": "5000",
                "startMonth": "2026-02",
                "monthsCount": 13
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod next_due {
    use super::*;

    #[tokio::test]
    async fn test_credit_covers_next_month() {
        let h = harness(dec!(3000)).await;
        h.server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "12000", &["2026-02"]))
            .await;

        let response = h
            .server
            .get(&format!(
                "/api/v1/residents/{}/next-due?period=2026-02",
                h.account.resident_id.as_uuid()
            ))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["targetPeriod"], "2026-03");
        assert_eq!(amount(&body["amountOwed"]), dec!(0));
        assert_eq!(body["coveredByCredit"], true);
        assert_eq!(body["targetLabel"], "March 2026");
    }

    #[tokio::test]
    async fn test_prefixed_resident_id_accepted() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .get(&format!(
                "/api/v1/residents/{}/next-due?period=2026-04",
                h.account.resident_id
            ))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["targetPeriod"], "2026-04");
        assert_eq!(amount(&body["amountOwed"]), dec!(5000));
    }

    #[tokio::test]
    async fn test_invalid_period_is_bad_request() {
        let h = harness(dec!(0)).await;
        let response = h
            .server
            .get(&format!(
                "/api/v1/residents/{}/next-due?period=April",
                h.account.resident_id.as_uuid()
            ))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_resident_id_is_bad_request() {
        let h = harness(dec!(0)).await;
        let response = h.server.get("/api/v1/residents/not-a-uuid/next-due").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}

mod summary {
    use super::*;

    #[tokio::test]
    async fn test_summary_counts_statuses() {
        let h = harness(dec!(0)).await;
        let other = AccountFixtures::resident();
        h.store.insert_account(other.clone()).await;

        h.server
            .post("/api/v1/payments")
            .json(&payment_body(&h.account, "5000", &["2026-02"]))
            .await;
        h.server
            .post("/api/v1/payments")
            .json(&payment_body(&other, "1500", &["2026-02"]))
            .await;

        let response = h.server.get("/api/v1/summary?period=2026-02").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<Value>();
        assert_eq!(body["period"], "2026-02");
        assert_eq!(body["totalResidents"], 2);
        assert_eq!(body["paid"], 1);
        assert_eq!(body["partial"], 1);
        assert_eq!(body["unpaid"], 0);
        assert_eq!(amount(&body["totalCollected"]), dec!(6500));
    }
}
