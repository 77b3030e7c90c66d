//! Custom Test Assertions
//!
//! Allocation checks that report the offending posting instead of a bare
//! boolean failure.

use rust_decimal::Decimal;

use domain_levy::{AllocationRequest, AllocationResult, BillStatus};

use crate::fixtures::AllocationScenario;

/// Asserts `sum(amount_paid) + new_credit == received + credit`
pub fn assert_conserves_funds(request: &AllocationRequest, result: &AllocationResult) {
    let applied = result.total_applied();
    let credit = result.new_credit_balance.amount();
    let pool = request.pool().expect("pool within storable range");
    assert_eq!(
        applied + credit,
        pool,
        "Funds not conserved: applied={}, credit={}, pool={}",
        applied,
        credit,
        pool
    );
}

/// Asserts every posting stays within its amount due
pub fn assert_postings_within_due(result: &AllocationResult) {
    for posting in &result.postings {
        assert!(
            posting.amount_paid <= posting.amount_due,
            "{}: paid {} exceeds due {}",
            posting.period,
            posting.amount_paid,
            posting.amount_due
        );
        assert!(
            posting.credit_applied <= posting.amount_due,
            "{}: credit applied {} exceeds due {}",
            posting.period,
            posting.credit_applied,
            posting.amount_due
        );
        assert!(
            posting.amount_paid >= Decimal::ZERO && posting.credit_applied >= Decimal::ZERO,
            "{}: negative amount in posting",
            posting.period
        );
    }
}

/// Asserts the statuses of the postings, in order
pub fn assert_statuses(result: &AllocationResult, expected: &[BillStatus]) {
    let actual: Vec<BillStatus> = result.postings.iter().map(|p| p.status).collect();
    assert_eq!(actual, expected, "Unexpected posting statuses");
}

/// Asserts a result matches a literal scenario exactly
pub fn assert_matches_scenario(result: &AllocationResult, scenario: &AllocationScenario) {
    assert_eq!(
        result.postings.len(),
        scenario.expected.len(),
        "{}: expected {} postings, got {}",
        scenario.name,
        scenario.expected.len(),
        result.postings.len()
    );

    for (posting, expected) in result.postings.iter().zip(&scenario.expected) {
        assert_eq!(posting.period.to_string(), expected.period, "{}: period", scenario.name);
        assert_eq!(posting.amount_due, scenario.amount_due, "{}: {} amount due", scenario.name, expected.period);
        assert_eq!(posting.amount_paid, expected.amount_paid, "{}: {} amount paid", scenario.name, expected.period);
        assert_eq!(
            posting.credit_applied, expected.credit_applied,
            "{}: {} credit applied",
            scenario.name, expected.period
        );
        assert_eq!(posting.status, expected.status, "{}: {} status", scenario.name, expected.period);
    }

    assert_eq!(
        result.new_credit_balance.amount(),
        scenario.expected_credit,
        "{}: new credit balance",
        scenario.name
    );
}
