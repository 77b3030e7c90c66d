//! Tests for the payment allocation engine

use rust_decimal_macros::dec;

use domain_levy::{allocate, BillStatus, LevyError, PaymentMethod};
use test_utils::{
    assert_conserves_funds, assert_matches_scenario, assert_postings_within_due, assert_statuses,
    AllocationRequestBuilder, PeriodFixtures, ScenarioFixtures, RECORDED_AT,
};

// ============================================================================
// Literal scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_exact_payment_for_two_months() {
        let scenario = ScenarioFixtures::exact_two_months();
        let request = AllocationRequestBuilder::from_scenario(&scenario).build();
        assert_matches_scenario(&allocate(&request), &scenario);
    }

    #[test]
    fn test_shortfall_leaves_second_month_partial() {
        let scenario = ScenarioFixtures::partial_second_month();
        let request = AllocationRequestBuilder::from_scenario(&scenario).build();
        assert_matches_scenario(&allocate(&request), &scenario);
    }

    #[test]
    fn test_surplus_with_existing_credit_carries_forward() {
        let scenario = ScenarioFixtures::credit_carry_forward();
        let request = AllocationRequestBuilder::from_scenario(&scenario).build();
        assert_matches_scenario(&allocate(&request), &scenario);
    }

    #[test]
    fn test_all_scenarios_verify() {
        for scenario in ScenarioFixtures::all() {
            let request = AllocationRequestBuilder::from_scenario(&scenario).build();
            let result = allocate(&request);
            assert!(result.verify(&request).is_ok(), "{} failed verification", scenario.name);
            assert_conserves_funds(&request, &result);
        }
    }
}

// ============================================================================
// Boundaries
// ============================================================================

mod boundaries {
    use super::*;

    #[test]
    fn test_zero_due_marks_every_period_paid_and_keeps_pool() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(800))
            .credit(dec!(200))
            .due(dec!(0))
            .months(&["2026-02", "2026-03", "2026-04"])
            .build();
        let result = allocate(&request);

        assert_statuses(&result, &[BillStatus::Paid; 3]);
        assert!(result.postings.iter().all(|p| p.amount_paid == dec!(0)));
        assert_eq!(result.new_credit_balance.amount(), dec!(1000));
    }

    #[test]
    fn test_no_periods_moves_everything_to_credit() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(4000))
            .credit(dec!(1000))
            .periods(Vec::new())
            .build();
        let result = allocate(&request);

        assert_eq!(result.bills_created(), 0);
        assert_eq!(result.new_credit_balance.amount(), dec!(5000));
    }

    #[test]
    fn test_nothing_received_and_no_credit_posts_nothing() {
        let request = AllocationRequestBuilder::new()
            .months(&["2026-02", "2026-03"])
            .build();
        let result = allocate(&request);

        assert!(result.postings.is_empty());
        assert!(result.new_credit_balance.is_zero());
    }

    #[test]
    fn test_credit_alone_settles_a_month() {
        let request = AllocationRequestBuilder::new()
            .credit(dec!(5000))
            .months(&["2026-02"])
            .build();
        let result = allocate(&request);

        assert_statuses(&result, &[BillStatus::Paid]);
        assert_eq!(result.postings[0].credit_applied, dec!(5000));
        assert_eq!(result.postings[0].cash_portion(), dec!(0));
    }

    /// The pool shrinks by the full amount due even when a period is only
    /// partly funded, so a small payment over many months posts one row.
    #[test]
    fn test_underfunded_month_consumes_a_full_period() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(1000))
            .periods(PeriodFixtures::year_from_feb_2026())
            .build();
        let result = allocate(&request);

        assert_eq!(result.bills_created(), 1);
        assert_statuses(&result, &[BillStatus::Partial]);
        assert_eq!(result.postings[0].amount_paid, dec!(1000));
        assert!(result.new_credit_balance.is_zero());
    }

    #[test]
    fn test_fractional_amounts() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(5250.75))
            .due(dec!(2500.50))
            .months(&["2026-02", "2026-03", "2026-04"])
            .build();
        let result = allocate(&request);

        assert_statuses(&result, &[BillStatus::Paid, BillStatus::Paid, BillStatus::Partial]);
        assert_eq!(result.postings[2].amount_paid, dec!(249.75));
        assert_conserves_funds(&request, &result);
    }
}

// ============================================================================
// Posting details
// ============================================================================

mod postings {
    use super::*;

    #[test]
    fn test_context_copied_onto_postings() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(10000))
            .months(&["2026-02", "2026-03"])
            .method(PaymentMethod::Pos)
            .notes("Paid at gate office")
            .build();
        let result = allocate(&request);

        for posting in &result.postings {
            assert_eq!(posting.payment_method, PaymentMethod::Pos);
            assert_eq!(posting.notes, "Paid at gate office");
            assert_eq!(posting.recorded_by, "estate-admin");
            assert_eq!(posting.paid_at, Some(*RECORDED_AT));
            assert_eq!(posting.months_covered, 1);
        }
    }

    #[test]
    fn test_credit_applied_attributed_to_each_posting() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(2000))
            .credit(dec!(8000))
            .months(&["2026-02", "2026-03"])
            .build();
        let result = allocate(&request);

        assert_eq!(result.postings[0].credit_applied, dec!(5000));
        assert_eq!(result.postings[1].credit_applied, dec!(5000));
        assert_postings_within_due(&result);
    }

    #[test]
    fn test_postings_follow_request_order() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(15000))
            .months(&["2026-02", "2026-05", "2026-09"])
            .build();
        let periods: Vec<String> = allocate(&request).periods().iter().map(|p| p.to_string()).collect();
        assert_eq!(periods, vec!["2026-02", "2026-05", "2026-09"]);
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation {
    use super::*;

    #[test]
    fn test_negative_credit_rejected() {
        let request = AllocationRequestBuilder::new().credit(dec!(-0.01)).build();
        assert!(matches!(request.validate(), Err(LevyError::Money(_))));
    }

    #[test]
    fn test_negative_due_rejected() {
        let request = AllocationRequestBuilder::new().due(dec!(-5000)).build();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_well_formed_request_accepted() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(5000))
            .months(&["2026-02", "2026-03"])
            .build();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_verify_detects_tampered_result() {
        let request = AllocationRequestBuilder::new()
            .received(dec!(5000))
            .months(&["2026-02"])
            .build();
        let mut result = allocate(&request);
        result.postings[0].amount_paid = dec!(4000);

        assert!(matches!(result.verify(&request), Err(LevyError::InvariantViolation(_))));
    }
}
