//! Property-Based Test Generators
//!
//! Proptest strategies producing inputs inside the allocation engine's
//! domain: non-negative amounts and strictly ascending periods.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{BillingPeriod, ResidentId};
use domain_levy::{AllocationRequest, PostingContext};

use crate::fixtures::RECORDED_AT;

/// Non-negative amounts with up to two decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000i64, 0u32..=2u32).prop_map(|(m, s)| Decimal::new(m, s))
}

/// Levy amounts, zero included
pub fn due_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        1 => Just(Decimal::ZERO),
        9 => (1i64..100_000i64).prop_map(|n| Decimal::new(n, 1)),
    ]
}

/// Any valid billing period
pub fn period_strategy() -> impl Strategy<Value = BillingPeriod> {
    (2000i32..2100i32, 1u32..=12u32).prop_map(|(y, m)| BillingPeriod::new(y, m).unwrap())
}

/// Up to `max` strictly ascending periods, possibly with gaps
pub fn ascending_periods_strategy(max: usize) -> impl Strategy<Value = Vec<BillingPeriod>> {
    (period_strategy(), prop::collection::vec(1u32..4u32, 0..=max)).prop_map(|(start, gaps)| {
        let mut out = Vec::with_capacity(gaps.len());
        let mut next = start;
        for gap in gaps {
            out.push(next);
            for _ in 0..gap {
                next = next.succ();
            }
        }
        out
    })
}

/// A full allocation request inside the engine's domain
pub fn allocation_request_strategy() -> impl Strategy<Value = AllocationRequest> {
    (
        amount_strategy(),
        amount_strategy(),
        due_strategy(),
        ascending_periods_strategy(12),
    )
        .prop_map(|(received, credit, due, periods)| {
            let context = PostingContext::new(ResidentId::new(), "estate-admin")
                .recorded_at(*RECORDED_AT);
            AllocationRequest::new(received, credit, due, periods, context)
        })
}
