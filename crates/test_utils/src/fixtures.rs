//! Pre-built Test Fixtures
//!
//! Fixed periods, timestamps and the literal payment scenarios the engine is
//! pinned against. Fixtures are deterministic except for resident names,
//! which come from `fake`.

use chrono::{DateTime, TimeZone, Utc};
use fake::faker::address::en::BuildingNumber;
use fake::faker::name::en::Name;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillingPeriod, ResidentId};
use domain_levy::{BillStatus, CreditBalance, LevyAccount};

/// Recording timestamp used across fixtures
pub static RECORDED_AT: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2026, 2, 3, 10, 30, 0).unwrap());

/// Fixture for billing periods
pub struct PeriodFixtures;

impl PeriodFixtures {
    /// Parses a `YYYY-MM` literal
    pub fn period(s: &str) -> BillingPeriod {
        s.parse().unwrap()
    }

    /// Parses a list of `YYYY-MM` literals
    pub fn periods(list: &[&str]) -> Vec<BillingPeriod> {
        list.iter().map(|s| Self::period(s)).collect()
    }

    pub fn feb_2026() -> BillingPeriod {
        Self::period("2026-02")
    }

    pub fn mar_2026() -> BillingPeriod {
        Self::period("2026-03")
    }

    /// Twelve consecutive months starting February 2026
    pub fn year_from_feb_2026() -> Vec<BillingPeriod> {
        BillingPeriod::range(Self::feb_2026(), 12)
    }
}

/// Fixture for levy accounts
pub struct AccountFixtures;

impl AccountFixtures {
    /// Standard monthly levy in the fixtures
    pub fn monthly_levy() -> Decimal {
        dec!(5000)
    }

    /// An account with a random name and no credit
    pub fn resident() -> LevyAccount {
        Self::resident_with_credit(Decimal::ZERO)
    }

    /// An account with a random name and the given credit
    pub fn resident_with_credit(credit: Decimal) -> LevyAccount {
        let name: String = Name().fake();
        let unit: String = BuildingNumber().fake();
        LevyAccount::new(ResidentId::new(), name, Self::monthly_levy())
            .unwrap()
            .with_unit(format!("Flat {}", unit))
            .with_credit(CreditBalance::new(credit).unwrap())
    }
}

/// One expected posting in a literal scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPosting {
    pub period: &'static str,
    pub amount_paid: Decimal,
    pub credit_applied: Decimal,
    pub status: BillStatus,
}

/// A literal allocation scenario with its expected outcome
#[derive(Debug, Clone)]
pub struct AllocationScenario {
    pub name: &'static str,
    pub amount_received: Decimal,
    pub current_credit: Decimal,
    pub amount_due: Decimal,
    pub months: &'static [&'static str],
    pub expected: Vec<ExpectedPosting>,
    pub expected_credit: Decimal,
}

/// The literal allocation scenarios
pub struct ScenarioFixtures;

impl ScenarioFixtures {
    /// 10000 over two 5000 months: both paid, no credit
    pub fn exact_two_months() -> AllocationScenario {
        AllocationScenario {
            name: "exact two months",
            amount_received: dec!(10000),
            current_credit: dec!(0),
            amount_due: dec!(5000),
            months: &["2026-02", "2026-03"],
            expected: vec![
                ExpectedPosting {
                    period: "2026-02",
                    amount_paid: dec!(5000),
                    credit_applied: dec!(0),
                    status: BillStatus::Paid,
                },
                ExpectedPosting {
                    period: "2026-03",
                    amount_paid: dec!(5000),
                    credit_applied: dec!(0),
                    status: BillStatus::Paid,
                },
            ],
            expected_credit: dec!(0),
        }
    }

    /// 7000 over two 5000 months: second is partial, no credit
    pub fn partial_second_month() -> AllocationScenario {
        AllocationScenario {
            name: "partial second month",
            amount_received: dec!(7000),
            current_credit: dec!(0),
            amount_due: dec!(5000),
            months: &["2026-02", "2026-03"],
            expected: vec![
                ExpectedPosting {
                    period: "2026-02",
                    amount_paid: dec!(5000),
                    credit_applied: dec!(0),
                    status: BillStatus::Paid,
                },
                ExpectedPosting {
                    period: "2026-03",
                    amount_paid: dec!(2000),
                    credit_applied: dec!(0),
                    status: BillStatus::Partial,
                },
            ],
            expected_credit: dec!(0),
        }
    }

    /// 12000 plus 3000 credit over one 5000 month: 10000 carried forward
    pub fn credit_carry_forward() -> AllocationScenario {
        AllocationScenario {
            name: "credit carry forward",
            amount_received: dec!(12000),
            current_credit: dec!(3000),
            amount_due: dec!(5000),
            months: &["2026-02"],
            expected: vec![ExpectedPosting {
                period: "2026-02",
                amount_paid: dec!(5000),
                credit_applied: dec!(3000),
                status: BillStatus::Paid,
            }],
            expected_credit: dec!(10000),
        }
    }

    pub fn all() -> Vec<AllocationScenario> {
        vec![
            Self::exact_two_months(),
            Self::partial_second_month(),
            Self::credit_carry_forward(),
        ]
    }
}
