//! Test Data Builders
//!
//! Builders with sensible defaults so tests only spell out the fields they
//! care about.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BillingPeriod, ResidentId};
use domain_levy::{
    AllocationRequest, LevyAccount, PaymentMethod, PostingContext, RecordPaymentCommand,
};

use crate::fixtures::{AllocationScenario, PeriodFixtures, RECORDED_AT};

/// Builder for allocation requests
pub struct AllocationRequestBuilder {
    resident_id: ResidentId,
    amount_received: Decimal,
    current_credit: Decimal,
    amount_due: Decimal,
    periods: Vec<BillingPeriod>,
    method: PaymentMethod,
    notes: String,
}

impl Default for AllocationRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationRequestBuilder {
    pub fn new() -> Self {
        Self {
            resident_id: ResidentId::new(),
            amount_received: dec!(0),
            current_credit: dec!(0),
            amount_due: dec!(5000),
            periods: vec![PeriodFixtures::feb_2026()],
            method: PaymentMethod::Transfer,
            notes: String::new(),
        }
    }

    /// Starts from a literal scenario
    pub fn from_scenario(scenario: &AllocationScenario) -> Self {
        Self::new()
            .received(scenario.amount_received)
            .credit(scenario.current_credit)
            .due(scenario.amount_due)
            .months(scenario.months)
    }

    pub fn resident(mut self, id: ResidentId) -> Self {
        self.resident_id = id;
        self
    }

    pub fn received(mut self, amount: Decimal) -> Self {
        self.amount_received = amount;
        self
    }

    pub fn credit(mut self, amount: Decimal) -> Self {
        self.current_credit = amount;
        self
    }

    pub fn due(mut self, amount: Decimal) -> Self {
        self.amount_due = amount;
        self
    }

    pub fn months(mut self, months: &[&str]) -> Self {
        self.periods = PeriodFixtures::periods(months);
        self
    }

    pub fn periods(mut self, periods: Vec<BillingPeriod>) -> Self {
        self.periods = periods;
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn build(self) -> AllocationRequest {
        let context = PostingContext::new(self.resident_id, "estate-admin")
            .with_method(self.method)
            .with_notes(self.notes)
            .recorded_at(*RECORDED_AT);
        AllocationRequest::new(
            self.amount_received,
            self.current_credit,
            self.amount_due,
            self.periods,
            context,
        )
    }
}

/// Builder for payment commands against an existing account
pub struct PaymentCommandBuilder {
    command: RecordPaymentCommand,
}

impl PaymentCommandBuilder {
    /// A command for one month at the account's levy, using the stored credit
    pub fn for_account(account: &LevyAccount) -> Self {
        Self {
            command: RecordPaymentCommand {
                resident_id: account.resident_id,
                amount_received: account.amount_due_per_period,
                months_to_mark: vec![PeriodFixtures::feb_2026()],
                amount_due_per_month: account.amount_due_per_period,
                current_credit: Some(account.credit_balance.amount()),
                notes: String::new(),
                recorded_by: "estate-admin".to_string(),
                payment_method: PaymentMethod::Transfer,
            },
        }
    }

    pub fn received(mut self, amount: Decimal) -> Self {
        self.command.amount_received = amount;
        self
    }

    pub fn due(mut self, amount: Decimal) -> Self {
        self.command.amount_due_per_month = amount;
        self
    }

    pub fn months(mut self, months: &[&str]) -> Self {
        self.command.months_to_mark = PeriodFixtures::periods(months);
        self
    }

    pub fn credit_snapshot(mut self, credit: Option<Decimal>) -> Self {
        self.command.current_credit = credit;
        self
    }

    pub fn recorded_by(mut self, who: impl Into<String>) -> Self {
        self.command.recorded_by = who.into();
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.command.payment_method = method;
        self
    }

    pub fn build(self) -> RecordPaymentCommand {
        self.command
    }
}
