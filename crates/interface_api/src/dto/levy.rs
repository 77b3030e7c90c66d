//! Levy DTOs
//!
//! Amounts are accepted as JSON numbers or strings and returned as strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{format_amount, BillingPeriod, Currency, ResidentId};
use domain_levy::{
    AllocationPreview, BillPosting, CollectionSummary, NextDue, PaymentMethod, PaymentOutcome,
    PaymentReceipt, PreviewRequest, RecordPaymentCommand,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub resident_id: ResidentId,
    pub amount_received: Decimal,
    #[validate(length(min = 1, message = "select at least one month"))]
    pub months_to_mark: Vec<BillingPeriod>,
    pub amount_due_per_month: Decimal,
    /// Credit balance the caller saw; omitted means the stored balance
    #[serde(default)]
    pub current_credit: Option<Decimal>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: String,
    #[validate(length(min = 1, max = 100, message = "recordedBy is required"))]
    pub recorded_by: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl From<RecordPaymentRequest> for RecordPaymentCommand {
    fn from(request: RecordPaymentRequest) -> Self {
        RecordPaymentCommand {
            resident_id: request.resident_id,
            amount_received: request.amount_received,
            months_to_mark: request.months_to_mark,
            amount_due_per_month: request.amount_due_per_month,
            current_credit: request.current_credit,
            notes: request.notes,
            recorded_by: request.recorded_by,
            payment_method: request.payment_method,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPaymentRequest {
    pub amount_received: Decimal,
    #[serde(default)]
    pub current_credit: Decimal,
    pub amount_due_per_month: Decimal,
    pub start_month: BillingPeriod,
    #[validate(range(min = 1, max = 12, message = "monthsCount must be between 1 and 12"))]
    pub months_count: u32,
}

impl From<PreviewPaymentRequest> for PreviewRequest {
    fn from(request: PreviewPaymentRequest) -> Self {
        PreviewRequest {
            amount_received: request.amount_received,
            current_credit: request.current_credit,
            amount_due_per_month: request.amount_due_per_month,
            start_month: request.start_month,
            months_count: request.months_count,
        }
    }
}

/// `?period=YYYY-MM`
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<BillingPeriod>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    #[serde(flatten)]
    pub receipt: PaymentReceipt,
    pub amount_received_display: String,
    pub new_credit_balance_display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub new_credit_balance: Decimal,
    pub bills_created: usize,
    pub receipt: ReceiptResponse,
}

impl PaymentResponse {
    pub fn new(outcome: PaymentOutcome, currency: Currency) -> Self {
        let receipt = ReceiptResponse {
            amount_received_display: format_amount(outcome.receipt.amount_received, currency),
            new_credit_balance_display: format_amount(
                outcome.receipt.new_credit_balance.amount(),
                currency,
            ),
            receipt: outcome.receipt,
        };
        Self {
            new_credit_balance: outcome.new_credit_balance.amount(),
            bills_created: outcome.bills_created,
            receipt,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub preview: AllocationPreview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_surplus_display: Option<String>,
}

impl PreviewResponse {
    pub fn new(preview: AllocationPreview, currency: Currency) -> Self {
        Self {
            projected_surplus_display: preview
                .projected_surplus
                .map(|surplus| format_amount(surplus, currency)),
            preview,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    #[serde(flatten)]
    pub posting: BillPosting,
    /// e.g. `February 2026`
    pub period_label: String,
}

impl From<BillPosting> for BillResponse {
    fn from(posting: BillPosting) -> Self {
        Self {
            period_label: posting.period.label(),
            posting,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDueResponse {
    #[serde(flatten)]
    pub next_due: NextDue,
    pub target_label: String,
    pub amount_owed_display: String,
}

impl NextDueResponse {
    pub fn new(next_due: NextDue, currency: Currency) -> Self {
        Self {
            target_label: next_due.target_period.label(),
            amount_owed_display: format_amount(next_due.amount_owed, currency),
            next_due,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: CollectionSummary,
    pub total_collected_display: String,
}

impl SummaryResponse {
    pub fn new(summary: CollectionSummary, currency: Currency) -> Self {
        Self {
            total_collected_display: format_amount(summary.total_collected, currency),
            summary,
        }
    }
}
