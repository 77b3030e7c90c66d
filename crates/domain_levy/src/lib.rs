//! Levy Domain - Billing & Credit Allocation
//!
//! This crate holds the only stateful, invariant-bearing computation of the
//! estate levy portal:
//!
//! - **Allocation**: spreading a lump-sum payment plus the resident's rolling
//!   credit across an ordered list of billing periods, producing one bill
//!   posting per period touched and the new carried-forward credit.
//! - **Next-due resolution**: deciding which period a resident should pay
//!   next, and how much they owe after credit.
//!
//! Both are pure functions. [`PaymentService`] wraps them with validation, a
//! per-resident critical section and an atomic commit through the
//! [`LevyStore`] port.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_levy::{allocate, AllocationRequest, PostingContext};
//!
//! let request = AllocationRequest::new(
//!     dec!(7000),                      // amount received
//!     dec!(0),                         // current credit
//!     dec!(5000),                      // due per month
//!     BillingPeriod::range(feb, 2),    // Feb, Mar
//!     PostingContext::new(resident_id, "estate-admin"),
//! );
//!
//! let result = allocate(&request);
//! assert_eq!(result.postings[1].status, BillStatus::Partial);
//! ```

pub mod account;
pub mod allocation;
pub mod bill;
pub mod credit;
pub mod error;
pub mod locks;
pub mod next_due;
pub mod ports;
pub mod preview;
pub mod service;
pub mod summary;

pub use account::LevyAccount;
pub use allocation::{allocate, AllocationRequest, AllocationResult, PostingContext};
pub use bill::{BillPosting, BillStatus, PaymentMethod};
pub use credit::CreditBalance;
pub use error::LevyError;
pub use locks::ResidentLocks;
pub use next_due::{resolve_next_due, NextDue};
pub use ports::{AllocationCommit, BillLedgerPort, LevyAccountPort, LevyStore};
pub use ports::memory::InMemoryLevyStore;
pub use preview::{preview_allocation, AllocationPreview, PreviewLine, PreviewRequest};
pub use service::{PaymentOutcome, PaymentReceipt, PaymentService, RecordPaymentCommand, RetryPolicy};
pub use summary::{summarize_collection, CollectionSummary};
