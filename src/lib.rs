pub mod billing;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod installment;
pub mod loan;
pub mod service;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use billing::{
    Delinquency, DelinquencyDetector, LoanSchedule, Outstanding, PaymentPlan, PaymentProcessor,
    PaymentResult,
};
pub use config::BillingConfig;
pub use decimal::{Money, Rate};
pub use errors::{BillingError, Result};
pub use events::{Event, EventStore};
pub use installment::{Installment, InstallmentStatus};
pub use loan::{Loan, LoanTerms};
pub use service::BillingService;
pub use store::{InMemoryLoanStore, LoanStore, Transaction};
pub use types::{Borrower, BorrowerId, InstallmentId, InstallmentState, LoanId, LoanStatus};
pub use views::{
    DelinquencyView, JsonView, LoanView, OutstandingView, PaymentReceipt, ScheduleItemView,
    ScheduleView,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
