//! Billing rules: schedule generation, outstanding balance, delinquency and
//! the payment state machine.

pub mod delinquency;
pub mod outstanding;
pub mod processor;
pub mod schedule;

pub use delinquency::{missed_count, Delinquency, DelinquencyDetector};
pub use outstanding::Outstanding;
pub use processor::{PaymentPlan, PaymentProcessor, PaymentResult};
pub use schedule::{validate_principal, LoanSchedule};
