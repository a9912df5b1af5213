use thiserror::Error;

use crate::decimal::Money;
use crate::types::{BorrowerId, LoanId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("borrower not found: {id}")]
    BorrowerNotFound {
        id: BorrowerId,
    },

    #[error("no pending installments left on loan {loan_id}")]
    NoPendingInstallments {
        loan_id: LoanId,
    },

    /// `installments` is how many installments the expected amount covers
    #[error("payment amount must be {expected} for {installments} installment(s), got {provided}")]
    AmountMismatch {
        expected: Money,
        installments: u32,
        provided: Money,
    },

    #[error("persistence failure: {message}")]
    Persistence {
        message: String,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation { message: message.into() }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        BillingError::Persistence { message: message.into() }
    }

    /// loan or borrower could not be resolved
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BillingError::LoanNotFound { .. } | BillingError::BorrowerNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_amount_mismatch_message_carries_retry_details() {
        let err = BillingError::AmountMismatch {
            expected: Money::from_major(330_000),
            installments: 3,
            provided: Money::from_major(110_000),
        };
        assert_eq!(
            err.to_string(),
            "payment amount must be 330000 for 3 installment(s), got 110000"
        );
    }

    #[test]
    fn test_not_found_grouping() {
        assert!(BillingError::LoanNotFound { id: Uuid::new_v4() }.is_not_found());
        assert!(BillingError::BorrowerNotFound { id: Uuid::new_v4() }.is_not_found());
        assert!(!BillingError::validation("bad").is_not_found());
    }
}
