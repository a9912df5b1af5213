use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};
use crate::types::{BorrowerId, LoanId, LoanStatus};

/// financial terms fixed at origination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest_rate: Rate,
    pub total_amount: Money,
    pub installment_count: u32,
    pub installment_amount: Money,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl LoanTerms {
    /// derive terms for a principal starting at `start_date`
    ///
    /// The installment amount must divide the total exactly, otherwise the
    /// schedule could never settle to zero.
    pub fn derive(principal: Money, config: &BillingConfig, start_date: DateTime<Utc>) -> Result<Self> {
        config.validate()?;

        let total_amount = config.total_amount(principal);
        let installment_amount = config.installment_amount(total_amount);
        if installment_amount.times(config.installment_count) != total_amount {
            return Err(BillingError::validation(format!(
                "total {} does not split evenly into {} installments",
                total_amount, config.installment_count
            )));
        }

        let end_date = start_date.checked_add_signed(config.term()).ok_or_else(|| {
            BillingError::InvalidConfiguration {
                message: format!("loan term overflows from start date {}", start_date),
            }
        })?;

        Ok(Self {
            principal,
            interest_rate: config.interest_rate,
            total_amount,
            installment_count: config.installment_count,
            installment_amount,
            start_date,
            end_date,
        })
    }

    /// flat interest charged over the whole term
    pub fn interest_amount(&self) -> Money {
        self.total_amount - self.principal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub terms: LoanTerms,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// new active loan
    pub fn originate(borrower_id: BorrowerId, terms: LoanTerms, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            borrower_id,
            terms,
            status: LoanStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// active -> completed, once every installment is paid
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            LoanStatus::Active => {
                self.status = LoanStatus::Completed;
                self.updated_at = now;
                Ok(())
            }
            other => Err(BillingError::InvalidState {
                current: other.to_string(),
                expected: LoanStatus::Active.to_string(),
            }),
        }
    }
}
