use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::types::{InstallmentId, InstallmentState, LoanId};

/// stored installment status; the paid timestamp lives inside the variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid { paid_at: DateTime<Utc> },
}

/// one scheduled weekly obligation of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub sequence: u32,
    pub amount: Money,
    pub due_date: DateTime<Utc>,
    pub status: InstallmentStatus,
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    pub fn pending(
        loan_id: LoanId,
        sequence: u32,
        amount: Money,
        due_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            sequence,
            amount,
            due_date,
            status: InstallmentStatus::Pending,
            updated_at: created_at,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.status, InstallmentStatus::Paid { .. })
    }

    pub fn is_pending(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    /// pending and due strictly before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.due_date < now
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            InstallmentStatus::Paid { paid_at } => Some(paid_at),
            InstallmentStatus::Pending => None,
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> InstallmentState {
        match self.status {
            InstallmentStatus::Paid { .. } => InstallmentState::Paid,
            InstallmentStatus::Pending if self.due_date < now => InstallmentState::Missed,
            InstallmentStatus::Pending => InstallmentState::Pending,
        }
    }

    /// pending -> paid; the paid timestamp is never overwritten
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let InstallmentStatus::Paid { paid_at } = self.status {
            return Err(BillingError::InvalidState {
                current: format!("installment {} paid at {}", self.sequence, paid_at),
                expected: "pending".to_string(),
            });
        }
        self.status = InstallmentStatus::Paid { paid_at: now };
        self.updated_at = now;
        Ok(())
    }
}
