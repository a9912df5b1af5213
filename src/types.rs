use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a borrower
pub type BorrowerId = Uuid;

/// unique identifier for a single installment row
pub type InstallmentId = Uuid;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// originated and still being repaid
    Active,
    /// every installment paid, terminal
    Completed,
    /// written off by the lender
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Defaulted => "defaulted",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// reporting view of an installment, derived from its stored status and the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentState {
    /// not paid, not yet due
    Pending,
    /// not paid and past its due date
    Missed,
    Paid,
}

impl InstallmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentState::Pending => "pending",
            InstallmentState::Missed => "missed",
            InstallmentState::Paid => "paid",
        }
    }
}

/// borrower on record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Borrower {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
            created_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&LoanStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(serde_json::to_string(&InstallmentState::Missed).unwrap(), "\"missed\"");
        assert_eq!(LoanStatus::Active.to_string(), "active");
    }
}
