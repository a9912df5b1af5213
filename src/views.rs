//! serializable responses handed to the transport layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::{Delinquency, Outstanding, PaymentResult};
use crate::decimal::{Money, Rate};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::types::{BorrowerId, InstallmentState, LoanId, LoanStatus};

/// pretty json for any view
pub trait JsonView: Serialize {
    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub principal: Money,
    pub interest_rate: Rate,
    pub total_amount: Money,
    pub installment_amount: Money,
    pub installment_count: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: LoanStatus,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        LoanView {
            id: loan.id,
            borrower_id: loan.borrower_id,
            principal: loan.terms.principal,
            interest_rate: loan.terms.interest_rate,
            total_amount: loan.terms.total_amount,
            installment_amount: loan.terms.installment_amount,
            installment_count: loan.terms.installment_count,
            start_date: loan.terms.start_date,
            end_date: loan.terms.end_date,
            status: loan.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingView {
    pub loan_id: LoanId,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub outstanding_amount: Money,
}

impl OutstandingView {
    pub fn new(loan_id: LoanId, outstanding: Outstanding) -> Self {
        OutstandingView {
            loan_id,
            total_amount: outstanding.total_amount,
            amount_paid: outstanding.amount_paid,
            outstanding_amount: outstanding.outstanding_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyView {
    pub loan_id: LoanId,
    pub is_delinquent: bool,
    pub missed_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DelinquencyView {
    pub fn new(loan_id: LoanId, delinquency: Delinquency, threshold: u32) -> Self {
        DelinquencyView {
            loan_id,
            is_delinquent: delinquency.is_delinquent,
            missed_count: delinquency.missed_count,
            reason: delinquency.is_delinquent.then(|| {
                format!("borrower has missed {} or more consecutive payments", threshold)
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItemView {
    pub sequence: u32,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
    pub status: InstallmentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub loan_id: LoanId,
    pub schedule: Vec<ScheduleItemView>,
}

impl ScheduleView {
    /// status is reported as of `now`, so overdue rows show as missed
    pub fn new(loan_id: LoanId, installments: &[Installment], now: DateTime<Utc>) -> Self {
        ScheduleView {
            loan_id,
            schedule: installments
                .iter()
                .map(|i| ScheduleItemView {
                    sequence: i.sequence,
                    due_date: i.due_date,
                    amount: i.amount,
                    status: i.state_at(now),
                    paid_date: i.paid_at(),
                })
                .collect(),
        }
    }

    pub fn count(&self, state: InstallmentState) -> usize {
        self.schedule.iter().filter(|i| i.status == state).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub success: bool,
    pub message: String,
    pub loan_id: LoanId,
    pub installments_paid: Vec<u32>,
    pub amount_applied: Money,
    pub remaining_due: Money,
    pub loan_status: LoanStatus,
}

impl PaymentReceipt {
    pub fn new(result: PaymentResult, remaining_due: Money, loan_status: LoanStatus) -> Self {
        let message = if result.loan_completed {
            "payment processed, loan fully repaid"
        } else {
            "payment processed successfully"
        };

        PaymentReceipt {
            success: true,
            message: message.to_string(),
            loan_id: result.loan_id,
            installments_paid: result.sequences_paid,
            amount_applied: result.amount_applied,
            remaining_due,
            loan_status,
        }
    }
}

impl JsonView for LoanView {}
impl JsonView for OutstandingView {}
impl JsonView for DelinquencyView {}
impl JsonView for ScheduleView {}
impl JsonView for PaymentReceipt {}
