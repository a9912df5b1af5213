use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::installment::Installment;
use crate::loan::Loan;
use crate::store::LoanStore;
use crate::types::LoanId;

/// remaining balance breakdown; `amount_paid + outstanding_amount == total_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outstanding {
    pub total_amount: Money,
    pub amount_paid: Money,
    pub outstanding_amount: Money,
}

impl Outstanding {
    pub fn calculate(loan: &Loan, installments: &[Installment]) -> Self {
        let amount_paid = installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Self {
            total_amount: loan.terms.total_amount,
            amount_paid,
            outstanding_amount: loan.terms.total_amount - amount_paid,
        }
    }

    /// resolve the loan and compute its balance
    pub fn for_loan<S: LoanStore + ?Sized>(store: &S, loan_id: LoanId) -> Result<Self> {
        let loan = store.get_loan(loan_id)?;
        let installments = store.get_installments(loan_id)?;
        Ok(Self::calculate(&loan, &installments))
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding_amount.is_zero()
    }
}
