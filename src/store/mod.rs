pub mod memory;

use crate::errors::Result;
use crate::installment::Installment;
use crate::loan::Loan;
use crate::types::LoanId;

pub use memory::{InMemoryLoanStore, Transaction};

/// persistence contract the billing engine runs against
///
/// Reads take `&self`; writes take `&mut self`, so one handle never has two
/// mutations in flight. Every write is all-or-nothing: on error nothing of the
/// batch is visible.
pub trait LoanStore {
    /// insert a loan and its full schedule as one unit
    fn create_loan_with_schedule(&mut self, loan: &Loan, installments: &[Installment]) -> Result<()>;

    /// `LoanNotFound` if the id is unknown
    fn get_loan(&self, id: LoanId) -> Result<Loan>;

    /// installments of a loan in ascending sequence order
    fn get_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>>;

    fn update_installments(&mut self, batch: &[Installment]) -> Result<()>;

    fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    /// paid installments plus, when the payment settles the loan, the updated
    /// loan row, committed together or not at all
    fn apply_payment(&mut self, batch: &[Installment], loan: Option<&Loan>) -> Result<()>;
}

impl<S: LoanStore + ?Sized> LoanStore for &mut S {
    fn create_loan_with_schedule(&mut self, loan: &Loan, installments: &[Installment]) -> Result<()> {
        (**self).create_loan_with_schedule(loan, installments)
    }

    fn get_loan(&self, id: LoanId) -> Result<Loan> {
        (**self).get_loan(id)
    }

    fn get_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        (**self).get_installments(loan_id)
    }

    fn update_installments(&mut self, batch: &[Installment]) -> Result<()> {
        (**self).update_installments(batch)
    }

    fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        (**self).update_loan(loan)
    }

    fn apply_payment(&mut self, batch: &[Installment], loan: Option<&Loan>) -> Result<()> {
        (**self).apply_payment(batch, loan)
    }
}
