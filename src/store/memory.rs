use std::collections::HashMap;

use tracing::debug;

use crate::errors::{BillingError, Result};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::types::{Borrower, BorrowerId, InstallmentId, LoanId, LoanStatus};

use super::LoanStore;

#[derive(Debug, Default)]
struct Tables {
    borrowers: HashMap<BorrowerId, Borrower>,
    loans: HashMap<LoanId, Loan>,
    /// rows kept in ascending sequence order
    installments: HashMap<LoanId, Vec<Installment>>,
}

/// process-local store, mainly for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    tables: Tables,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_borrower(&mut self, borrower: Borrower) -> BorrowerId {
        let id = borrower.id;
        self.tables.borrowers.insert(id, borrower);
        id
    }

    pub fn get_borrower(&self, id: BorrowerId) -> Result<Borrower> {
        self.tables
            .borrowers
            .get(&id)
            .cloned()
            .ok_or(BillingError::BorrowerNotFound { id })
    }

    pub fn loan_count(&self) -> usize {
        self.tables.loans.len()
    }

    /// loans of one borrower, oldest first
    pub fn loans_for_borrower(&self, borrower_id: BorrowerId) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self
            .tables
            .loans
            .values()
            .filter(|l| l.borrower_id == borrower_id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.created_at);
        loans
    }

    /// open a transaction; nothing is visible until `commit`
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            tables: &mut self.tables,
            new_loans: Vec::new(),
            loan_updates: HashMap::new(),
            installment_updates: Vec::new(),
        }
    }
}

/// staged writes against an [`InMemoryLoanStore`]
///
/// Each staging call validates against committed rows plus earlier staged
/// writes. `commit` applies everything at once; dropping the transaction
/// discards it.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    new_loans: Vec<(Loan, Vec<Installment>)>,
    loan_updates: HashMap<LoanId, Loan>,
    installment_updates: Vec<Installment>,
}

impl<'a> Transaction<'a> {
    pub fn insert_loan(&mut self, loan: &Loan, schedule: &[Installment]) -> Result<()> {
        if !self.tables.borrowers.contains_key(&loan.borrower_id) {
            return Err(BillingError::BorrowerNotFound {
                id: loan.borrower_id,
            });
        }
        if self.find_loan(loan.id).is_some() {
            return Err(BillingError::persistence(format!("duplicate loan id {}", loan.id)));
        }
        validate_schedule(loan, schedule)?;

        self.new_loans.push((loan.clone(), schedule.to_vec()));
        Ok(())
    }

    pub fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let current = self
            .find_loan(loan.id)
            .ok_or_else(|| BillingError::persistence(format!("loan {} does not exist", loan.id)))?;
        if current.terms != loan.terms || current.borrower_id != loan.borrower_id {
            return Err(BillingError::persistence(format!(
                "loan {} terms are immutable",
                loan.id
            )));
        }
        if current.status == LoanStatus::Completed && loan.status != LoanStatus::Completed {
            return Err(BillingError::persistence(format!(
                "loan {} is completed and cannot move to {}",
                loan.id, loan.status
            )));
        }

        self.loan_updates.insert(loan.id, loan.clone());
        Ok(())
    }

    pub fn update_installment(&mut self, installment: &Installment) -> Result<()> {
        let current = self
            .find_installment(installment.loan_id, installment.id)
            .cloned()
            .ok_or_else(|| {
                BillingError::persistence(format!(
                    "installment {} of loan {} does not exist",
                    installment.id, installment.loan_id
                ))
            })?;

        if current.sequence != installment.sequence
            || current.amount != installment.amount
            || current.due_date != installment.due_date
        {
            return Err(BillingError::persistence(format!(
                "installment {} schedule fields are immutable",
                current.sequence
            )));
        }
        if let Some(paid_at) = current.paid_at() {
            if installment.paid_at() != Some(paid_at) {
                return Err(BillingError::persistence(format!(
                    "installment {} was already paid at {}",
                    current.sequence, paid_at
                )));
            }
        }

        self.installment_updates.retain(|i| i.id != installment.id);
        self.installment_updates.push(installment.clone());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.new_loans.is_empty() && self.loan_updates.is_empty() && self.installment_updates.is_empty()
    }

    pub fn commit(self) {
        let Transaction {
            tables,
            new_loans,
            loan_updates,
            installment_updates,
        } = self;

        debug!(
            new_loans = new_loans.len(),
            loan_updates = loan_updates.len(),
            installment_updates = installment_updates.len(),
            "committing transaction"
        );

        for (loan, schedule) in new_loans {
            tables.installments.insert(loan.id, schedule);
            tables.loans.insert(loan.id, loan);
        }
        for (id, loan) in loan_updates {
            tables.loans.insert(id, loan);
        }
        for installment in installment_updates {
            if let Some(row) = tables
                .installments
                .get_mut(&installment.loan_id)
                .and_then(|rows| rows.iter_mut().find(|r| r.id == installment.id))
            {
                *row = installment;
            }
        }
    }

    pub fn rollback(self) {
        debug!("rolling back transaction");
    }

    fn find_loan(&self, id: LoanId) -> Option<&Loan> {
        self.loan_updates
            .get(&id)
            .or_else(|| self.new_loans.iter().map(|(l, _)| l).find(|l| l.id == id))
            .or_else(|| self.tables.loans.get(&id))
    }

    fn find_installment(&self, loan_id: LoanId, id: InstallmentId) -> Option<&Installment> {
        if let Some(staged) = self.installment_updates.iter().find(|i| i.id == id) {
            return Some(staged);
        }
        let rows = self
            .new_loans
            .iter()
            .find(|(l, _)| l.id == loan_id)
            .map(|(_, rows)| rows)
            .or_else(|| self.tables.installments.get(&loan_id))?;
        rows.iter().find(|r| r.id == id)
    }
}

/// one pending row per sequence 1..=N, due dates strictly increasing
fn validate_schedule(loan: &Loan, schedule: &[Installment]) -> Result<()> {
    if schedule.len() != loan.terms.installment_count as usize {
        return Err(BillingError::persistence(format!(
            "loan {} expects {} installments, got {}",
            loan.id,
            loan.terms.installment_count,
            schedule.len()
        )));
    }

    let mut previous_due = None;
    for (idx, installment) in schedule.iter().enumerate() {
        let expected_sequence = idx as u32 + 1;
        if installment.loan_id != loan.id {
            return Err(BillingError::persistence(format!(
                "installment {} belongs to loan {}",
                installment.sequence, installment.loan_id
            )));
        }
        if installment.sequence != expected_sequence {
            return Err(BillingError::persistence(format!(
                "installment sequence {} out of order, expected {}",
                installment.sequence, expected_sequence
            )));
        }
        if !installment.is_pending() {
            return Err(BillingError::persistence(format!(
                "installment {} must start pending",
                installment.sequence
            )));
        }
        if previous_due.is_some_and(|due| installment.due_date <= due) {
            return Err(BillingError::persistence(format!(
                "installment {} due date does not advance",
                installment.sequence
            )));
        }
        previous_due = Some(installment.due_date);
    }
    Ok(())
}

impl LoanStore for InMemoryLoanStore {
    fn create_loan_with_schedule(&mut self, loan: &Loan, installments: &[Installment]) -> Result<()> {
        let mut tx = self.begin();
        tx.insert_loan(loan, installments)?;
        tx.commit();
        Ok(())
    }

    fn get_loan(&self, id: LoanId) -> Result<Loan> {
        self.tables
            .loans
            .get(&id)
            .cloned()
            .ok_or(BillingError::LoanNotFound { id })
    }

    fn get_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        Ok(self
            .tables
            .installments
            .get(&loan_id)
            .cloned()
            .unwrap_or_default())
    }

    fn update_installments(&mut self, batch: &[Installment]) -> Result<()> {
        let mut tx = self.begin();
        for installment in batch {
            tx.update_installment(installment)?;
        }
        tx.commit();
        Ok(())
    }

    fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let mut tx = self.begin();
        tx.update_loan(loan)?;
        tx.commit();
        Ok(())
    }

    fn apply_payment(&mut self, batch: &[Installment], loan: Option<&Loan>) -> Result<()> {
        let mut tx = self.begin();
        for installment in batch {
            tx.update_installment(installment)?;
        }
        if let Some(loan) = loan {
            tx.update_loan(loan)?;
        }
        tx.commit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillingConfig;
    use crate::decimal::Money;
    use crate::loan::LoanTerms;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn store_with_borrower() -> (InMemoryLoanStore, BorrowerId) {
        let mut store = InMemoryLoanStore::new();
        let id = store.register_borrower(Borrower::new("Siti", "Rahma", "siti@example.com", "0811", start()));
        (store, id)
    }

    fn loan_with_schedule(borrower_id: BorrowerId) -> (Loan, Vec<Installment>) {
        let terms = LoanTerms::derive(Money::from_major(1_000_000), &BillingConfig::weekly_flat(), start()).unwrap();
        let loan = Loan::originate(borrower_id, terms, start());
        let rows = (1..=50)
            .map(|seq| {
                Installment::pending(
                    loan.id,
                    seq,
                    loan.terms.installment_amount,
                    start() + Duration::days(7 * seq as i64),
                    start(),
                )
            })
            .collect();
        (loan, rows)
    }

    #[test]
    fn test_create_and_read_back() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);

        store.create_loan_with_schedule(&loan, &rows).unwrap();

        assert_eq!(store.get_loan(loan.id).unwrap(), loan);
        let stored = store.get_installments(loan.id).unwrap();
        assert_eq!(stored.len(), 50);
        assert!(stored.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert_eq!(store.loans_for_borrower(borrower).len(), 1);
    }

    #[test]
    fn test_unknown_ids() {
        let (mut store, _) = store_with_borrower();
        let missing = Uuid::new_v4();
        assert_eq!(store.get_loan(missing), Err(BillingError::LoanNotFound { id: missing }));
        assert!(store.get_installments(missing).unwrap().is_empty());

        let (loan, rows) = loan_with_schedule(Uuid::new_v4());
        let err = store.create_loan_with_schedule(&loan, &rows).unwrap_err();
        assert!(matches!(err, BillingError::BorrowerNotFound { .. }));
        assert_eq!(store.loan_count(), 0);
    }

    #[test]
    fn test_broken_schedule_leaves_nothing_behind() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, mut rows) = loan_with_schedule(borrower);
        rows[10].sequence = 99;

        let err = store.create_loan_with_schedule(&loan, &rows).unwrap_err();
        assert!(matches!(err, BillingError::Persistence { .. }));
        assert_eq!(store.loan_count(), 0);
        assert!(store.get_installments(loan.id).unwrap().is_empty());

        let (short_loan, mut short_rows) = loan_with_schedule(borrower);
        short_rows.pop();
        assert!(store.create_loan_with_schedule(&short_loan, &short_rows).is_err());
        assert_eq!(store.loan_count(), 0);
    }

    #[test]
    fn test_batch_update_is_all_or_nothing() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);
        store.create_loan_with_schedule(&loan, &rows).unwrap();

        let paid_at = start() + Duration::days(20);
        let mut batch: Vec<Installment> = rows[..3].to_vec();
        for row in &mut batch {
            row.mark_paid(paid_at).unwrap();
        }
        // a row nobody stored poisons the whole batch
        let mut stranger = rows[3].clone();
        stranger.id = Uuid::new_v4();
        batch.push(stranger);

        let err = store.update_installments(&batch).unwrap_err();
        assert!(matches!(err, BillingError::Persistence { .. }));
        assert!(store.get_installments(loan.id).unwrap().iter().all(|i| i.is_pending()));

        batch.pop();
        store.update_installments(&batch).unwrap();
        let stored = store.get_installments(loan.id).unwrap();
        assert_eq!(stored.iter().filter(|i| i.is_paid()).count(), 3);
        assert_eq!(stored[0].paid_at(), Some(paid_at));
    }

    #[test]
    fn test_paid_timestamp_is_immutable() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);
        store.create_loan_with_schedule(&loan, &rows).unwrap();

        let mut first = rows[0].clone();
        first.mark_paid(start() + Duration::days(7)).unwrap();
        store.update_installments(std::slice::from_ref(&first)).unwrap();

        let mut rewrite = rows[0].clone();
        rewrite.mark_paid(start() + Duration::days(9)).unwrap();
        assert!(store.update_installments(&[rewrite]).is_err());

        let mut reopened = first.clone();
        reopened.status = crate::installment::InstallmentStatus::Pending;
        assert!(store.update_installments(&[reopened]).is_err());

        assert_eq!(
            store.get_installments(loan.id).unwrap()[0].paid_at(),
            Some(start() + Duration::days(7))
        );
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);
        store.create_loan_with_schedule(&loan, &rows).unwrap();

        {
            let mut tx = store.begin();
            let mut completed = loan.clone();
            completed.status = LoanStatus::Completed;
            tx.update_loan(&completed).unwrap();
            assert!(!tx.is_empty());
            tx.rollback();
        }
        assert_eq!(store.get_loan(loan.id).unwrap().status, LoanStatus::Active);

        let mut altered = loan.clone();
        altered.terms.installment_count = 10;
        assert!(store.update_loan(&altered).is_err());
    }

    #[test]
    fn test_completed_loan_is_never_reopened() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);
        store.create_loan_with_schedule(&loan, &rows).unwrap();

        let mut completed = loan.clone();
        completed.complete(start() + Duration::days(350)).unwrap();
        store.update_loan(&completed).unwrap();

        let mut reopened = completed.clone();
        reopened.status = LoanStatus::Active;
        let err = store.update_loan(&reopened).unwrap_err();
        assert!(matches!(err, BillingError::Persistence { .. }));

        reopened.status = LoanStatus::Defaulted;
        assert!(store.update_loan(&reopened).is_err());
        assert_eq!(store.get_loan(loan.id).unwrap().status, LoanStatus::Completed);
    }

    #[test]
    fn test_apply_payment_commits_rows_and_loan_together() {
        let (mut store, borrower) = store_with_borrower();
        let (loan, rows) = loan_with_schedule(borrower);
        store.create_loan_with_schedule(&loan, &rows).unwrap();

        let paid_at = start() + Duration::days(7);
        let mut batch = rows[..2].to_vec();
        for row in &mut batch {
            row.mark_paid(paid_at).unwrap();
        }

        // a rejected loan row drops the installment rows with it
        let mut altered = loan.clone();
        altered.terms.installment_count = 10;
        assert!(store.apply_payment(&batch, Some(&altered)).is_err());
        assert!(store.get_installments(loan.id).unwrap().iter().all(|i| i.is_pending()));

        let mut completed = loan.clone();
        completed.complete(paid_at).unwrap();
        store.apply_payment(&batch, Some(&completed)).unwrap();
        assert_eq!(store.get_installments(loan.id).unwrap().iter().filter(|i| i.is_paid()).count(), 2);
        assert_eq!(store.get_loan(loan.id).unwrap().status, LoanStatus::Completed);
    }
}
