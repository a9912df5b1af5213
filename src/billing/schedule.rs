use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::installment::Installment;
use crate::loan::{Loan, LoanTerms};
use crate::store::LoanStore;
use crate::types::BorrowerId;

/// a freshly originated loan together with its full installment set
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSchedule {
    pub loan: Loan,
    pub installments: Vec<Installment>,
}

impl LoanSchedule {
    /// derive terms and build every installment, starting now
    pub fn generate(
        borrower_id: BorrowerId,
        principal: Money,
        config: &BillingConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        Self::generate_at(borrower_id, principal, config, time_provider.now())
    }

    pub fn generate_at(
        borrower_id: BorrowerId,
        principal: Money,
        config: &BillingConfig,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        validate_principal(principal, config)?;

        let terms = LoanTerms::derive(principal, config, start_date)?;
        let loan = Loan::originate(borrower_id, terms, start_date);

        // first installment falls one full period after start, not on day 0
        let installments = (1..=config.installment_count)
            .map(|sequence| {
                Ok(Installment::pending(
                    loan.id,
                    sequence,
                    loan.terms.installment_amount,
                    due_date(start_date, config.installment_period_days, sequence)?,
                    start_date,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { loan, installments })
    }

    /// installment by 1-based sequence number
    pub fn get_installment(&self, sequence: u32) -> Option<&Installment> {
        sequence
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    /// sum of every installment amount
    pub fn total_due(&self) -> Money {
        self.installments
            .iter()
            .map(|i| i.amount)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// hand the loan and its rows to the store as one atomic unit
    pub fn persist<S: LoanStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.create_loan_with_schedule(&self.loan, &self.installments)?;

        info!(
            loan_id = %self.loan.id,
            borrower_id = %self.loan.borrower_id,
            principal = %self.loan.terms.principal,
            total = %self.loan.terms.total_amount,
            installment = %self.loan.terms.installment_amount,
            "loan originated"
        );
        Ok(())
    }
}

fn due_date(start: DateTime<Utc>, period_days: u32, sequence: u32) -> Result<DateTime<Utc>> {
    let offset = Duration::days(period_days as i64 * sequence as i64);
    start
        .checked_add_signed(offset)
        .ok_or_else(|| BillingError::InvalidConfiguration {
            message: format!("installment {} falls past the last representable date", sequence),
        })
}

/// principal must be positive and fit the currency's minor units
pub fn validate_principal(principal: Money, config: &BillingConfig) -> Result<()> {
    if !principal.is_positive() {
        return Err(BillingError::validation(format!(
            "principal must be greater than zero, got {}",
            principal
        )));
    }
    if principal.fractional_digits() > config.currency_scale {
        return Err(BillingError::validation(format!(
            "principal {} has more than {} decimal places",
            principal, config.currency_scale
        )));
    }
    Ok(())
}
