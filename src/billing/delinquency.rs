use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::errors::Result;
use crate::installment::Installment;
use crate::store::LoanStore;
use crate::types::LoanId;

/// Count trailing missed installments, walking from the highest sequence down.
///
/// Overdue pending rows count, a paid row ends the walk, and pending rows that
/// are not yet due are stepped over without ending it.
pub fn missed_count(installments: &[Installment], now: DateTime<Utc>) -> u32 {
    let mut newest_first: Vec<&Installment> = installments.iter().collect();
    newest_first.sort_by(|a, b| b.sequence.cmp(&a.sequence));

    let mut missed = 0;
    for installment in newest_first {
        if installment.is_paid() {
            break;
        }
        if installment.is_overdue(now) {
            missed += 1;
        }
    }
    missed
}

/// delinquency assessment of one loan at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delinquency {
    pub missed_count: u32,
    pub is_delinquent: bool,
}

/// applies the configured threshold to the missed count
#[derive(Debug, Clone, Copy)]
pub struct DelinquencyDetector {
    threshold: u32,
}

impl DelinquencyDetector {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            threshold: config.delinquency_threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn assess(&self, installments: &[Installment], now: DateTime<Utc>) -> Delinquency {
        let missed_count = missed_count(installments, now);
        Delinquency {
            missed_count,
            is_delinquent: missed_count >= self.threshold,
        }
    }

    /// resolve the loan first so an unknown id is `LoanNotFound`, not "0 missed"
    pub fn check<S: LoanStore + ?Sized>(
        &self,
        store: &S,
        loan_id: LoanId,
        now: DateTime<Utc>,
    ) -> Result<Delinquency> {
        store.get_loan(loan_id)?;
        let installments = store.get_installments(loan_id)?;
        Ok(self.assess(&installments, now))
    }
}
