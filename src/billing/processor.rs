use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::events::{Event, EventStore};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::store::LoanStore;
use crate::types::{LoanId, LoanStatus};

use super::delinquency::DelinquencyDetector;

/// which installments a payment must settle, and for how much
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPlan {
    pub loan_id: LoanId,
    pub missed_count: u32,
    pub delinquent: bool,
    /// pending installments in ascending sequence order
    pub targets: Vec<Installment>,
    pub required_amount: Money,
}

impl PaymentPlan {
    pub fn sequences(&self) -> Vec<u32> {
        self.targets.iter().map(|i| i.sequence).collect()
    }

    pub fn installment_count(&self) -> u32 {
        self.targets.len() as u32
    }

    /// the amount has to match exactly, no partial or over-payment
    pub fn validate(&self, amount: Money) -> Result<()> {
        if amount != self.required_amount {
            return Err(BillingError::AmountMismatch {
                expected: self.required_amount,
                installments: self.installment_count(),
                provided: amount,
            });
        }
        Ok(())
    }
}

/// outcome of an accepted payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub loan_id: LoanId,
    pub amount_applied: Money,
    pub sequences_paid: Vec<u32>,
    pub missed_count: u32,
    pub paid_at: DateTime<Utc>,
    pub loan_completed: bool,
}

/// payment state machine over a loan's installment schedule
pub struct PaymentProcessor {
    detector: DelinquencyDetector,
}

impl PaymentProcessor {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            detector: DelinquencyDetector::new(config),
        }
    }

    /// pick the target installments and the amount they require
    ///
    /// Not delinquent: the earliest pending installment, at one installment
    /// amount. Delinquent: the first `missed_count` pending installments (or
    /// fewer if that many are not left), at that many installment amounts.
    pub fn plan(&self, loan: &Loan, installments: &[Installment], now: DateTime<Utc>) -> Result<PaymentPlan> {
        let delinquency = self.detector.assess(installments, now);

        let wanted = if delinquency.is_delinquent {
            delinquency.missed_count as usize
        } else {
            1
        };

        let mut pending: Vec<&Installment> = installments.iter().filter(|i| i.is_pending()).collect();
        pending.sort_by_key(|i| i.sequence);
        let targets: Vec<Installment> = pending.into_iter().take(wanted).cloned().collect();

        if targets.is_empty() {
            return Err(BillingError::NoPendingInstallments { loan_id: loan.id });
        }

        let required_amount = if delinquency.is_delinquent {
            loan.terms.installment_amount.times(targets.len() as u32)
        } else {
            loan.terms.installment_amount
        };

        Ok(PaymentPlan {
            loan_id: loan.id,
            missed_count: delinquency.missed_count,
            delinquent: delinquency.is_delinquent,
            targets,
            required_amount,
        })
    }

    /// validate and apply one payment; nothing is written unless it is accepted
    pub fn process<S: LoanStore + ?Sized>(
        &self,
        store: &mut S,
        loan_id: LoanId,
        amount: Money,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<PaymentResult> {
        let now = time_provider.now();
        let mut loan = store.get_loan(loan_id)?;
        let installments = store.get_installments(loan_id)?;

        let plan = match self
            .plan(&loan, &installments, now)
            .and_then(|plan| plan.validate(amount).map(|_| plan))
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(loan_id = %loan_id, amount = %amount, error = %err, "payment rejected");
                events.emit(Event::PaymentRejected {
                    loan_id,
                    provided: amount,
                    reason: err.to_string(),
                    timestamp: now,
                });
                return Err(err);
            }
        };

        debug!(
            loan_id = %loan_id,
            missed_count = plan.missed_count,
            delinquent = plan.delinquent,
            sequences = ?plan.sequences(),
            "payment plan accepted"
        );

        let mut batch = plan.targets.clone();
        for installment in &mut batch {
            installment.mark_paid(now)?;
        }

        // the batch settles the loan when every other row is already paid
        let settles = installments
            .iter()
            .all(|i| i.is_paid() || batch.iter().any(|b| b.id == i.id));
        let previous_status = loan.status;
        let loan_completed = settles && loan.is_active();
        if loan_completed {
            loan.complete(now)?;
        }
        store.apply_payment(&batch, loan_completed.then_some(&loan))?;

        let sequences_paid = plan.sequences();
        info!(
            loan_id = %loan_id,
            amount = %amount,
            installments = sequences_paid.len(),
            "payment applied"
        );
        events.emit(Event::PaymentReceived {
            loan_id,
            amount,
            sequences: sequences_paid.clone(),
            missed_count: plan.missed_count,
            timestamp: now,
        });

        if loan_completed {
            info!(loan_id = %loan_id, "loan completed");
            events.emit(Event::StatusChanged {
                loan_id,
                old_status: previous_status,
                new_status: LoanStatus::Completed,
                reason: "all installments paid".to_string(),
                timestamp: now,
            });
        }

        Ok(PaymentResult {
            loan_id,
            amount_applied: amount,
            sequences_paid,
            missed_count: plan.missed_count,
            paid_at: now,
            loan_completed,
        })
    }
}
