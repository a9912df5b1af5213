use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::billing::{DelinquencyDetector, LoanSchedule, Outstanding, PaymentProcessor};
use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::store::LoanStore;
use crate::types::{BorrowerId, LoanId};
use crate::views::{DelinquencyView, LoanView, OutstandingView, PaymentReceipt, ScheduleView};

/// entry point for the transport layer
///
/// The store is injected by the caller and owned here; every "now" comes from
/// the borrowed time provider.
pub struct BillingService<'t, S: LoanStore> {
    store: S,
    config: BillingConfig,
    processor: PaymentProcessor,
    detector: DelinquencyDetector,
    time: &'t SafeTimeProvider,
    events: EventStore,
}

impl<'t, S: LoanStore> BillingService<'t, S> {
    pub fn new(store: S, config: BillingConfig, time: &'t SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            processor: PaymentProcessor::new(&config),
            detector: DelinquencyDetector::new(&config),
            store,
            config,
            time,
            events: EventStore::new(),
        })
    }

    /// originate a loan and its full schedule
    pub fn create_loan(&mut self, borrower_id: BorrowerId, principal: Money) -> Result<LoanView> {
        let schedule = LoanSchedule::generate(borrower_id, principal, &self.config, self.time)?;
        schedule.persist(&mut self.store)?;

        let loan = &schedule.loan;
        self.events.emit(Event::LoanOriginated {
            loan_id: loan.id,
            borrower_id,
            principal: loan.terms.principal,
            total_amount: loan.terms.total_amount,
            installment_amount: loan.terms.installment_amount,
            installment_count: loan.terms.installment_count,
            timestamp: loan.created_at,
        });

        Ok(LoanView::from_loan(loan))
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Result<LoanView> {
        let loan = self.store.get_loan(loan_id)?;
        Ok(LoanView::from_loan(&loan))
    }

    pub fn get_outstanding(&self, loan_id: LoanId) -> Result<OutstandingView> {
        let outstanding = Outstanding::for_loan(&self.store, loan_id)?;
        Ok(OutstandingView::new(loan_id, outstanding))
    }

    pub fn get_delinquency(&self, loan_id: LoanId) -> Result<DelinquencyView> {
        let delinquency = self.detector.check(&self.store, loan_id, self.time.now())?;
        Ok(DelinquencyView::new(loan_id, delinquency, self.detector.threshold()))
    }

    pub fn get_schedule(&self, loan_id: LoanId) -> Result<ScheduleView> {
        self.store.get_loan(loan_id)?;
        let installments = self.store.get_installments(loan_id)?;
        Ok(ScheduleView::new(loan_id, &installments, self.time.now()))
    }

    /// apply one payment and report what is still owed
    pub fn make_payment(&mut self, loan_id: LoanId, amount: Money) -> Result<PaymentReceipt> {
        let result = self.processor.process(
            &mut self.store,
            loan_id,
            amount,
            self.time,
            &mut self.events,
        )?;

        let loan = self.store.get_loan(loan_id)?;
        let installments = self.store.get_installments(loan_id)?;
        let outstanding = Outstanding::calculate(&loan, &installments);

        info!(
            loan_id = %loan_id,
            remaining = %outstanding.outstanding_amount,
            status = %loan.status,
            "payment receipt issued"
        );
        Ok(PaymentReceipt::new(result, outstanding.outstanding_amount, loan.status))
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// drain the audit trail collected so far
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
