use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BorrowerId, LoanId, LoanStatus};

/// all events that can be emitted by the billing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoanOriginated {
        loan_id: LoanId,
        borrower_id: BorrowerId,
        principal: Money,
        total_amount: Money,
        installment_amount: Money,
        installment_count: u32,
        timestamp: DateTime<Utc>,
    },

    PaymentReceived {
        loan_id: LoanId,
        amount: Money,
        sequences: Vec<u32>,
        missed_count: u32,
        timestamp: DateTime<Utc>,
    },

    PaymentRejected {
        loan_id: LoanId,
        provided: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanOriginated { loan_id, .. }
            | Event::PaymentReceived { loan_id, .. }
            | Event::PaymentRejected { loan_id, .. }
            | Event::StatusChanged { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// events concerning one loan, oldest first
    pub fn for_loan(&self, loan_id: LoanId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.loan_id() == loan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_drains_and_filters_by_loan() {
        let mut store = EventStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        for loan_id in [a, b, a] {
            store.emit(Event::PaymentRejected {
                loan_id,
                provided: Money::ONE,
                reason: "test".to_string(),
                timestamp: now,
            });
        }

        assert_eq!(store.for_loan(a).count(), 2);
        assert_eq!(store.take_events().len(), 3);
        assert!(store.events().is_empty());
    }
}
