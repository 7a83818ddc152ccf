//! Slot state-change notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    AccountId, LedgerCall, Slot, SubmissionHandle, TransactionId, TransactionRecord,
    TransactionState,
};

/// Published on every slot transition, including the return to `Idle` when
/// a terminal record is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEvent {
    pub account: AccountId,
    pub slot: Slot,
    pub transaction: TransactionId,
    pub call: LedgerCall,
    pub handle: Option<SubmissionHandle>,
    pub state: TransactionState,
    pub at: DateTime<Utc>,
}

impl SlotEvent {
    pub(crate) fn from_record(record: &TransactionRecord) -> Self {
        Self {
            account: record.account.clone(),
            slot: record.slot(),
            transaction: record.id,
            call: record.call,
            handle: record.handle.clone(),
            state: record.state.clone(),
            at: record.updated_at,
        }
    }

    /// Event for a slot released by acknowledgement.
    pub(crate) fn released(record: &TransactionRecord, at: DateTime<Utc>) -> Self {
        Self {
            state: TransactionState::Idle,
            at,
            ..Self::from_record(record)
        }
    }

    /// True if this event concerns the given account's slot.
    #[must_use]
    pub fn is_for(&self, account: &AccountId, slot: Slot) -> bool {
        &self.account == account && self.slot == slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetKind;
    use crate::testkit::domain::account;

    #[test]
    fn released_event_is_idle_for_the_same_slot() {
        let call = LedgerCall::Exchange {
            want: AssetKind::GOLD,
            give: AssetKind::SILVER,
        };
        let record = TransactionRecord::submitted(account(1), call, Utc::now());
        let event = SlotEvent::released(&record, record.updated_at);

        assert_eq!(event.state, TransactionState::Idle);
        assert_eq!(event.transaction, record.id);
        assert!(event.is_for(&account(1), Slot::Exchange));
        assert!(!event.is_for(&account(1), Slot::Acquire));
        assert!(!event.is_for(&account(2), Slot::Exchange));
    }
}
