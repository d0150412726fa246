//! Per-run matching state of one subscriber

use common::Email;
use std::collections::HashMap;

use crate::domain::{Availability, RunContext, SubscriberRecord};
use crate::ledger::HistoryLedger;

/// A subscriber as seen by one pairing run
///
/// Built fresh every run from the subscriber record and the ledger rows in
/// which this subscriber is the first member. Partner assignment is not
/// stored here; it lives in the engine's [`crate::PairingMap`].
#[derive(Debug, Clone)]
pub struct Participant {
    identity: Email,
    name: String,
    availability: Availability,
    exclusive: bool,
    interval: u32,
    /// Second member -> count, for rows `(identity, second)`
    history: HashMap<Email, u32>,
}

impl Participant {
    /// Build a participant from its record and the history ledger
    pub fn new(record: &SubscriberRecord, ledger: &HistoryLedger) -> Self {
        let history = ledger
            .slice_for(&record.email)
            .map(|row| (row.second.clone(), row.count))
            .collect();

        Self {
            identity: record.email.clone(),
            name: record.name.clone(),
            availability: record.availability.clone(),
            exclusive: record.exclusive,
            interval: record.interval.max(1),
            history,
        }
    }

    pub fn identity(&self) -> &Email {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Prior pairings recorded under `(self, other)`; the reverse row is ignored
    pub fn past_pairing_score(&self, other: &Participant) -> u32 {
        self.history.get(&other.identity).copied().unwrap_or(0)
    }

    pub fn availability_overlap(&self, other: &Participant) -> usize {
        self.availability.overlap(&other.availability)
    }

    /// Sum of counts across this participant's history slice
    pub fn total_historical_load(&self) -> u32 {
        self.history.values().fold(0u32, |acc, c| acc.saturating_add(*c))
    }

    /// Periodic inclusion: take part only in weeks divisible by the interval
    pub fn is_eligible_this_run(&self, context: &RunContext) -> bool {
        context.week % self.interval == 0
    }

    /// Whether this participant would accept `other` as a partner
    ///
    /// Exclusive participants refuse partners they share no day with. Only
    /// consulted when availability modelling is on.
    pub fn accepts(&self, other: &Participant) -> bool {
        !self.exclusive || self.availability_overlap(other) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerRow;
    use chrono::Weekday;

    fn ledger() -> HistoryLedger {
        HistoryLedger::from_rows(vec![
            LedgerRow::new("a@x", "b@x", 2),
            LedgerRow::new("a@x", "c@x", 3),
            LedgerRow::new("c@x", "a@x", 7),
        ])
        .unwrap()
    }

    fn participant(email: &str, ledger: &HistoryLedger) -> Participant {
        Participant::new(&SubscriberRecord::new(email, email), ledger)
    }

    #[test]
    fn test_scores_use_own_slice_only() {
        let ledger = ledger();
        let a = participant("a@x", &ledger);
        let b = participant("b@x", &ledger);
        let c = participant("c@x", &ledger);

        assert_eq!(a.past_pairing_score(&b), 2);
        assert_eq!(a.past_pairing_score(&c), 3);
        assert_eq!(b.past_pairing_score(&a), 0);
        assert_eq!(c.past_pairing_score(&a), 7);
    }

    #[test]
    fn test_total_load_sums_counts() {
        let ledger = ledger();
        assert_eq!(participant("a@x", &ledger).total_historical_load(), 5);
        assert_eq!(participant("b@x", &ledger).total_historical_load(), 0);
    }

    #[test]
    fn test_periodic_inclusion() {
        let ledger = HistoryLedger::new();
        let every_other = Participant::new(
            &SubscriberRecord::new("a", "a@x").with_interval(2),
            &ledger,
        );
        assert!(every_other.is_eligible_this_run(&RunContext { week: 10 }));
        assert!(!every_other.is_eligible_this_run(&RunContext { week: 11 }));

        let weekly = participant("b@x", &ledger);
        assert!(weekly.is_eligible_this_run(&RunContext { week: 11 }));
    }

    #[test]
    fn test_exclusive_acceptance() {
        let ledger = HistoryLedger::new();
        let mon = Availability::new([Weekday::Mon]);
        let tue = Availability::new([Weekday::Tue]);
        let a = Participant::new(
            &SubscriberRecord::new("a", "a@x")
                .with_availability(mon.clone())
                .with_exclusive(true),
            &ledger,
        );
        let b = Participant::new(&SubscriberRecord::new("b", "b@x").with_availability(tue), &ledger);
        let c = Participant::new(&SubscriberRecord::new("c", "c@x").with_availability(mon), &ledger);

        assert!(!a.accepts(&b));
        assert!(a.accepts(&c));
        assert!(b.accepts(&a));
        assert_eq!(a.availability_overlap(&c), 1);
    }
}
