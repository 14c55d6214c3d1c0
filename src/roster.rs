//! Everyone's live bets for the current round.
//!
//! The registry tolerates at-least-once, reordered delivery: removing an
//! absent entry is a no-op and upserts replace records wholesale.

use crate::events::{
    LiveBetRecord,
    SessionId,
};
use std::collections::{
    HashMap,
    VecDeque,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Cashed,
    Lost,
    /// Any other non-active status the server may send.
    Neutral,
}

/// Badge for a status string; active bets carry none.
pub fn badge(status: &str) -> Option<Badge> {
    if status == "Active" {
        None
    } else if status.contains("Cashed") {
        Some(Badge::Cashed)
    } else if status.contains("Lost") {
        Some(Badge::Lost)
    } else {
        Some(Badge::Neutral)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RosterEntry {
    pub sid: SessionId,
    pub record: LiveBetRecord,
}

impl RosterEntry {
    pub fn badge(&self) -> Option<Badge> {
        badge(&self.record.status)
    }
}

#[derive(Clone, Debug, Default)]
pub struct LiveBetRegistry {
    records: HashMap<SessionId, LiveBetRecord>,
    // front is the most prominent row
    order: VecDeque<SessionId>,
}

impl LiveBetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, sid: &SessionId) -> Option<&LiveBetRecord> {
        self.records.get(sid)
    }

    pub fn records(&self) -> &HashMap<SessionId, LiveBetRecord> {
        &self.records
    }

    pub fn replace_all(&mut self, records: HashMap<SessionId, LiveBetRecord>) {
        self.clear();
        for (sid, record) in records {
            self.upsert(sid, record);
        }
    }

    pub fn upsert(&mut self, sid: SessionId, record: LiveBetRecord) {
        if self.records.insert(sid.clone(), record).is_none() {
            self.order.push_front(sid);
        }
    }

    pub fn remove(&mut self, sid: &SessionId) {
        if self.records.remove(sid).is_some() {
            self.order.retain(|s| s != sid);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }

    /// Rows in presentation order.
    pub fn entries(&self) -> impl Iterator<Item = RosterEntry> + '_ {
        self.order.iter().filter_map(|sid| {
            self.records.get(sid).map(|record| RosterEntry {
                sid: sid.clone(),
                record: record.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn record(username: &str, status: &str) -> LiveBetRecord {
        LiveBetRecord {
            username: username.into(),
            bet_amount: 5.0,
            auto_cashout_at: None,
            status: status.into(),
        }
    }

    fn sids(registry: &LiveBetRegistry) -> Vec<String> {
        registry.entries().map(|e| e.sid.to_string()).collect()
    }

    #[test]
    fn upsert__prepends_new_entries() {
        // given
        let mut registry = LiveBetRegistry::new();

        // when
        registry.upsert("a".into(), record("alice", "Active"));
        registry.upsert("b".into(), record("bob", "Active"));

        // then
        assert_eq!(sids(&registry), vec!["b", "a"]);
    }

    #[test]
    fn upsert__replaces_existing_entry_in_place() {
        // given
        let mut registry = LiveBetRegistry::new();
        registry.upsert("a".into(), record("alice", "Active"));
        registry.upsert("b".into(), record("bob", "Active"));

        // when
        registry.upsert("a".into(), record("alice", "Cashed @ 2.10x"));

        // then
        assert_eq!(sids(&registry), vec!["b", "a"]);
        assert_eq!(registry.get(&"a".into()).unwrap().status, "Cashed @ 2.10x");
    }

    #[test]
    fn remove__is_a_no_op_for_absent_entries() {
        // given
        let mut registry = LiveBetRegistry::new();
        registry.upsert("a".into(), record("alice", "Active"));

        // when
        registry.remove(&"missing".into());
        registry.remove(&"a".into());
        registry.remove(&"a".into());

        // then
        assert!(registry.is_empty());
        assert_eq!(registry.entries().count(), 0);
    }

    #[test]
    fn replace_all__discards_previous_rows() {
        // given
        let mut registry = LiveBetRegistry::new();
        registry.upsert("old".into(), record("ghost", "Lost"));
        let mut fresh = HashMap::new();
        fresh.insert(SessionId::from("x"), record("xena", "Active"));
        fresh.insert(SessionId::from("y"), record("yuri", "Active"));

        // when
        registry.replace_all(fresh.clone());

        // then
        assert_eq!(registry.records(), &fresh);
        let mut rows = sids(&registry);
        rows.sort();
        assert_eq!(rows, vec!["x", "y"]);
    }

    #[test]
    fn badge__is_hidden_for_active_and_styled_otherwise() {
        assert_eq!(badge("Active"), None);
        assert_eq!(badge("Cashed @ 2.10x"), Some(Badge::Cashed));
        assert_eq!(badge("Cashed@2.10x"), Some(Badge::Cashed));
        assert_eq!(badge("Lost"), Some(Badge::Lost));
        assert_eq!(badge("Pending"), Some(Badge::Neutral));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Upsert(u8, LiveBetRecord),
        Remove(u8),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        let status = prop_oneof![
            Just("Active".to_string()),
            Just("Lost".to_string()),
            (1u32..500).prop_map(|m| format!("Cashed @ {:.2}x", f64::from(m) / 100.0)),
        ];
        prop_oneof![
            4 => (0u8..6, "[a-z]{1,6}", 1u32..1000, status).prop_map(|(k, name, amount, status)| {
                Op::Upsert(k, LiveBetRecord {
                    username: name,
                    bet_amount: f64::from(amount),
                    auto_cashout_at: None,
                    status,
                })
            }),
            2 => (0u8..6).prop_map(Op::Remove),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn registry__matches_ordered_fold_over_a_plain_map(ops in proptest::collection::vec(op(), 0..60)) {
            let mut registry = LiveBetRegistry::new();
            let mut expected: HashMap<SessionId, LiveBetRecord> = HashMap::new();
            for op in ops {
                match op {
                    Op::Upsert(k, rec) => {
                        let sid = SessionId::new(k.to_string());
                        expected.insert(sid.clone(), rec.clone());
                        registry.upsert(sid, rec);
                    }
                    Op::Remove(k) => {
                        let sid = SessionId::new(k.to_string());
                        expected.remove(&sid);
                        registry.remove(&sid);
                    }
                    Op::Clear => {
                        expected.clear();
                        registry.clear();
                    }
                }
            }
            prop_assert_eq!(registry.records(), &expected);
            prop_assert_eq!(registry.entries().count(), expected.len());
        }
    }
}
