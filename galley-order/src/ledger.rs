use chrono::{DateTime, Duration, Utc};
use galley_core::TransitionSink;
use galley_shared::{OrderType, PickupItemSummary, PickupRecord, PickupRecordedEvent, TableRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Everything the pass knows about a pickup at the moment it happens
#[derive(Debug, Clone)]
pub struct PickupSnapshot {
    pub record_id: String,
    pub customer_name: String,
    pub order_type: OrderType,
    pub table: TableRef,
    pub items: Vec<PickupItemSummary>,
    pub picked_up_at: DateTime<Utc>,
}

/// Filters for a ledger query. Both window bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct PickupQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub kitchen: Option<String>,
    /// Records whose timestamp contains this text are listed first
    pub date: Option<String>,
}

impl PickupQuery {
    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn with_kitchen(mut self, kitchen: Option<&str>) -> Self {
        self.kitchen = kitchen.map(str::to_string);
        self
    }

    pub fn with_date(mut self, date: Option<&str>) -> Self {
        self.date = date.map(str::to_string).filter(|d| !d.is_empty());
        self
    }

    fn admits(&self, record: &PickupRecord) -> bool {
        self.start.map_or(true, |start| record.picked_up_at >= start)
            && self.end.map_or(true, |end| record.picked_up_at <= end)
            && self
                .kitchen
                .as_deref()
                .map_or(true, |kitchen| record.involves_kitchen(kitchen))
    }
}

#[derive(Default)]
struct LedgerInner {
    records: Vec<PickupRecord>,
    by_id: HashMap<String, usize>,
    unsynced: Vec<String>,
}

impl LedgerInner {
    fn append(&mut self, record: PickupRecord) -> bool {
        if self.by_id.contains_key(&record.id) {
            return false;
        }
        self.by_id.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }
}

/// Append-only log of completed pickups
pub struct PickupLedger {
    inner: RwLock<LedgerInner>,
    rolling_window: Duration,
}

impl Default for PickupLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PickupLedger {
    pub fn new() -> Self {
        Self::with_rolling_window(Duration::minutes(60))
    }

    pub fn with_rolling_window(rolling_window: Duration) -> Self {
        Self {
            inner: RwLock::new(LedgerInner::default()),
            rolling_window,
        }
    }

    /// Append a pickup. Recording the same record id again returns the stored record.
    pub fn record(&self, order_id: Uuid, snapshot: PickupSnapshot) -> PickupRecord {
        let mut inner = self.inner.write();
        if let Some(&index) = inner.by_id.get(&snapshot.record_id) {
            return inner.records[index].clone();
        }

        let record = PickupRecord {
            id: snapshot.record_id,
            order_id,
            customer_name: snapshot.customer_name,
            order_type: snapshot.order_type,
            table: snapshot.table,
            items: snapshot.items,
            picked_up_at: snapshot.picked_up_at,
        };
        inner.append(record.clone());
        record
    }

    /// Reload records from the store, skipping ids already present
    pub fn restore(&self, records: impl IntoIterator<Item = PickupRecord>) -> usize {
        let mut inner = self.inner.write();
        let mut restored = 0;
        for record in records {
            if inner.append(record) {
                restored += 1;
            }
        }
        tracing::info!(restored, total = inner.records.len(), "Pickup ledger restored");
        restored
    }

    pub fn get(&self, id: &str) -> Option<PickupRecord> {
        let inner = self.inner.read();
        inner.by_id.get(id).map(|&index| inner.records[index].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Newest first. With a date filter, matching records come first, then the rest,
    /// each group newest first.
    pub fn query(&self, query: &PickupQuery) -> Vec<PickupRecord> {
        let mut records: Vec<PickupRecord> = {
            let inner = self.inner.read();
            inner
                .records
                .iter()
                .rev()
                .filter(|record| query.admits(record))
                .cloned()
                .collect()
        };
        // stable, so equal timestamps keep the most recent append first
        records.sort_by(|a, b| b.picked_up_at.cmp(&a.picked_up_at));

        match query.date.as_deref() {
            Some(date) => {
                let (mut matching, rest): (Vec<_>, Vec<_>) =
                    records.into_iter().partition(|record| record.matches_date(date));
                matching.extend(rest);
                matching
            }
            None => records,
        }
    }

    /// Pickups within the rolling window ending at `now`
    pub fn recent(&self, now: DateTime<Utc>, kitchen: Option<&str>, date: Option<&str>) -> Vec<PickupRecord> {
        let query = PickupQuery::between(now - self.rolling_window, now)
            .with_kitchen(kitchen)
            .with_date(date);
        self.query(&query)
    }

    pub fn all_time(&self, kitchen: Option<&str>, date: Option<&str>) -> Vec<PickupRecord> {
        self.query(&PickupQuery::all_time().with_kitchen(kitchen).with_date(date))
    }

    /// Remember a record the sink did not accept
    pub fn mark_unsynced(&self, id: &str) {
        let mut inner = self.inner.write();
        if !inner.unsynced.iter().any(|pending| pending == id) {
            inner.unsynced.push(id.to_string());
        }
    }

    pub fn unsynced(&self) -> Vec<PickupRecord> {
        let inner = self.inner.read();
        inner
            .unsynced
            .iter()
            .filter_map(|id| inner.by_id.get(id).map(|&index| inner.records[index].clone()))
            .collect()
    }

    /// Hand unsynced records to the sink again; returns how many were accepted
    pub fn retry_unsynced(&self, sink: &dyn TransitionSink) -> usize {
        let mut accepted = Vec::new();
        for record in self.unsynced() {
            let event = PickupRecordedEvent {
                record_id: record.id.clone(),
                order_id: record.order_id,
                kitchen: record.items.first().map(|i| i.kitchen.clone()).unwrap_or_default(),
                timestamp: record.picked_up_at.timestamp_millis(),
            };
            match sink.pickup_recorded(&record, &event) {
                Ok(()) => accepted.push(record.id),
                Err(e) => tracing::warn!(record_id = %record.id, "Pickup record still unsynced: {}", e),
            }
        }

        if !accepted.is_empty() {
            self.inner.write().unsynced.retain(|id| !accepted.contains(id));
        }
        accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use galley_core::{CoreError, CoreResult};
    use galley_shared::{ComponentKind, WorkItemTransitionedEvent};
    use parking_lot::Mutex;

    fn snapshot(id: &str, kitchen: &str, at: DateTime<Utc>) -> PickupSnapshot {
        PickupSnapshot {
            record_id: id.to_string(),
            customer_name: "Asha".to_string(),
            order_type: OrderType::DineIn,
            table: TableRef::Table("4".to_string()),
            items: vec![PickupItemSummary {
                name: "Burger".to_string(),
                kind: ComponentKind::Main,
                quantity: 1,
                category: "mains".to_string(),
                kitchen: kitchen.to_string(),
                addons: vec![],
                combos: vec![],
            }],
            picked_up_at: at,
        }
    }

    fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_record_is_idempotent_by_id() {
        let ledger = PickupLedger::new();
        let order = Uuid::new_v4();
        let first = ledger.record(order, snapshot("a", "Grill", at(6, 9, 10)));
        let again = ledger.record(order, snapshot("a", "Grill", at(6, 9, 11)));

        assert_eq!(first, again);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("a").map(|r| r.picked_up_at), Some(at(6, 9, 10)));
    }

    #[test]
    fn test_date_filter_orders_matches_first() {
        let ledger = PickupLedger::new();
        let order = Uuid::new_v4();
        ledger.record(order, snapshot("a", "Grill", at(6, 9, 10)));
        ledger.record(order, snapshot("b", "Grill", at(6, 8, 9)));
        ledger.record(order, snapshot("c", "Grill", at(6, 9, 11)));

        let ids = |records: Vec<PickupRecord>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(ledger.all_time(None, None)), vec!["c", "a", "b"]);
        assert_eq!(ids(ledger.all_time(None, Some("06-09"))), vec!["c", "a", "b"]);
        assert_eq!(ids(ledger.all_time(None, Some("06-08"))), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rolling_window_and_kitchen_filter() {
        let ledger = PickupLedger::new();
        let order = Uuid::new_v4();
        let now = at(6, 9, 12);
        ledger.record(order, snapshot("old", "Grill", now - Duration::minutes(61)));
        ledger.record(order, snapshot("edge", "Grill", now - Duration::minutes(60)));
        ledger.record(order, snapshot("bar", "Bar", now - Duration::minutes(5)));

        let recent = ledger.recent(now, None, None);
        assert_eq!(recent.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["bar", "edge"]);

        let grill = ledger.recent(now, Some("Grill"), None);
        assert_eq!(grill.len(), 1);
        assert_eq!(ledger.all_time(Some("Grill"), None).len(), 2);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let ledger = PickupLedger::new();
        let order = Uuid::new_v4();
        ledger.record(order, snapshot("start", "Grill", at(6, 9, 10)));
        ledger.record(order, snapshot("end", "Grill", at(6, 9, 12)));
        ledger.record(order, snapshot("after", "Grill", at(6, 9, 13)));
        ledger.record(order, snapshot("before", "Grill", at(6, 9, 9)));

        let ids: Vec<_> = ledger
            .query(&PickupQuery::between(at(6, 9, 10), at(6, 9, 12)))
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["end", "start"]);
    }

    #[test]
    fn test_window_and_date_filter_combined() {
        let ledger = PickupLedger::new();
        let order = Uuid::new_v4();
        ledger.record(order, snapshot("a", "Grill", at(6, 8, 23)));
        ledger.record(order, snapshot("b", "Grill", at(6, 9, 1)));
        ledger.record(order, snapshot("c", "Grill", at(6, 9, 2)));
        ledger.record(order, snapshot("outside", "Grill", at(6, 9, 5)));

        let query = PickupQuery::between(at(6, 8, 22), at(6, 9, 3)).with_date(Some("06-08"));
        let ids: Vec<_> = ledger.query(&query).into_iter().map(|r| r.id).collect();
        // the window excludes, the date only reorders
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_restore_skips_known_ids() {
        let source = PickupLedger::new();
        let order = Uuid::new_v4();
        source.record(order, snapshot("a", "Grill", at(6, 9, 10)));
        source.record(order, snapshot("b", "Grill", at(6, 9, 11)));

        let ledger = PickupLedger::new();
        ledger.record(order, snapshot("a", "Grill", at(6, 9, 10)));
        assert_eq!(ledger.restore(source.all_time(None, None)), 1);
        assert_eq!(ledger.len(), 2);
    }

    struct FlakySink {
        fail: Mutex<bool>,
        accepted: Mutex<Vec<String>>,
    }

    impl TransitionSink for FlakySink {
        fn status_changed(&self, _event: &WorkItemTransitionedEvent) -> CoreResult<()> {
            Ok(())
        }

        fn pickup_recorded(&self, record: &PickupRecord, _event: &PickupRecordedEvent) -> CoreResult<()> {
            if *self.fail.lock() {
                return Err(CoreError::SinkUnavailable("queue closed".to_string()));
            }
            self.accepted.lock().push(record.id.clone());
            Ok(())
        }
    }

    #[test]
    fn test_retry_unsynced() {
        let ledger = PickupLedger::new();
        ledger.record(Uuid::new_v4(), snapshot("a", "Grill", at(6, 9, 10)));
        ledger.mark_unsynced("a");
        ledger.mark_unsynced("a");

        let sink = FlakySink {
            fail: Mutex::new(true),
            accepted: Mutex::new(vec![]),
        };
        assert_eq!(ledger.retry_unsynced(&sink), 0);
        assert_eq!(ledger.unsynced().len(), 1);

        *sink.fail.lock() = false;
        assert_eq!(ledger.retry_unsynced(&sink), 1);
        assert!(ledger.unsynced().is_empty());
        assert_eq!(*sink.accepted.lock(), vec!["a".to_string()]);
    }
}
