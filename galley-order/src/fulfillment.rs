use crate::ledger::{PickupLedger, PickupSnapshot};
use crate::models::{CartLine, KitchenOrderView, OrderMeta, WorkItem};
use chrono::{DateTime, Utc};
use galley_core::TransitionSink;
use galley_shared::{
    ComponentCount, ComponentKind, FulfillmentStatus, PickupItemSummary, PickupRecord, PickupRecordedEvent,
    WorkItemId, WorkItemTransitionedEvent,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// A work item plus the lock that serializes its transitions
struct Slot {
    id: WorkItemId,
    kitchen: String,
    item: Mutex<WorkItem>,
}

/// A submitted order as the kitchens track it
struct Ticket {
    order_id: Uuid,
    meta: OrderMeta,
    lines: Vec<CartLine>,
    slots: Vec<Slot>,
}

impl Ticket {
    fn slot(&self, id: &WorkItemId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == *id)
    }

    fn line(&self, id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.item.lock().status.is_terminal())
    }

    /// Addons and combos of a main item's line that the same kitchen prepares
    fn companions<'a>(&'a self, main: &'a WorkItem) -> impl Iterator<Item = &'a Slot> + 'a {
        self.slots.iter().filter(move |s| {
            s.id.cart_line_id == main.id.cart_line_id && s.id.kind != ComponentKind::Main && s.kitchen == main.kitchen
        })
    }

    fn work_items(&self, kitchen: Option<&str>) -> Vec<WorkItem> {
        self.slots
            .iter()
            .filter(|s| kitchen.map_or(true, |k| s.kitchen == k))
            .map(|s| s.item.lock().clone())
            .collect()
    }

    fn pickup_snapshot(&self, item: &WorkItem, handed_over: &[WorkItem], at: DateTime<Utc>) -> PickupSnapshot {
        let line = self.line(item.id.cart_line_id);
        let counts = |kind: ComponentKind| -> Vec<ComponentCount> {
            handed_over
                .iter()
                .filter(|c| c.kind() == kind)
                .map(|c| ComponentCount {
                    name: c.name().to_string(),
                    quantity: c.quantity,
                })
                .collect()
        };
        let (addons, combos) = (counts(ComponentKind::Addon), counts(ComponentKind::Combo));

        PickupSnapshot {
            record_id: item.id.storage_key(),
            customer_name: self.meta.customer_name.inner().clone(),
            order_type: self.meta.order_type,
            table: self.meta.table.clone(),
            items: vec![PickupItemSummary {
                name: item.name().to_string(),
                kind: item.kind(),
                quantity: item.quantity,
                category: line.map(|l| l.category.clone()).unwrap_or_default(),
                kitchen: item.kitchen.clone(),
                addons,
                combos,
            }],
            picked_up_at: at,
        }
    }
}

struct Transition {
    item: WorkItem,
    record: Option<PickupRecord>,
    /// Same-kitchen components picked up along with a main item
    handed_over: Vec<WorkItem>,
}

#[derive(Default)]
struct Registry {
    tickets: HashMap<Uuid, Arc<Ticket>>,
    /// Order ids in submission order
    arrival: Vec<Uuid>,
    line_owner: HashMap<Uuid, Uuid>,
}

/// Per-work-item status tracking across all kitchens.
///
/// The registry lock only guards ticket lookup; each work item has its own mutex, so
/// transitions on one item are linearizable without blocking other kitchens.
pub struct FulfillmentTracker {
    registry: RwLock<Registry>,
    ledger: Arc<PickupLedger>,
    sink: Option<Arc<dyn TransitionSink>>,
    unsent: Mutex<Vec<WorkItemTransitionedEvent>>,
}

impl FulfillmentTracker {
    pub fn new(ledger: Arc<PickupLedger>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            ledger,
            sink: None,
            unsent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TransitionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn ledger(&self) -> &Arc<PickupLedger> {
        &self.ledger
    }

    /// Register a submitted order. Every work item starts Pending.
    pub fn seed(
        &self,
        order_id: Uuid,
        meta: OrderMeta,
        lines: Vec<CartLine>,
        work_items: Vec<WorkItem>,
    ) -> Result<(), FulfillmentError> {
        let mut registry = self.registry.write();
        if registry.tickets.contains_key(&order_id) {
            return Err(FulfillmentError::DuplicateOrder(order_id));
        }
        if let Some(line) = lines.iter().find(|l| registry.line_owner.contains_key(&l.id)) {
            return Err(FulfillmentError::DuplicateLine(line.id));
        }

        let slots = work_items
            .into_iter()
            .map(|mut item| {
                item.status = FulfillmentStatus::Pending;
                Slot {
                    id: item.id.clone(),
                    kitchen: item.kitchen.clone(),
                    item: Mutex::new(item),
                }
            })
            .collect();

        for line in &lines {
            registry.line_owner.insert(line.id, order_id);
        }
        registry.tickets.insert(
            order_id,
            Arc::new(Ticket {
                order_id,
                meta,
                lines,
                slots,
            }),
        );
        registry.arrival.push(order_id);
        Ok(())
    }

    /// Pending → Preparing
    pub fn mark_preparing(&self, id: &WorkItemId) -> Result<WorkItem, FulfillmentError> {
        let ticket = self.ticket_for(id)?;
        let slot = ticket
            .slot(id)
            .ok_or_else(|| FulfillmentError::WorkItemNotFound(id.clone()))?;
        self.advance(&ticket, slot, FulfillmentStatus::Preparing)
            .map(|t| t.item)
            .inspect_err(log_rejected)
    }

    /// Pending or Preparing → Prepared
    pub fn mark_prepared(&self, id: &WorkItemId) -> Result<WorkItem, FulfillmentError> {
        let ticket = self.ticket_for(id)?;
        let slot = ticket
            .slot(id)
            .ok_or_else(|| FulfillmentError::WorkItemNotFound(id.clone()))?;
        self.advance(&ticket, slot, FulfillmentStatus::Prepared)
            .map(|t| t.item)
            .inspect_err(log_rejected)
    }

    /// Prepared → PickedUp, appending exactly one ledger record
    pub fn mark_picked_up(&self, id: &WorkItemId) -> Result<PickupRecord, FulfillmentError> {
        let ticket = self.ticket_for(id)?;
        let slot = ticket
            .slot(id)
            .ok_or_else(|| FulfillmentError::WorkItemNotFound(id.clone()))?;
        let Transition { item, record, .. } = self
            .advance(&ticket, slot, FulfillmentStatus::PickedUp)
            .inspect_err(log_rejected)?;

        let record = record.ok_or_else(|| FulfillmentError::WorkItemNotFound(item.id.clone()))?;
        tracing::info!(
            order_id = %ticket.order_id,
            work_item = %item.id,
            kitchen = %item.kitchen,
            "Work item picked up"
        );
        Ok(record)
    }

    /// Mark every work item of one cart line at one kitchen prepared.
    /// Items already past Prepared are left alone; returns how many moved.
    pub fn mark_line_prepared(&self, cart_line_id: Uuid, kitchen: &str) -> Result<usize, FulfillmentError> {
        let ticket = {
            let registry = self.registry.read();
            registry
                .line_owner
                .get(&cart_line_id)
                .and_then(|order_id| registry.tickets.get(order_id))
                .cloned()
        }
        .ok_or_else(|| FulfillmentError::not_routed(cart_line_id, kitchen))?;

        let slots: Vec<&Slot> = ticket
            .slots
            .iter()
            .filter(|s| s.id.cart_line_id == cart_line_id && s.kitchen == kitchen)
            .collect();
        if slots.is_empty() {
            return Err(FulfillmentError::not_routed(cart_line_id, kitchen));
        }

        let prepared = slots
            .into_iter()
            .filter(|slot| self.advance(&ticket, slot, FulfillmentStatus::Prepared).is_ok())
            .count();
        Ok(prepared)
    }

    /// Pick up every Prepared work item of the given orders at one kitchen.
    ///
    /// Each item is an independent attempt: anything not Prepared is skipped and
    /// nothing is rolled back. Returns how many items were picked up.
    pub fn bulk_pick_up(&self, order_ids: &[Uuid], kitchen: &str) -> usize {
        let mut picked = 0;
        for order_id in order_ids {
            let Some(ticket) = self.registry.read().tickets.get(order_id).cloned() else {
                tracing::debug!(%order_id, "Bulk pickup skipped unknown order");
                continue;
            };
            for slot in ticket.slots.iter().filter(|s| s.kitchen == kitchen) {
                if let Ok(t) = self.advance(&ticket, slot, FulfillmentStatus::PickedUp) {
                    picked += 1 + t.handed_over.len();
                }
            }
        }
        tracing::info!(kitchen, orders = order_ids.len(), picked, "Bulk pickup");
        picked
    }

    pub fn work_item(&self, id: &WorkItemId) -> Option<WorkItem> {
        let ticket = self.ticket_for(id).ok()?;
        let slot = ticket.slot(id)?;
        let item = slot.item.lock().clone();
        Some(item)
    }

    pub fn order_work_items(&self, order_id: Uuid) -> Result<Vec<WorkItem>, FulfillmentError> {
        Ok(self.ticket(order_id)?.work_items(None))
    }

    /// An order is complete once every work item is picked up
    pub fn is_complete(&self, order_id: Uuid) -> Result<bool, FulfillmentError> {
        Ok(self.ticket(order_id)?.is_complete())
    }

    /// Kitchens with open work, in the order they first appear
    pub fn kitchens(&self) -> Vec<String> {
        let mut kitchens: Vec<String> = Vec::new();
        for ticket in self.open_tickets() {
            for slot in &ticket.slots {
                if !kitchens.contains(&slot.kitchen) {
                    kitchens.push(slot.kitchen.clone());
                }
            }
        }
        kitchens
    }

    /// Open orders with work at `kitchen`, showing only that kitchen's work items
    pub fn kitchen_view(&self, kitchen: &str) -> Vec<KitchenOrderView> {
        self.open_tickets()
            .into_iter()
            .filter_map(|ticket| {
                let work_items = ticket.work_items(Some(kitchen));
                (!work_items.is_empty()).then(|| KitchenOrderView {
                    order_id: ticket.order_id,
                    meta: ticket.meta.clone(),
                    work_items,
                })
            })
            .collect()
    }

    /// Re-send transition events and pickup records the sink rejected earlier, and ask
    /// the sink to retry writes its store gave up on
    pub fn retry_pending(&self) -> usize {
        let Some(sink) = &self.sink else {
            return 0;
        };

        let events = std::mem::take(&mut *self.unsent.lock());
        let mut sent = 0;
        let mut failed = Vec::new();
        for event in events {
            match sink.status_changed(&event) {
                Ok(()) => sent += 1,
                Err(_) => failed.push(event),
            }
        }
        self.unsent.lock().extend(failed);

        sent + self.ledger.retry_unsynced(sink.as_ref()) + sink.redeliver()
    }

    /// Events not yet accepted by the sink plus writes the sink could not store
    pub fn pending_sync(&self) -> usize {
        let downstream = self.sink.as_ref().map_or(0, |sink| sink.backlog());
        self.unsent.lock().len() + self.ledger.unsynced().len() + downstream
    }

    /// Forget the oldest completed orders beyond the newest `keep`. Returns how many
    /// were dropped; their work items are no longer found afterwards.
    pub fn prune_completed(&self, keep: usize) -> usize {
        let completed: Vec<Arc<Ticket>> = self.all_tickets().into_iter().filter(|t| t.is_complete()).collect();
        let excess = completed.len().saturating_sub(keep);
        if excess == 0 {
            return 0;
        }

        let evicted = &completed[..excess];
        let ids: HashSet<Uuid> = evicted.iter().map(|t| t.order_id).collect();
        let mut registry = self.registry.write();
        for ticket in evicted {
            registry.tickets.remove(&ticket.order_id);
            for line in &ticket.lines {
                registry.line_owner.remove(&line.id);
            }
        }
        registry.arrival.retain(|order_id| !ids.contains(order_id));
        tracing::debug!(evicted = excess, "Completed orders pruned");
        excess
    }

    fn ticket(&self, order_id: Uuid) -> Result<Arc<Ticket>, FulfillmentError> {
        self.registry
            .read()
            .tickets
            .get(&order_id)
            .cloned()
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }

    fn ticket_for(&self, id: &WorkItemId) -> Result<Arc<Ticket>, FulfillmentError> {
        let registry = self.registry.read();
        registry
            .line_owner
            .get(&id.cart_line_id)
            .and_then(|order_id| registry.tickets.get(order_id))
            .cloned()
            .ok_or_else(|| FulfillmentError::WorkItemNotFound(id.clone()))
    }

    /// Every ticket in submission order
    fn all_tickets(&self) -> Vec<Arc<Ticket>> {
        let registry = self.registry.read();
        registry
            .arrival
            .iter()
            .filter_map(|order_id| registry.tickets.get(order_id).cloned())
            .collect()
    }

    fn open_tickets(&self) -> Vec<Arc<Ticket>> {
        self.all_tickets().into_iter().filter(|t| !t.is_complete()).collect()
    }

    /// The single guarded state change. The ledger append happens under the work
    /// item's lock, so a PickedUp item always has its record.
    ///
    /// Picking up a main item also hands over the Prepared addons and combos its
    /// kitchen made for the same line; they go into the main item's record and get
    /// none of their own.
    fn advance(&self, ticket: &Ticket, slot: &Slot, to: FulfillmentStatus) -> Result<Transition, FulfillmentError> {
        let mut item = slot.item.lock();
        let from = item.status;
        if !from.can_transition_to(to) {
            return Err(FulfillmentError::InvalidTransition {
                id: item.id.clone(),
                from,
                to,
            });
        }
        item.status = to;

        // lock order is always main item, then its companions
        let mut companions: Vec<MutexGuard<'_, WorkItem>> = Vec::new();
        if to == FulfillmentStatus::PickedUp && item.kind() == ComponentKind::Main {
            for other in ticket.companions(&item) {
                let mut guard = other.item.lock();
                if guard.status == FulfillmentStatus::Prepared {
                    guard.status = FulfillmentStatus::PickedUp;
                    companions.push(guard);
                }
            }
        }
        let handed_over: Vec<WorkItem> = companions.iter().map(|g| (**g).clone()).collect();

        let record = (to == FulfillmentStatus::PickedUp).then(|| {
            self.ledger
                .record(ticket.order_id, ticket.pickup_snapshot(&item, &handed_over, Utc::now()))
        });
        let snapshot = item.clone();
        drop(companions);
        drop(item);

        self.publish(ticket.order_id, &snapshot, from, record.as_ref());
        for companion in &handed_over {
            self.publish(ticket.order_id, companion, FulfillmentStatus::Prepared, None);
        }
        Ok(Transition {
            item: snapshot,
            record,
            handed_over,
        })
    }

    fn publish(&self, order_id: Uuid, item: &WorkItem, from: FulfillmentStatus, record: Option<&PickupRecord>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let event = WorkItemTransitionedEvent {
            work_item: item.id.clone(),
            order_id,
            kitchen: item.kitchen.clone(),
            from,
            to: item.status,
            timestamp: Utc::now().timestamp_millis(),
        };
        if let Err(e) = sink.status_changed(&event) {
            tracing::warn!(work_item = %item.id, "Status change not synced, queued for retry: {}", e);
            self.unsent.lock().push(event);
        }

        if let Some(record) = record {
            let event = PickupRecordedEvent {
                record_id: record.id.clone(),
                order_id,
                kitchen: item.kitchen.clone(),
                timestamp: record.picked_up_at.timestamp_millis(),
            };
            if let Err(e) = sink.pickup_recorded(record, &event) {
                tracing::warn!(record_id = %record.id, "Pickup record not synced, queued for retry: {}", e);
                self.ledger.mark_unsynced(&record.id);
            }
        }
    }
}

fn log_rejected(err: &FulfillmentError) {
    if let FulfillmentError::InvalidTransition { id, from, to } = err {
        tracing::warn!(work_item = %id, %from, %to, "Transition rejected");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FulfillmentError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order already submitted: {0}")]
    DuplicateOrder(Uuid),

    #[error("Cart line already belongs to an order: {0}")]
    DuplicateLine(Uuid),

    #[error("Work item not found: {0}")]
    WorkItemNotFound(WorkItemId),

    #[error("Cart line {cart_line_id} has no work at kitchen {kitchen}")]
    NotRoutedHere { cart_line_id: Uuid, kitchen: String },

    #[error("Invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: WorkItemId,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },
}

impl FulfillmentError {
    fn not_routed(cart_line_id: Uuid, kitchen: &str) -> Self {
        FulfillmentError::NotRoutedHere {
            cart_line_id,
            kitchen: kitchen.to_string(),
        }
    }
}
