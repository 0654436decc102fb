//! Background persistence of fulfillment state.
//!
//! The tracker hands every transition to a `SyncHandle`, which only enqueues. A single
//! worker task drains the queue and writes to the configured stores, retrying
//! transient failures with exponential backoff. Every write is keyed (work item key or
//! pickup record id), so a retry can never create a duplicate.

use crate::app_config::PersistenceConfig;
use galley_core::{CoreError, CoreResult, PickupStore, TransitionSink, WorkItemStore};
use galley_shared::{PickupRecord, PickupRecordedEvent, WorkItemTransitionedEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub enum SyncCommand {
    Status(WorkItemTransitionedEvent),
    Pickup(PickupRecord),
}

impl SyncCommand {
    fn key(&self) -> String {
        match self {
            SyncCommand::Status(event) => event.work_item.storage_key(),
            SyncCommand::Pickup(record) => record.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the given retry (1-based): base, 2x base, 4x base, ...
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl From<&PersistenceConfig> for RetryPolicy {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

/// Writes that failed after every retry, kept until `SyncHandle::redeliver`
#[derive(Clone, Default)]
pub struct DeadLetters(Arc<Mutex<Vec<SyncCommand>>>);

impl DeadLetters {
    pub fn snapshot(&self) -> Vec<SyncCommand> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, command: SyncCommand) {
        self.0.lock().push(command);
    }

    fn take(&self) -> Vec<SyncCommand> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Sending side of the persistence queue
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncCommand>,
    dead_letters: DeadLetters,
}

impl SyncHandle {
    pub fn dead_letters(&self) -> DeadLetters {
        self.dead_letters.clone()
    }

    fn enqueue(&self, command: SyncCommand) -> CoreResult<()> {
        self.tx
            .try_send(command)
            .map_err(|e| CoreError::SinkUnavailable(e.to_string()))
    }
}

impl TransitionSink for SyncHandle {
    fn status_changed(&self, event: &WorkItemTransitionedEvent) -> CoreResult<()> {
        self.enqueue(SyncCommand::Status(event.clone()))
    }

    fn pickup_recorded(&self, record: &PickupRecord, event: &PickupRecordedEvent) -> CoreResult<()> {
        debug!(record_id = %event.record_id, kitchen = %event.kitchen, "Queueing pickup record");
        self.enqueue(SyncCommand::Pickup(record.clone()))
    }

    /// Put dead letters back on the queue; whatever does not fit stays dead-lettered
    fn redeliver(&self) -> usize {
        let mut requeued = 0;
        let mut commands = self.dead_letters.take().into_iter();
        for command in commands.by_ref() {
            match self.tx.try_send(command) {
                Ok(()) => requeued += 1,
                Err(e) => {
                    self.dead_letters.push(e.into_inner());
                    break;
                }
            }
        }
        for command in commands {
            self.dead_letters.push(command);
        }
        if requeued > 0 {
            debug!(requeued, "Dead letters requeued");
        }
        requeued
    }

    fn backlog(&self) -> usize {
        self.dead_letters.len()
    }
}

pub struct PersistenceWorker {
    rx: mpsc::Receiver<SyncCommand>,
    work_items: Arc<dyn WorkItemStore>,
    pickups: Arc<dyn PickupStore>,
    policy: RetryPolicy,
    dead_letters: DeadLetters,
}

impl PersistenceWorker {
    /// Start the worker; it stops once every `SyncHandle` is dropped and the queue is
    /// drained, returning the number of commands written.
    pub fn spawn(
        work_items: Arc<dyn WorkItemStore>,
        pickups: Arc<dyn PickupStore>,
        policy: RetryPolicy,
        capacity: usize,
    ) -> (SyncHandle, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dead_letters = DeadLetters::default();
        let worker = Self {
            rx,
            work_items,
            pickups,
            policy,
            dead_letters: dead_letters.clone(),
        };
        let handle = tokio::spawn(worker.run());
        (SyncHandle { tx, dead_letters }, handle)
    }

    async fn run(mut self) -> usize {
        let mut written = 0;
        while let Some(command) = self.rx.recv().await {
            if self.write_with_retry(&command).await {
                written += 1;
            } else {
                self.dead_letters.push(command);
            }
        }
        debug!(written, "Persistence worker stopped");
        written
    }

    async fn write_with_retry(&self, command: &SyncCommand) -> bool {
        let mut attempt = 1;
        loop {
            match self.write(command).await {
                Ok(()) => return true,
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay(attempt);
                    warn!(key = %command.key(), attempt, ?delay, "Store write failed, retrying: {}", e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(key = %command.key(), attempt, "Store write abandoned: {}", e);
                    return false;
                }
            }
        }
    }

    async fn write(&self, command: &SyncCommand) -> CoreResult<()> {
        match command {
            SyncCommand::Status(event) => self.work_items.put_status(&event.work_item, event.to).await,
            SyncCommand::Pickup(record) => {
                if !self.pickups.put_pickup(record).await? {
                    debug!(record_id = %record.id, "Pickup record already stored");
                }
                Ok(())
            }
        }
    }
}
