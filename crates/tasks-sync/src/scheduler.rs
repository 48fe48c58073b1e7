//! Tier scheduling: which kind of record is committed next.
//!
//! A save session walks the tiers in dependency order. A tier only starts
//! once every earlier tier's queue has drained, so by the time a record is
//! sent, everything it references has its permanent identity.

use std::collections::VecDeque;

use tasks_core::{RecordKind, StoreKey};
use tasks_store::DirtyQueues;

/// Owns the dirty queues of one save session and the tier plan.
#[derive(Debug, Clone)]
pub struct TierScheduler {
    tiers: Vec<RecordKind>,
    position: usize,
    queues: DirtyQueues,
}

impl TierScheduler {
    /// `tiers` is the commit order, normally [`tasks_core::SchemaGraph::tier_order`].
    pub fn new(tiers: Vec<RecordKind>, queues: DirtyQueues) -> Self {
        TierScheduler {
            tiers,
            position: 0,
            queues,
        }
    }

    /// Moves to the next tier that has work and returns it.
    ///
    /// Empty tiers are skipped. Returns `None` once every tier is done.
    pub fn advance(&mut self) -> Option<RecordKind> {
        while let Some(&kind) = self.tiers.get(self.position) {
            self.position += 1;
            if !self.queues.queue(kind).is_empty() {
                return Some(kind);
            }
        }
        None
    }

    /// The next record to commit in `kind`'s tier.
    pub fn head(&self, kind: RecordKind) -> Option<StoreKey> {
        self.queues.queue(kind).front().copied()
    }

    /// Removes the head of `kind`'s queue once its commit has completed.
    pub fn pop(&mut self, kind: RecordKind) -> Option<StoreKey> {
        self.queues.queue_mut(kind).pop_front()
    }

    pub fn queue(&self, kind: RecordKind) -> &VecDeque<StoreKey> {
        self.queues.queue(kind)
    }

    pub fn queues(&self) -> &DirtyQueues {
        &self.queues
    }

    /// Drops every remaining queued key.
    pub fn clear(&mut self) {
        self.queues.clear();
        self.position = self.tiers.len();
    }

    pub fn is_drained(&self) -> bool {
        self.queues.is_empty()
    }
}
