//! Состояние потока для планировщика / Per-thread scheduling state

use alloc::collections::BTreeSet;

use super::queue::WaitKey;
use super::{QueueId, ThreadId, Weight};

/// Scheduling record of one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadState {
    /// Вес, заданный пользователем / User-assigned weight
    pub(crate) base:        Weight,
    /// Вес с учётом донорства, всегда >= base
    /// Weight including donations, always >= base
    pub(crate) effective:   Weight,
    pub(crate) enqueued_at: u64,
    pub(crate) waiting_in:  Option<QueueId>,
    pub(crate) owns:        BTreeSet<QueueId>,
}

impl ThreadState {
    pub const fn new(base: Weight) -> Self {
        Self {
            base,
            effective: base,
            enqueued_at: 0,
            waiting_in: None,
            owns: BTreeSet::new(),
        }
    }

    pub const fn base(&self) -> Weight { self.base }
    pub const fn effective(&self) -> Weight { self.effective }
    pub const fn waiting_in(&self) -> Option<QueueId> { self.waiting_in }
    pub fn owns(&self) -> &BTreeSet<QueueId> { &self.owns }

    /// Ключ, под которым поток сейчас стоит в `waiting_in`.
    /// Key the thread is currently filed under in `waiting_in`.
    pub(crate) const fn key(&self, thread: ThreadId) -> WaitKey {
        WaitKey::new(self.effective, self.enqueued_at, thread)
    }
}
