//! Донорство веса / Weight donation
//!
//! Пересчёт эффективного веса потока T / Recomputing thread T's weight:
//!   1. если T ждёт в очереди — вынуть его ключ (вес сейчас изменится)
//!      if T waits on a queue, detach its key (the weight is about to change)
//!   2. effective = combine(base, вклад каждой донорской очереди T)
//!      effective = combine(base, contribution of each donating queue T owns)
//!   3. вставить ключ обратно; если вес изменился — то же для владельца
//!      re-attach the key; if the weight changed, repeat for the owner
//!
//! Цепочка ожидания — путь (поток ждёт максимум в одной очереди, у очереди
//! максимум один владелец), поэтому повторный визит означает цикл.
//! The wait chain is a path (a thread waits on at most one queue, a queue has
//! at most one owner), so revisiting a thread means a cycle.

use alloc::collections::BTreeSet;

use super::policy::Policy;
use super::state::ThreadState;
use super::{QueueId, Scheduler, ThreadId};

impl<P: Policy> Scheduler<P> {
    /// Пересчитать `thread` и протолкнуть изменения вверх по цепочке.
    /// Recompute `thread` and push changes up the ownership chain.
    ///
    /// # Panics
    ///
    /// Panics if the chain loops back on itself (a deadlock cycle).
    pub(crate) fn refresh(&mut self, thread: ThreadId) {
        let mut visited = BTreeSet::new();
        let mut next = Some(thread);
        while let Some(current) = next {
            if !visited.insert(current) {
                panic!("donation cycle: {current} reached twice while propagating from {thread}");
            }
            next = self.recompute(current);
        }
    }

    /// Шаги 1–3 для одного потока. Возвращает владельца, которого надо
    /// пересчитать следующим.
    /// Steps 1–3 for a single thread. Returns the owner to recompute next.
    fn recompute(&mut self, thread: ThreadId) -> Option<ThreadId> {
        let Self { threads, queues, .. } = self;
        let state = threads
            .entry(thread)
            .or_insert_with(|| ThreadState::new(P::DEFAULT));

        if let Some(queue) = state.waiting_in.and_then(|q| queues.get_mut(&q)) {
            queue.waiters.remove(&state.key(thread));
        }

        let previous = state.effective;
        state.effective = state
            .owns
            .iter()
            .filter_map(|q| queues.get(q))
            .filter(|q| q.donates())
            .fold(state.base, |acc, q| P::combine(acc, P::contribution(&q.waiters)));

        let changed = state.effective != previous;
        if changed {
            log::debug!(
                "[sched] {} {thread}: effective {previous} -> {} (base {})",
                P::NAME,
                state.effective,
                state.base
            );
        }

        let queue = queues.get_mut(&state.waiting_in?)?;
        queue.waiters.insert(state.key(thread));
        if changed && queue.donates() {
            queue.owner
        } else {
            None
        }
    }

    /// Снять владение `queue` с `thread`; `false`, если он ей не владел.
    /// Drop `thread`'s ownership of `queue`; `false` if it did not own it.
    pub(crate) fn release_queue(&mut self, thread: ThreadId, queue: QueueId) -> bool {
        let owned = self
            .threads
            .get_mut(&thread)
            .is_some_and(|s| s.owns.remove(&queue));
        if !owned {
            return false;
        }
        if let Some(q) = self.queues.get_mut(&queue) {
            q.owner = None;
        }
        self.refresh(thread);
        true
    }
}
