//! Scheduler — очереди ожидания с донорством веса
//! Scheduler — wait queues with weight donation
//!
//! Внешние примитивы (lock, condvar, join) используют два контракта:
//! External primitives (lock, condvar, join) rely on two contracts:
//!   wait_for_access(Q, T) — поставить T в очередь Q
//!                           put T on queue Q
//!   next_thread(Q)        — вынуть следующего и передать ему владение Q
//!                           take the next waiter and hand it ownership of Q
//!
//! Все операции требуют `&mut Scheduler` — это эквивалент выключенных
//! прерываний. Между контекстами планировщик делится через `SchedDomain`.
//! Every operation takes `&mut Scheduler`, the equivalent of interrupts
//! being disabled. Across contexts the scheduler is shared via `SchedDomain`.

pub mod domain;
pub mod policy;
pub mod queue;
pub mod rng;
pub mod state;

mod donation;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::config::SchedConfig;
use crate::error::{Result, SchedError};
use policy::Policy;
use queue::{QueueFlags, WaitQueue};
use state::ThreadState;

/// Вес: приоритет или число билетов / Weight: priority or ticket count
pub type Weight = u64;

/// Идентификатор потока / Thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

/// Идентификатор очереди ожидания / Wait queue identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Планировщик, параметризованный политикой.
/// Scheduler parameterized by a policy.
#[derive(Debug)]
pub struct Scheduler<P: Policy> {
    policy:       P,
    threads:      BTreeMap<ThreadId, ThreadState>,
    queues:       BTreeMap<QueueId, WaitQueue>,
    next_queue:   u64,
    /// Логическое время для FIFO среди равных / Logical time for FIFO ties
    clock:        u64,
    current:      Option<ThreadId>,
    trace_queues: bool,
}

impl<P: Policy> Scheduler<P> {
    pub const fn new(policy: P) -> Self {
        Self::with_config(policy, &SchedConfig::new())
    }

    pub const fn with_config(policy: P, config: &SchedConfig) -> Self {
        Self {
            policy,
            threads: BTreeMap::new(),
            queues: BTreeMap::new(),
            next_queue: 1,
            clock: 0,
            current: None,
            trace_queues: config.trace_queues,
        }
    }

    pub fn policy(&self) -> &P { &self.policy }
    pub fn policy_mut(&mut self) -> &mut P { &mut self.policy }

    // ── Очереди / Queues ──────────────────────────────────────────────────────

    /// Создать очередь. `donates = false` для очередей без определённого
    /// владельца (condvar, очередь готовых).
    /// Create a queue. `donates = false` for queues with no definite owner
    /// (condvar, ready queue).
    pub fn allocate_queue(&mut self, donates: bool) -> QueueId {
        let flags = if donates { QueueFlags::DONATES } else { QueueFlags::empty() };
        self.allocate_queue_with(flags)
    }

    pub fn allocate_queue_with(&mut self, flags: QueueFlags) -> QueueId {
        let id = QueueId(self.next_queue);
        self.next_queue += 1;
        self.queues.insert(id, WaitQueue::new(flags));
        log::trace!("[sched] {} queue {id} allocated ({flags:?})", P::NAME);
        id
    }

    pub fn set_queue_name(&mut self, queue: QueueId, name: impl Into<String>) {
        self.queue_mut(queue).name = Some(name.into());
    }

    /// Уничтожить пустую очередь; владелец теряет её донорство.
    /// Dispose of an empty queue; its owner loses the donation.
    ///
    /// # Panics
    ///
    /// Panics if threads still wait on the queue.
    pub fn free_queue(&mut self, queue: QueueId) {
        let q = self.lookup(queue);
        assert!(
            q.waiters.is_empty(),
            "freeing {queue} while {} threads still wait on it",
            q.waiters.len()
        );
        let owner = q.owner;
        if let Some(owner) = owner {
            self.release_queue(owner, queue);
        }
        self.queues.remove(&queue);
        log::trace!("[sched] queue {queue} freed");
    }

    pub fn queue(&self, queue: QueueId) -> Option<&WaitQueue> {
        self.queues.get(&queue)
    }

    pub fn owner_of(&self, queue: QueueId) -> Option<ThreadId> {
        self.lookup(queue).owner
    }

    pub fn waiter_count(&self, queue: QueueId) -> usize {
        self.lookup(queue).waiters.len()
    }

    // ── Ожидание и владение / Waiting and ownership ───────────────────────────

    /// Поставить `thread` в очередь `queue`.
    /// Put `thread` on `queue`.
    ///
    /// Если поток владеет этой очередью, владение снимается: нельзя ждать
    /// самого себя. Владелец очереди пересчитывается.
    /// If the thread owns this queue, that ownership is dropped first: a
    /// thread may not wait on itself. The queue's owner is recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `thread` already waits on some queue.
    pub fn wait_for_access(&mut self, queue: QueueId, thread: ThreadId) {
        self.lookup(queue);
        if let Some(other) = self.waiting_in(thread) {
            panic!("{thread} waits for {queue} while already waiting on {other}");
        }
        self.release_queue(thread, queue);

        self.clock += 1;
        let stamp = self.clock;
        let state = self.state_mut(thread);
        state.waiting_in = Some(queue);
        state.enqueued_at = stamp;
        let key = state.key(thread);

        let q = self.queue_mut(queue);
        q.waiters.insert(key);
        let donee = q.owner.filter(|_| q.donates());
        log::trace!("[sched] {thread} waits for access to {queue}");

        if let Some(owner) = donee {
            self.refresh(owner);
        }
        self.trace_queue(queue);
    }

    /// Передать `thread` владение `queue`.
    /// Give `thread` ownership of `queue`.
    ///
    /// Прежний владелец (если другой) теряет очередь и пересчитывается.
    /// A different previous owner loses the queue and is recomputed.
    pub fn acquire(&mut self, queue: QueueId, thread: ThreadId) {
        if let Some(previous) = self.lookup(queue).owner.filter(|&o| o != thread) {
            self.release_queue(previous, queue);
        }

        let state = self.state_mut(thread);
        let key = state.key(thread);
        let was_waiting = state.waiting_in == Some(queue);
        if was_waiting {
            state.waiting_in = None;
        }
        state.owns.insert(queue);

        let q = self.queue_mut(queue);
        if was_waiting {
            q.waiters.remove(&key);
        }
        q.owner = Some(thread);
        log::trace!("[sched] {thread} acquires {queue}");

        self.refresh(thread);
        self.trace_queue(queue);
    }

    /// Выбрать следующего по политике и передать ему владение.
    /// Pick the next waiter per policy and hand it ownership.
    ///
    /// `None` — некого запускать (пусто, или в лотерее ноль билетов).
    /// `None` means nobody to run (empty, or zero tickets in a lottery).
    pub fn next_thread(&mut self, queue: QueueId) -> Option<ThreadId> {
        let waiters = &Self::lookup_in(&self.queues, queue).waiters;
        let Some(winner) = self.policy.select(waiters) else {
            log::trace!("[sched] {queue}: no eligible thread");
            return None;
        };
        log::trace!("[sched] {queue}: next thread is {winner}");
        self.acquire(queue, winner);
        Some(winner)
    }

    /// Что вернул бы `next_thread` сейчас, без изменений.
    /// What `next_thread` would return right now, without mutating anything.
    pub fn peek_next(&self, queue: QueueId) -> Option<ThreadId>
    where
        P: Clone,
    {
        self.policy.clone().select(&self.lookup(queue).waiters)
    }

    /// Снять владение `queue` без передачи следующему.
    /// Drop ownership of `queue` without handing it on.
    pub fn release(&mut self, queue: QueueId, thread: ThreadId) -> bool {
        self.lookup(queue);
        let released = self.release_queue(thread, queue);
        if released {
            log::trace!("[sched] {thread} releases {queue}");
            self.trace_queue(queue);
        }
        released
    }

    /// Вынуть поток из очереди, в которой он ждёт (отмена ожидания).
    /// Take a thread out of the queue it waits on (wait cancellation).
    pub fn withdraw(&mut self, thread: ThreadId) -> Option<QueueId> {
        let state = self.threads.get_mut(&thread)?;
        let queue = state.waiting_in?;
        let key = state.key(thread);
        state.waiting_in = None;

        let q = self.queue_mut(queue);
        q.waiters.remove(&key);
        let donee = q.owner.filter(|_| q.donates());
        log::trace!("[sched] {thread} withdrawn from {queue}");

        if let Some(owner) = donee {
            self.refresh(owner);
        }
        self.trace_queue(queue);
        Some(queue)
    }

    /// Поток завершился: убрать из очереди, отпустить всё, забыть.
    /// The thread finished: withdraw, release everything, forget it.
    pub fn retire_thread(&mut self, thread: ThreadId) {
        self.withdraw(thread);
        let owned: Vec<QueueId> = self
            .threads
            .get(&thread)
            .map(|s| s.owns.iter().copied().collect())
            .unwrap_or_default();
        for queue in owned {
            self.release_queue(thread, queue);
        }
        self.threads.remove(&thread);
        if self.current == Some(thread) {
            self.current = None;
        }
        log::trace!("[sched] {thread} retired");
    }

    pub fn waiting_in(&self, thread: ThreadId) -> Option<QueueId> {
        self.threads.get(&thread).and_then(|s| s.waiting_in)
    }

    pub fn owned_by(&self, thread: ThreadId) -> impl Iterator<Item = QueueId> + '_ {
        self.threads.get(&thread).into_iter().flat_map(|s| s.owns.iter().copied())
    }

    pub fn thread_state(&self, thread: ThreadId) -> Option<&ThreadState> {
        self.threads.get(&thread)
    }

    // ── Веса / Weights ────────────────────────────────────────────────────────

    pub fn get_weight(&self, thread: ThreadId) -> Weight {
        self.threads.get(&thread).map_or(P::DEFAULT, ThreadState::base)
    }

    pub fn get_effective_weight(&self, thread: ThreadId) -> Weight {
        self.threads.get(&thread).map_or(P::DEFAULT, ThreadState::effective)
    }

    /// Задать базовый вес. Значение вне границ политики — ошибка без
    /// изменений; то же значение — ничего не делает.
    /// Set the base weight. Out-of-bounds values fail with no change; the
    /// current value is a no-op.
    pub fn set_weight(&mut self, thread: ThreadId, weight: Weight) -> Result<()> {
        if !P::in_bounds(weight) {
            return Err(SchedError::InvalidWeight {
                value:   weight,
                minimum: P::MINIMUM,
                maximum: P::MAXIMUM,
            });
        }
        if self.get_weight(thread) == weight {
            return Ok(());
        }
        self.state_mut(thread).base = weight;
        self.refresh(thread);
        Ok(())
    }

    // ── Текущий поток / Current thread ────────────────────────────────────────

    /// Диспетчер сообщает, какой поток сейчас выполняется.
    /// The dispatcher reports which thread is running now.
    pub fn set_current(&mut self, thread: Option<ThreadId>) {
        self.current = thread;
    }

    pub fn current(&self) -> Option<ThreadId> {
        self.current
    }

    pub fn current_weight(&self) -> Option<Weight> {
        self.current.map(|t| self.get_weight(t))
    }

    /// # Panics
    ///
    /// Panics if no current thread was reported.
    pub fn set_current_weight(&mut self, weight: Weight) -> Result<()> {
        let Some(thread) = self.current else {
            panic!("set_current_weight with no current thread");
        };
        self.set_weight(thread, weight)
    }

    /// +1 к весу текущего потока; `false` на максимуме.
    /// +1 to the current thread's weight; `false` at the maximum.
    pub fn increase_weight(&mut self) -> bool {
        let Some(thread) = self.current else {
            log::warn!("[sched] increase_weight with no current thread");
            return false;
        };
        let weight = self.get_weight(thread);
        weight < P::MAXIMUM && self.set_weight(thread, weight + 1).is_ok()
    }

    /// -1 к весу текущего потока; `false` на минимуме.
    /// -1 to the current thread's weight; `false` at the minimum.
    pub fn decrease_weight(&mut self) -> bool {
        let Some(thread) = self.current else {
            log::warn!("[sched] decrease_weight with no current thread");
            return false;
        };
        let weight = self.get_weight(thread);
        weight > P::MINIMUM && self.set_weight(thread, weight - 1).is_ok()
    }

    // ── Отладка / Debugging ───────────────────────────────────────────────────

    /// Список ожидающих очереди (только для отладки).
    /// The queue's waiters (debugging only).
    pub fn describe(&self, queue: QueueId) -> String {
        let q = self.lookup(queue);
        match q.name() {
            Some(name) => q.describe_as(name),
            None => q.describe_as(&format!("{queue}")),
        }
    }

    fn trace_queue(&self, queue: QueueId) {
        if let Some(q) = self.queues.get(&queue) {
            if self.trace_queues || q.traced() {
                log::trace!("[sched] {}", self.describe(queue));
            }
        }
    }

    // ── Внутреннее / Internals ────────────────────────────────────────────────

    fn lookup(&self, queue: QueueId) -> &WaitQueue {
        Self::lookup_in(&self.queues, queue)
    }

    fn lookup_in(queues: &BTreeMap<QueueId, WaitQueue>, queue: QueueId) -> &WaitQueue {
        queues
            .get(&queue)
            .unwrap_or_else(|| panic!("unknown wait queue {queue}"))
    }

    fn queue_mut(&mut self, queue: QueueId) -> &mut WaitQueue {
        self.queues
            .get_mut(&queue)
            .unwrap_or_else(|| panic!("unknown wait queue {queue}"))
    }

    /// Состояние создаётся лениво при первом изменении.
    /// State is created lazily on first mutation.
    fn state_mut(&mut self, thread: ThreadId) -> &mut ThreadState {
        self.threads
            .entry(thread)
            .or_insert_with(|| ThreadState::new(P::DEFAULT))
    }
}
