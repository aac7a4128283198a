//! Очередь ожидания / Wait queue
//!
//! Очередь хранит ожидающих в `BTreeSet`, упорядоченном по
//! (эффективный вес ↓, время постановки ↑, id потока).
//! A queue keeps its waiters in a `BTreeSet` ordered by
//! (effective weight desc, enqueue time asc, thread id).
//!
//! Ключ содержит эффективный вес, поэтому при его изменении ключ надо
//! вынуть и вставить заново (см. donation.rs).
//! The key embeds the effective weight, so a weight change means removing
//! the key and inserting it again (see donation.rs).

use alloc::collections::btree_set::{self, BTreeSet};
use alloc::string::String;
use core::cmp::Reverse;
use core::fmt::Write;

use bitflags::bitflags;

use super::{ThreadId, Weight};

bitflags! {
    /// Флаги очереди / Queue flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct QueueFlags: u8 {
        /// Ожидающие передают вес владельцу.
        /// Waiters donate weight to the owner.
        const DONATES = 1 << 0;
        /// Писать содержимое в лог после каждого изменения.
        /// Dump contents to the log after every mutation.
        const TRACE   = 1 << 1;
    }
}

/// Позиция ожидающего в очереди / A waiter's position in a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WaitKey {
    rank:   Reverse<Weight>,
    stamp:  u64,
    thread: ThreadId,
}

impl WaitKey {
    pub const fn new(weight: Weight, stamp: u64, thread: ThreadId) -> Self {
        Self { rank: Reverse(weight), stamp, thread }
    }

    pub const fn weight(&self) -> Weight { self.rank.0 }
    pub const fn stamp(&self) -> u64     { self.stamp }
    pub const fn thread(&self) -> ThreadId { self.thread }
}

/// Упорядоченное множество ожидающих / Ordered set of waiters
#[derive(Debug, Default)]
pub struct WaitSet(BTreeSet<WaitKey>);

impl WaitSet {
    pub const fn new() -> Self { Self(BTreeSet::new()) }

    pub fn insert(&mut self, key: WaitKey) -> bool { self.0.insert(key) }
    pub fn remove(&mut self, key: &WaitKey) -> bool { self.0.remove(key) }

    /// Самый тяжёлый и самый давний ожидающий.
    /// Heaviest, longest-waiting waiter.
    pub fn first(&self) -> Option<&WaitKey> { self.0.first() }

    pub fn iter(&self) -> btree_set::Iter<'_, WaitKey> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Сумма эффективных весов (насыщающая).
    /// Sum of effective weights (saturating).
    pub fn total(&self) -> Weight {
        self.0.iter().fold(0, |acc: Weight, k| acc.saturating_add(k.weight()))
    }
}

/// Очередь ожидания ресурса / Resource wait queue
#[derive(Debug)]
pub struct WaitQueue {
    pub(crate) waiters: WaitSet,
    pub(crate) flags:   QueueFlags,
    pub(crate) owner:   Option<ThreadId>,
    pub(crate) name:    Option<String>,
}

impl WaitQueue {
    pub const fn new(flags: QueueFlags) -> Self {
        Self { waiters: WaitSet::new(), flags, owner: None, name: None }
    }

    pub fn donates(&self) -> bool { self.flags.contains(QueueFlags::DONATES) }
    pub fn traced(&self) -> bool  { self.flags.contains(QueueFlags::TRACE) }
    pub fn owner(&self) -> Option<ThreadId> { self.owner }
    pub fn waiters(&self) -> &WaitSet { &self.waiters }
    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    /// Debug listing: `<name> [owner T2]: T5(7) T1(6)`.
    pub fn describe(&self) -> String {
        self.describe_as(self.name().unwrap_or("queue"))
    }

    pub fn describe_as(&self, label: &str) -> String {
        let mut out = String::from(label);
        if let Some(owner) = self.owner {
            let _ = write!(out, " [owner {owner}]");
        }
        out.push(':');
        if self.waiters.is_empty() {
            out.push_str(" <empty>");
        }
        for key in self.waiters.iter() {
            let _ = write!(out, " {}({})", key.thread(), key.weight());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavier_first_then_older() {
        let mut set = WaitSet::new();
        set.insert(WaitKey::new(3, 5, ThreadId(1)));
        set.insert(WaitKey::new(6, 9, ThreadId(2)));
        set.insert(WaitKey::new(6, 2, ThreadId(3)));
        let order: Vec<_> = set.iter().map(|k| k.thread()).collect();
        assert_eq!(order, [ThreadId(3), ThreadId(2), ThreadId(1)]);
    }

    #[test]
    fn total_saturates() {
        let mut set = WaitSet::new();
        set.insert(WaitKey::new(Weight::MAX, 0, ThreadId(1)));
        set.insert(WaitKey::new(5, 1, ThreadId(2)));
        assert_eq!(set.total(), Weight::MAX);
    }

    #[test]
    fn describe_lists_owner_and_waiters() {
        let mut q = WaitQueue::new(QueueFlags::DONATES);
        q.name = Some("lock".into());
        q.owner = Some(ThreadId(2));
        q.waiters.insert(WaitKey::new(7, 1, ThreadId(5)));
        q.waiters.insert(WaitKey::new(6, 0, ThreadId(1)));
        assert_eq!(q.describe(), "lock [owner T2]: T5(7) T1(6)");
    }

    #[test]
    fn describe_empty_queue() {
        let q = WaitQueue::new(QueueFlags::empty());
        assert_eq!(q.describe(), "queue: <empty>");
        assert!(!q.donates());
    }
}
