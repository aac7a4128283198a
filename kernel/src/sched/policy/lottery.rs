//! Лотерейный планировщик / Lottery policy
//!
//! Каждый ожидающий держит диапазон билетов длиной в свой эффективный вес.
//! Тянем одно число в `[0, сумма)`; чей диапазон его содержит — тот выиграл.
//! Each waiter holds a ticket range as long as its effective weight. One
//! number is drawn in `[0, total)`; whoever's range contains it wins.
//!
//! Донорство складывается (а не берётся максимум): владелец получает
//! поддержку всех ждущих сразу.
//! Donations add up (instead of taking the max): the owner is backed by all
//! its waiters at once.
//!
//! Билетов могут быть миллиарды, поэтому состояние на каждый билет не
//! хранится — только сумма.
//! There can be billions of tickets, so no per-ticket state is kept, only
//! sums.

use super::Policy;
use crate::config::SchedConfig;
use crate::sched::queue::WaitSet;
use crate::sched::rng::{TicketSource, XorShift64};
use crate::sched::{ThreadId, Weight};

/// Лотерея с подключаемым источником случайности.
/// Lottery with a pluggable randomness source.
#[derive(Debug, Clone)]
pub struct Lottery<R: TicketSource = XorShift64> {
    source: R,
}

impl<R: TicketSource> Lottery<R> {
    pub const fn new(source: R) -> Self {
        Self { source }
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }
}

impl Lottery<XorShift64> {
    pub const fn seeded(seed: u64) -> Self {
        Self::new(XorShift64::new(seed))
    }

    pub const fn from_config(config: &SchedConfig) -> Self {
        Self::seeded(config.seed)
    }
}

impl Default for Lottery<XorShift64> {
    fn default() -> Self {
        Self::from_config(&SchedConfig::new())
    }
}

impl<R: TicketSource> Policy for Lottery<R> {
    const NAME: &'static str = "lottery";
    const MINIMUM: Weight = 0;
    const MAXIMUM: Weight = u32::MAX as Weight;
    const DEFAULT: Weight = 1;

    fn contribution(waiters: &WaitSet) -> Weight {
        waiters.total()
    }

    fn combine(acc: Weight, contribution: Weight) -> Weight {
        acc.saturating_add(contribution)
    }

    fn select(&mut self, waiters: &WaitSet) -> Option<ThreadId> {
        let total = waiters.total();
        if total == 0 {
            return None;
        }

        let mut ticket = self.source.draw(total);
        for key in waiters.iter() {
            if ticket < key.weight() {
                return Some(key.thread());
            }
            ticket -= key.weight();
        }

        // Сумма насытилась — хвост диапазона отдаём последнему с билетами.
        // The total saturated; the tail of the range goes to the last holder.
        waiters.iter().rev().find(|k| k.weight() > 0).map(|k| k.thread())
    }
}
