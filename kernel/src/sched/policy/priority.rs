//! Строгий приоритет / Strict priority
//!
//! Всегда выбирается поток с наибольшим эффективным приоритетом; среди
//! равных — тот, кто ждёт дольше всех (FIFO внутри уровня).
//! The thread with the highest effective priority always wins; among equals
//! the one waiting longest (FIFO within a band).
//!
//! Низкоприоритетные потоки могут голодать бесконечно, если всегда есть
//! кто-то выше. Это известное ограничение политики.
//! Lower-priority threads may starve forever while someone higher keeps
//! waiting. This is a known limitation of the policy.

use super::Policy;
use crate::sched::queue::WaitSet;
use crate::sched::{ThreadId, Weight};

/// Планировщик строгого приоритета / Strict priority policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Priority;

impl Policy for Priority {
    const NAME: &'static str = "priority";
    const MINIMUM: Weight = 0;
    const MAXIMUM: Weight = 7;
    const DEFAULT: Weight = 1;

    fn contribution(waiters: &WaitSet) -> Weight {
        waiters.first().map_or(0, |k| k.weight())
    }

    fn combine(acc: Weight, contribution: Weight) -> Weight {
        acc.max(contribution)
    }

    fn select(&mut self, waiters: &WaitSet) -> Option<ThreadId> {
        waiters.first().map(|k| k.thread())
    }
}
