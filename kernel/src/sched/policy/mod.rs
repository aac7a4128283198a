//! Политики планирования / Scheduling policies
//!
//! Политика отвечает за три вещи / A policy answers three questions:
//!   - границы веса            / weight bounds
//!   - как складывать донорство / how donations combine (max или sum)
//!   - кого выбрать из очереди  / whom to pick from a queue
//!
//! Алгоритм донорства общий и живёт в donation.rs.
//! The donation algorithm is shared and lives in donation.rs.

mod lottery;
mod priority;

pub use lottery::Lottery;
pub use priority::Priority;

use super::queue::WaitSet;
use super::{ThreadId, Weight};

/// Трейт политики / Policy trait
pub trait Policy {
    /// Имя для логов / Name for logs
    const NAME: &'static str;
    const MINIMUM: Weight;
    const MAXIMUM: Weight;
    /// Вес нового потока / Weight of a fresh thread
    const DEFAULT: Weight;

    /// What one donating queue hands to its owner.
    fn contribution(waiters: &WaitSet) -> Weight;

    /// Fold one queue's contribution into the weight accumulated so far.
    /// Never returns less than `acc`.
    fn combine(acc: Weight, contribution: Weight) -> Weight;

    /// Выбрать следующего из ожидающих; `None` — некого запускать.
    /// Pick the next waiter; `None` means nobody is eligible.
    fn select(&mut self, waiters: &WaitSet) -> Option<ThreadId>;

    fn in_bounds(weight: Weight) -> bool {
        (Self::MINIMUM..=Self::MAXIMUM).contains(&weight)
    }
}
