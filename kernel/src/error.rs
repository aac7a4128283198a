//! Ошибки планировщика / Scheduler errors
//!
//! Восстанавливаемая ошибка только одна: вес вне границ политики.
//! There is a single recoverable error: a weight outside the policy bounds.
//!
//! Нарушения контракта (двойное ожидание, цикл донорства, неизвестная
//! очередь) — это баги вызывающего кода, они паникуют, а не возвращаются.
//! Contract violations (double wait, donation cycle, unknown queue) are bugs
//! in the caller; they panic instead of being returned.

use thiserror::Error;

use crate::sched::Weight;

/// Ошибки планировщика / Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedError {
    /// `set_weight` получил значение вне `[minimum, maximum]`.
    /// `set_weight` got a value outside `[minimum, maximum]`.
    #[error("weight {value} outside [{minimum}, {maximum}]")]
    InvalidWeight {
        value:   Weight,
        minimum: Weight,
        maximum: Weight,
    },
}

pub type Result<T> = core::result::Result<T, SchedError>;
