//! Donor — ядро планировщика с донорством приоритета
//! Donor — priority-donation scheduling core
//!
//! Две взаимозаменяемые политики / Two interchangeable policies:
//!   Priority — строгий приоритет 0..=7, донорство через max
//!              strict priority 0..=7, donation through max
//!   Lottery  — лотерея билетов, донорство через сумму
//!              ticket lottery, donation through sum
//!
//! Ядро только упорядочивает ожидающих; переключение контекста,
//! блокировки и условные переменные живут снаружи.
//! The core only orders waiters; context switching, locks and condition
//! variables live outside.
//!
//! Использование / Usage:
//!   let mut sched = Scheduler::new(Priority);
//!   let lock = sched.allocate_queue(true);
//!   sched.acquire(lock, holder);
//!   sched.wait_for_access(lock, waiter);

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

// Подключить стандартный alloc крейт (BTreeMap, String, ...)
// Connect standard alloc crate (BTreeMap, String, ...)
extern crate alloc;

pub mod config;
pub mod error;
pub mod sched;

pub use config::SchedConfig;
pub use error::{Result, SchedError};
pub use sched::domain::SchedDomain;
pub use sched::policy::{Lottery, Policy, Priority};
pub use sched::queue::QueueFlags;
pub use sched::rng::{TicketSource, XorShift64};
pub use sched::{QueueId, Scheduler, ThreadId, Weight};
