//! Домен планирования / Scheduling domain
//!
//! Один `spin::Mutex` на весь планировщик: все очереди и все состояния
//! потоков под одной блокировкой. Мелкие блокировки внутри были бы ошибкой —
//! вызывающий рассчитывает на атомарность цепочек операций
//! (wait_for_access + переключение контекста).
//! One `spin::Mutex` for the whole scheduler: every queue and every thread
//! state sit under a single lock. Finer locks inside would be wrong — callers
//! rely on multi-step sequences (wait_for_access + context switch) being
//! atomic.
//!
//! Пример / Example:
//!   static SCHED: SchedDomain<Priority> = SchedDomain::new(Scheduler::new(Priority));
//!   SCHED.with(|s| s.wait_for_access(lock, me));

use spin::{Mutex, MutexGuard};

use super::policy::Policy;
use super::Scheduler;

pub struct SchedDomain<P: Policy> {
    inner: Mutex<Scheduler<P>>,
}

impl<P: Policy> SchedDomain<P> {
    pub const fn new(scheduler: Scheduler<P>) -> Self {
        Self { inner: Mutex::new(scheduler) }
    }

    /// Войти в критическую секцию / Enter the critical section
    pub fn lock(&self) -> MutexGuard<'_, Scheduler<P>> {
        self.inner.lock()
    }

    /// `None`, если домен уже занят (например, из прерывания).
    /// `None` if the domain is already held (e.g. from an interrupt).
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Scheduler<P>>> {
        self.inner.try_lock()
    }

    /// Выполнить `f` целиком под блокировкой домена.
    /// Run `f` entirely under the domain lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut Scheduler<P>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> Scheduler<P> {
        self.inner.into_inner()
    }
}
