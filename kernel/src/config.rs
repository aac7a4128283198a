//! Конфигурация планировщика / Scheduler configuration
//!
//! Границы весов — константы политики (`Policy::MINIMUM` и т.д.),
//! здесь только то, что выбирает встраивающее ядро.
//! Weight bounds are policy constants (`Policy::MINIMUM` etc.); this holds
//! only what the embedding kernel chooses.

/// Seed used when the kernel does not pick one.
pub const DEFAULT_SEED: u64 = 0x5EED_D0_0A_7105;

/// Настройки планировщика / Scheduler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Зерно генератора лотереи / Lottery draw seed
    pub seed: u64,
    /// Логировать содержимое каждой очереди после изменения.
    /// Log every queue's contents after each mutation.
    pub trace_queues: bool,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self { seed: DEFAULT_SEED, trace_queues: false }
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub const fn with_queue_tracing(mut self, on: bool) -> Self {
        self.trace_queues = on;
        self
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}
