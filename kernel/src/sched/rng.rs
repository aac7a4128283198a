//! Источник случайности лотереи / Lottery randomness source
//!
//! Лотерея берёт случайные числа через трейт, чтобы тесты могли
//! подставить детерминированный источник.
//! The lottery draws through a trait so tests can plug in a deterministic
//! source.

/// Трейт источника билетов / Ticket source trait
pub trait TicketSource {
    /// Следующее псевдослучайное 64-битное значение.
    /// Next pseudo-random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform value in `[0, bound)`, rejection-sampled to avoid modulo bias.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    fn draw(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "ticket draw over an empty range");
        let threshold = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < threshold {
                return value % bound;
            }
        }
    }
}

/// xorshift64 — быстрый, не криптографический.
/// xorshift64 — fast, not cryptographic.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Нулевое зерно заменяется на 1 (иначе вечные нули).
    /// A zero seed is replaced by 1 (otherwise zeros forever).
    pub const fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 1 } else { seed } }
    }
}

impl TicketSource for XorShift64 {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}
