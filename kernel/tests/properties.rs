//! Свойства донорства на случайных последовательностях операций.
//! Donation properties over random operation sequences.

use donor::{Lottery, Policy, Priority, QueueId, Scheduler, ThreadId, Weight};
use proptest::prelude::*;

const THREADS: u64 = 6;
/// Queues 1..=3 donate, queue 4 does not.
const QUEUES: u64 = 4;

#[derive(Debug, Clone)]
enum Op {
    Wait(u64, u64),
    Acquire(u64, u64),
    Next(u64),
    SetWeight(u64, Weight),
    Withdraw(u64),
    Release(u64, u64),
}

fn arb_op(max_weight: Weight) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=QUEUES, 1..=THREADS).prop_map(|(q, t)| Op::Wait(q, t)),
        2 => (1..=QUEUES, 1..=THREADS).prop_map(|(q, t)| Op::Acquire(q, t)),
        2 => (1..=QUEUES).prop_map(Op::Next),
        3 => (1..=THREADS, 0..=max_weight).prop_map(|(t, w)| Op::SetWeight(t, w)),
        1 => (1..=THREADS).prop_map(Op::Withdraw),
        1 => (1..=QUEUES, 1..=THREADS).prop_map(|(q, t)| Op::Release(q, t)),
    ]
}

fn setup<P: Policy>(policy: P) -> Scheduler<P> {
    let mut sched = Scheduler::new(policy);
    for q in 1..=QUEUES {
        let id = sched.allocate_queue(q != QUEUES);
        assert_eq!(id, QueueId(q));
    }
    sched
}

/// Follow "waits on a queue owned by" from `from`; true if it reaches `to`.
fn chain_reaches<P: Policy>(sched: &Scheduler<P>, from: Option<ThreadId>, to: ThreadId) -> bool {
    let mut cur = from;
    for _ in 0..=THREADS {
        let Some(t) = cur else { return false };
        if t == to {
            return true;
        }
        cur = sched.waiting_in(t).and_then(|q| sched.owner_of(q));
    }
    true
}

/// Apply `op`, skipping calls that would break the caller contract
/// (double wait, closing a wait cycle).
fn apply<P: Policy>(sched: &mut Scheduler<P>, op: &Op) {
    match *op {
        Op::Wait(q, t) => {
            let (q, t) = (QueueId(q), ThreadId(t));
            let owner = sched.owner_of(q).filter(|&o| o != t);
            if sched.waiting_in(t).is_none() && !chain_reaches(sched, owner, t) {
                sched.wait_for_access(q, t);
            }
        }
        Op::Acquire(q, t) => {
            let (q, t) = (QueueId(q), ThreadId(t));
            // A waiter of Q upstream of T would close a cycle through T.
            let upstream = sched
                .queue(q)
                .map(|queue| queue.waiters().iter().map(|k| k.thread()).collect::<Vec<_>>())
                .unwrap_or_default();
            let closes = sched.waiting_in(t) != Some(q)
                && upstream.iter().any(|&w| w != t && chain_reaches(sched, Some(t), w));
            if !closes {
                sched.acquire(q, t);
            }
        }
        Op::Next(q) => {
            sched.next_thread(QueueId(q));
        }
        Op::SetWeight(t, w) => {
            sched.set_weight(ThreadId(t), w).unwrap();
        }
        Op::Withdraw(t) => {
            sched.withdraw(ThreadId(t));
        }
        Op::Release(q, t) => {
            sched.release(QueueId(q), ThreadId(t));
        }
    }
}

fn check_invariants<P: Policy>(sched: &Scheduler<P>) {
    for t in (1..=THREADS).map(ThreadId) {
        let Some(state) = sched.thread_state(t) else { continue };

        // I1
        assert!(state.effective() >= state.base(), "{t}: effective below base");

        // I2, I3
        if let Some(q) = state.waiting_in() {
            assert!(!state.owns().contains(&q), "{t} waits on {q} it owns");
            let queue = sched.queue(q).unwrap();
            assert!(queue.waiters().iter().any(|k| k.thread() == t));
        }
        for &q in state.owns() {
            assert_eq!(sched.owner_of(q), Some(t));
        }

        // I5 (for Lottery this is exact conservation of tickets)
        let expected = state
            .owns()
            .iter()
            .filter_map(|&q| sched.queue(q))
            .filter(|q| q.donates())
            .fold(state.base(), |acc, q| P::combine(acc, P::contribution(q.waiters())));
        assert_eq!(state.effective(), expected, "{t}: effective out of date");
    }

    for q in (1..=QUEUES).map(QueueId) {
        let queue = sched.queue(q).unwrap();
        if let Some(owner) = queue.owner() {
            assert!(sched.owned_by(owner).any(|o| o == q));
        }
        for key in queue.waiters().iter() {
            assert_eq!(sched.waiting_in(key.thread()), Some(q));
            assert_eq!(key.weight(), sched.get_effective_weight(key.thread()));
        }
    }
}

fn effective_all<P: Policy>(sched: &Scheduler<P>) -> Vec<Weight> {
    (1..=THREADS).map(|t| sched.get_effective_weight(ThreadId(t))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn priority_invariants_hold(ops in prop::collection::vec(arb_op(7), 1..60)) {
        let mut sched = setup(Priority);
        for op in &ops {
            apply(&mut sched, op);
            check_invariants(&sched);
        }
    }

    #[test]
    fn lottery_invariants_hold(
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(1_000), 1..60),
    ) {
        let mut sched = setup(Lottery::seeded(seed));
        for op in &ops {
            apply(&mut sched, op);
            check_invariants(&sched);
        }
    }

    #[test]
    fn priority_propagation_is_monotonic(
        ops in prop::collection::vec(arb_op(7), 1..40),
        t in 1..=THREADS,
        w in 0..=7u64,
    ) {
        let mut sched = setup(Priority);
        for op in &ops {
            apply(&mut sched, op);
        }
        let raising = w >= sched.get_weight(ThreadId(t));
        let before = effective_all(&sched);
        sched.set_weight(ThreadId(t), w).unwrap();
        for (old, new) in before.iter().zip(effective_all(&sched)) {
            if raising {
                prop_assert!(new >= *old);
            } else {
                prop_assert!(new <= *old);
            }
        }
    }

    #[test]
    fn lottery_propagation_is_monotonic(
        ops in prop::collection::vec(arb_op(1_000), 1..40),
        t in 1..=THREADS,
        w in 0..=1_000u64,
    ) {
        let mut sched = setup(Lottery::seeded(5));
        for op in &ops {
            apply(&mut sched, op);
        }
        let raising = w >= sched.get_weight(ThreadId(t));
        let before = effective_all(&sched);
        sched.set_weight(ThreadId(t), w).unwrap();
        for (old, new) in before.iter().zip(effective_all(&sched)) {
            if raising {
                prop_assert!(new >= *old);
            } else {
                prop_assert!(new <= *old);
            }
        }
    }

    #[test]
    fn releasing_never_raises_anyone(
        ops in prop::collection::vec(arb_op(7), 1..40),
        q in 1..=QUEUES,
    ) {
        let mut sched = setup(Priority);
        for op in &ops {
            apply(&mut sched, op);
        }
        let Some(owner) = sched.owner_of(QueueId(q)) else { return Ok(()) };
        let before = effective_all(&sched);
        sched.release(QueueId(q), owner);
        for (old, new) in before.iter().zip(effective_all(&sched)) {
            prop_assert!(new <= *old);
        }
    }
}
