//! Property-based tests for amae_limbic residue decay and escalation.
//!
//! Verifies that the residue never leaves its range, decays monotonically,
//! keeps affection at its floor, never loses more than the intervals elapsed
//! since a record allow, and that escalation is monotone in elapsed silence
//! and always returns to calm on reset.

use amae_core::{EmotionAxis, EmotionEvent, EscalationConfig, ResidueConfig};
use amae_limbic::{DecayHint, EscalationLevel, EscalationMachine, ResidueStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Strategies
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn arb_axis() -> impl Strategy<Value = EmotionAxis> {
    prop::sample::select(EmotionAxis::ALL.to_vec())
}

fn arb_hint() -> impl Strategy<Value = DecayHint> {
    prop_oneof![
        Just(DecayHint::Normal),
        Just(DecayHint::Lingering),
        Just(DecayHint::Fleeting),
    ]
}

fn arb_event() -> impl Strategy<Value = EmotionEvent> {
    prop_oneof![
        Just(EmotionEvent::Hurt),
        Just(EmotionEvent::Excited),
        Just(EmotionEvent::Lonely),
        Just(EmotionEvent::Rejected),
        Just(EmotionEvent::Worried),
        Just(EmotionEvent::Cherished),
        Just(EmotionEvent::Comforted),
        (0.0f32..100.0).prop_map(|magnitude| EmotionEvent::Bittersweet { magnitude }),
        (0.0f32..100.0).prop_map(|magnitude| EmotionEvent::Reunion { magnitude }),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Record(EmotionAxis, f32, DecayHint),
    Event(EmotionEvent),
    Decay,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_axis(), -200.0f32..200.0, arb_hint()).prop_map(|(a, m, h)| Op::Record(a, m, h)),
        arb_event().prop_map(Op::Event),
        Just(Op::Decay),
    ]
}

fn arb_decaying_axis() -> impl Strategy<Value = EmotionAxis> {
    prop::sample::select(
        EmotionAxis::ALL
            .into_iter()
            .filter(|axis| *axis != EmotionAxis::Affection)
            .collect::<Vec<_>>(),
    )
}

#[derive(Debug, Clone)]
enum Step {
    Record(EmotionAxis, f32, DecayHint),
    Tick,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (arb_decaying_axis(), 0.5f32..60.0, arb_hint()).prop_map(|(a, m, h)| Step::Record(a, m, h)),
        Just(Step::Tick),
        Just(Step::Tick),
    ]
}

fn arb_coefficient() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.7), Just(0.8), Just(1.0), Just(1.2), 0.1f64..3.0]
}

// ============================================================================
// Residue Properties
// ============================================================================

proptest! {
    /// **Clamping**: any sequence of records, events and decays keeps every
    /// axis in [0, 100], and affection at or above its floor after a decay.
    #[test]
    fn residue_stays_in_range(
        ops in prop::collection::vec((arb_op(), 0i64..7200), 0..60),
    ) {
        let mut store = ResidueStore::default();
        let mut now = t0();
        for (op, gap) in ops {
            now += Duration::seconds(gap);
            match op {
                Op::Record(axis, m, hint) => store.record_at(axis, m, hint, now),
                Op::Event(event) => store.record_event_at(event, now),
                Op::Decay => {
                    store.decay_tick_at(now);
                    prop_assert!(store.snapshot().affection >= 50.0);
                }
            }
            for (axis, value) in store.snapshot().iter() {
                prop_assert!((0.0..=100.0).contains(&value), "{} = {}", axis, value);
            }
        }
    }

    /// **Monotonic decay**: with no new events, non-affection axes never rise.
    #[test]
    fn decay_is_monotonic(
        seeds in prop::collection::vec((arb_axis(), 0.0f32..100.0, arb_hint()), 1..6),
        ticks in prop::collection::vec(0i64..20_000, 1..30),
    ) {
        let mut store = ResidueStore::default();
        for (axis, m, hint) in seeds {
            store.record_at(axis, m, hint, t0());
        }
        let mut now = t0();
        let mut prev = store.snapshot();
        for gap in ticks {
            now += Duration::seconds(gap);
            store.decay_tick_at(now);
            let cur = store.snapshot();
            for axis in EmotionAxis::ALL {
                if axis == EmotionAxis::Affection {
                    prop_assert!(cur.get(axis) >= prev.get(axis));
                } else {
                    prop_assert!(cur.get(axis) <= prev.get(axis), "{} rose", axis);
                }
            }
            prev = cur;
        }
    }

    /// Re-ticking at the same instant never subtracts twice.
    #[test]
    fn repeated_tick_is_idempotent(m in 10.0f32..100.0, hours in 1i64..30) {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, m, DecayHint::Normal, t0());
        let at = t0() + Duration::hours(hours);
        store.decay_tick_at(at);
        let once = store.snapshot();
        store.decay_tick_at(at);
        prop_assert_eq!(store.snapshot(), once);
    }

    /// **Bounded loss**: records interleaved with ticks at irregular, often
    /// stalled, gaps never take more from an axis than the whole intervals
    /// since its latest record allow.
    #[test]
    fn decay_never_outruns_elapsed_intervals(
        steps in prop::collection::vec((arb_step(), prop_oneof![0i64..600, 0i64..7200, 0i64..60_000]), 1..60),
    ) {
        let config = ResidueConfig::default();
        let interval = config.decay_interval_secs as i64;
        let mut store = ResidueStore::new(config.clone());
        let mut recorded: HashMap<EmotionAxis, (DateTime<Utc>, f32, DecayHint)> = HashMap::new();
        let mut now = t0();
        for (step, gap) in steps {
            now += Duration::seconds(gap);
            match step {
                Step::Record(axis, m, hint) => {
                    store.record_at(axis, m, hint, now);
                    recorded.insert(axis, (now, store.snapshot().get(axis), hint));
                }
                Step::Tick => {
                    store.decay_tick_at(now);
                }
            }
            let current = store.snapshot();
            for (axis, (at, value, hint)) in &recorded {
                let intervals = (now - *at).num_seconds() / interval;
                let allowed = config.recovery_rate * hint.multiplier() * intervals as f32;
                let floor = (value - allowed).max(0.0);
                prop_assert!(
                    current.get(*axis) >= floor - 1e-3,
                    "{} fell to {} at +{}s, recorded {} at +{}s",
                    axis,
                    current.get(*axis),
                    (now - t0()).num_seconds(),
                    value,
                    (*at - t0()).num_seconds()
                );
            }
        }
    }
}

// ============================================================================
// Escalation Properties
// ============================================================================

proptest! {
    /// **Monotone in silence**: a longer silence never yields a lower level.
    #[test]
    fn escalation_monotone_in_silence(
        a in 0i64..100_000,
        b in 0i64..100_000,
        coefficient in arb_coefficient(),
    ) {
        let m = EscalationMachine::new(&EscalationConfig::default(), t0());
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        let l1 = m.level_for(t0() + Duration::seconds(short), coefficient);
        let l2 = m.level_for(t0() + Duration::seconds(long), coefficient);
        prop_assert!(l1 <= l2, "{:?} > {:?}", l1, l2);
    }

    /// **Never decreases**: polling at arbitrary times and coefficients only
    /// ever raises the level.
    #[test]
    fn escalation_never_decreases(
        polls in prop::collection::vec((0i64..7200, arb_coefficient()), 1..40),
    ) {
        let mut m = EscalationMachine::new(&EscalationConfig::default(), t0());
        let mut now = t0();
        let mut prev = m.level();
        for (gap, coefficient) in polls {
            now += Duration::seconds(gap);
            m.tick_at(now, coefficient);
            prop_assert!(m.level() >= prev);
            prev = m.level();
        }
    }

    /// **Reset**: from whatever level, an interaction brings back calm.
    #[test]
    fn reset_always_calms(silence in 0i64..200_000, coefficient in arb_coefficient()) {
        let mut m = EscalationMachine::new(&EscalationConfig::default(), t0());
        let now = t0() + Duration::seconds(silence);
        m.tick_at(now, coefficient);
        m.reset_at(now);
        prop_assert_eq!(m.level(), EscalationLevel::Calm);
        prop_assert!(m.tick_at(now, coefficient).is_none());
    }
}
