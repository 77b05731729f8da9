#![forbid(unsafe_code)]

//! Property tests for render scheduling policies.

mod common;

use common::VirtualLoop;
use essentials_runtime::SchedulerConfig;
use proptest::prelude::*;

/// Strictly increasing request times built from positive gaps.
fn times_from_gaps(gaps: &[u64]) -> Vec<u64> {
    let mut t = 0;
    gaps.iter()
        .map(|gap| {
            t += gap;
            t
        })
        .collect()
}

proptest! {
    #[test]
    fn immediate_fires_once_per_request(gaps in prop::collection::vec(0u64..500, 1..50)) {
        let ev = VirtualLoop::new(SchedulerConfig::immediate());
        let times = times_from_gaps(&gaps);
        for &t in &times {
            ev.request(t);
        }
        prop_assert_eq!(ev.fires(), times);
    }

    #[test]
    fn debounce_burst_fires_exactly_once(
        interval in 1u64..500,
        gap_fracs in prop::collection::vec(0.0f64..1.0, 1..40),
    ) {
        let ev = VirtualLoop::new(SchedulerConfig::debounce(interval as i64));
        // Every gap is strictly shorter than the interval.
        let gaps: Vec<u64> = gap_fracs
            .iter()
            .map(|f| ((interval - 1) as f64 * f) as u64)
            .collect();
        let times = times_from_gaps(&gaps);
        for &t in &times {
            ev.request(t);
        }
        let last = *times.last().unwrap();
        ev.run_until(last + interval - 1);
        prop_assert!(ev.fires().is_empty());
        ev.run_until(last + interval * 10);
        prop_assert_eq!(ev.fires(), vec![last + interval]);
    }

    #[test]
    fn throttle_burst_inside_one_window(interval in 2u64..500, extra in 0usize..20) {
        let ev = VirtualLoop::new(SchedulerConfig::throttle(interval as i64));
        ev.request(0);
        // Nondecreasing times in [1, interval - 1].
        for i in 0..extra as u64 {
            ev.request(1 + i * (interval - 2) / 20);
        }
        ev.run_until(interval * 10);
        let expected = if extra == 0 { vec![0] } else { vec![0, interval] };
        prop_assert_eq!(ev.fires(), expected);
    }

    #[test]
    fn throttle_fires_at_most_twice_per_window(
        interval in 10u64..200,
        gaps in prop::collection::vec(1u64..300, 1..60),
    ) {
        let ev = VirtualLoop::new(SchedulerConfig::throttle(interval as i64));
        let times = times_from_gaps(&gaps);
        for &t in &times {
            ev.request(t);
        }
        ev.run_until(times.last().unwrap() + interval * 2);
        let fires = ev.fires();
        prop_assert!(fires.len() <= times.len());
        // Leading fires happen only at request times; trailing fires only at
        // window ends. In either case no more than two land in any half-open
        // window of length `interval`.
        for (i, &start) in fires.iter().enumerate() {
            let in_window = fires[i..].iter().take_while(|&&f| f < start + interval).count();
            prop_assert!(in_window <= 2, "fires {:?} exceed two per window", fires);
        }
    }

    #[test]
    fn cancel_suppresses_every_pending_fire(
        throttle in any::<bool>(),
        interval in 1u64..300,
        gaps in prop::collection::vec(0u64..50, 1..20),
    ) {
        let config = if throttle {
            SchedulerConfig::throttle(interval as i64)
        } else {
            SchedulerConfig::debounce(interval as i64)
        };
        let ev = VirtualLoop::new(config);
        let times = times_from_gaps(&gaps);
        for &t in &times {
            ev.request(t);
        }
        ev.scheduler.cancel();
        let before = ev.fires();
        ev.run_until(times.last().unwrap() + interval * 10);
        prop_assert_eq!(ev.fires(), before);
    }
}
