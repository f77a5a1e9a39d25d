//! End-to-end tests for a full hand-off run.
//!
//! These tests drive the public API the way the binary does: a coordinator
//! spawns both loops, the test optionally interrupts them, then joins and
//! inspects the recorded diagnostic stream.
//!
//! # Running with tracing
//!
//! ```bash
//! RUST_LOG=handoff=trace cargo test --test handoff_e2e -- --nocapture
//! ```

use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use handoff::report::{Event, MemoryReport, NullReport};
use handoff::{Coordinator, HandoffConfig, HandoffError, InterruptPolicy, Role};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        handoff::init_tracing();
    });
}

fn quick(iterations: usize) -> HandoffConfig {
    HandoffConfig::default()
        .with_iterations(iterations)
        .with_pause(Duration::from_millis(1))
}

/// Source yielding 1, 2, 3, ...
fn counter() -> impl FnMut() -> u64 + Send + 'static {
    let mut next = 0;
    move || {
        next += 1;
        next
    }
}

fn is_consumer_lock_event(event: &Event) -> bool {
    matches!(
        event,
        Event::Locked(Role::Consumer) | Event::Unlocking(Role::Consumer)
    )
}

fn count(lines: &[String], line: &str) -> usize {
    lines.iter().filter(|l| *l == line).count()
}

#[test]
fn three_iterations_with_clock_source() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());

    let summary = Coordinator::new(quick(3))
        .with_report(report.clone())
        .run()
        .expect("spawn");

    assert!(summary.is_complete(3), "{summary:?}");

    let consumed: Vec<u64> = report
        .consumed()
        .iter()
        .map(|v| v.parse().expect("timestamp"))
        .collect();
    assert_eq!(consumed.len(), 3);
    assert!(consumed.windows(2).all(|w| w[0] <= w[1]));

    let lines = report.lines();
    assert_eq!(count(&lines, "Producer: locked sb"), 3);
    assert_eq!(count(&lines, "Producer: unlocking sb"), 3);
    assert_eq!(count(&lines, "Consumer: locked sb"), 3);
    assert_eq!(count(&lines, "Consumer: unlocking sb"), 3);
    assert_eq!(count(&lines, "Finished"), 1);
    assert_eq!(lines.last().map(String::as_str), Some("Finished"));
}

#[test]
fn consumed_sequence_matches_produced_sequence() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());
    let coordinator = Coordinator::new(quick(20)).with_report(report.clone());

    let summary = coordinator.spawn_with(counter()).expect("spawn").join();

    assert!(summary.is_complete(20), "{summary:?}");
    let expected: Vec<String> = (1..=20).map(|i: u64| i.to_string()).collect();
    assert_eq!(report.consumed(), expected);

    assert_eq!(summary.stats.puts, 20);
    assert_eq!(summary.stats.takes, 20);
    assert_eq!(summary.stats.max_occupancy, 1);
}

#[test]
fn value_is_reported_between_lock_and_unlock() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());

    Coordinator::new(quick(5))
        .with_report(report.clone())
        .spawn_with(counter())
        .expect("spawn")
        .join();

    let events = report.events();
    for (i, event) in events.iter().enumerate() {
        if let Event::Consumed(_) = event {
            let before = events[..i].iter().rev().find(|e| is_consumer_lock_event(e));
            assert_eq!(before, Some(&Event::Locked(Role::Consumer)));
            let after = events[i + 1..].iter().find(|e| is_consumer_lock_event(e));
            assert_eq!(after, Some(&Event::Unlocking(Role::Consumer)));
        }
    }
}

#[test]
fn consumer_started_first() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());

    let summary = Coordinator::new(quick(10))
        .with_report(report.clone())
        .consumer_first()
        .spawn_with(counter())
        .expect("spawn")
        .join();

    assert!(summary.is_complete(10), "{summary:?}");
    let expected: Vec<String> = (1..=10).map(|i: u64| i.to_string()).collect();
    assert_eq!(report.consumed(), expected);
}

#[test]
fn finishes_within_bounded_time() {
    init_test_tracing();
    let pause = Duration::from_millis(10);
    let config = HandoffConfig::default().with_iterations(5).with_pause(pause);

    let start = Instant::now();
    let summary = Coordinator::new(config)
        .with_report(Arc::new(NullReport))
        .spawn_with(counter())
        .expect("spawn")
        .join();
    let elapsed = start.elapsed();

    assert!(summary.is_complete(5));
    // Every iteration pauses once, outside the lock.
    assert!(elapsed >= pause * 5, "finished too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
}

#[test]
fn interrupts_are_survived_under_resume() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());
    let config = HandoffConfig::default()
        .with_iterations(10)
        .with_pause(Duration::from_millis(20));

    let handoff = Coordinator::new(config)
        .with_report(report.clone())
        .spawn_with(counter())
        .expect("spawn");

    // The consumer spends most of its time waiting for the next item, the
    // producer most of its time pausing.
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(15));
        handoff.interrupt(Role::Consumer);
        handoff.interrupt(Role::Producer);
    }

    let summary = handoff.join();

    assert!(summary.is_complete(10), "{summary:?}");
    assert!(summary.stats.interrupts > 0);
    let expected: Vec<String> = (1..=10).map(|i: u64| i.to_string()).collect();
    assert_eq!(report.consumed(), expected);
    assert_eq!(count(&report.lines(), "Finished"), 1);
}

#[test]
fn interrupt_under_abort_stops_both_loops() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());
    let config = HandoffConfig::default()
        .with_iterations(20)
        .with_pause(Duration::from_secs(30))
        .with_policy(InterruptPolicy::Abort);

    let handoff = Coordinator::new(config)
        .with_report(report.clone())
        .spawn_with(counter())
        .expect("spawn");

    // The producer is parked in its first pause; the consumer either waits
    // for a second item or has not yet taken the first.
    thread::sleep(Duration::from_millis(50));
    handoff.interrupt(Role::Producer);

    let summary = handoff.join();

    assert!(matches!(
        summary.producer,
        Err(HandoffError::Interrupted { role: Role::Producer })
    ));
    assert!(matches!(summary.consumer, Err(HandoffError::Closed)));
    assert_eq!(report.consumed(), vec!["1"]);
    assert_eq!(report.lines().last().map(String::as_str), Some("Finished"));
}

#[test]
fn largest_configured_pause_is_cut_short_by_interrupt() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());
    let config = HandoffConfig::from_lookup(|key: &str| match key {
        "HANDOFF_ITERATIONS" => Some("2".to_string()),
        "HANDOFF_PAUSE_MS" => Some(u64::MAX.to_string()),
        _ => None,
    })
    .expect("valid config");

    let handoff = Coordinator::new(config)
        .with_report(report.clone())
        .spawn_with(counter())
        .expect("spawn");

    // Each interrupt ends one pause; a spare one stays pending harmlessly.
    for _ in 0..3 {
        thread::sleep(Duration::from_millis(50));
        handoff.interrupt(Role::Producer);
    }

    let summary = handoff.join();

    assert!(summary.is_complete(2), "{summary:?}");
    assert_eq!(report.consumed(), vec!["1", "2"]);
}

#[test]
fn panicking_source_does_not_strand_consumer() {
    init_test_tracing();
    let report = Arc::new(MemoryReport::new());
    let mut calls = 0u64;
    let source = move || {
        calls += 1;
        assert!(calls < 3, "source exhausted");
        calls
    };

    let summary = Coordinator::new(quick(5))
        .with_report(report.clone())
        .spawn_with(source)
        .expect("spawn")
        .join();

    assert!(matches!(
        summary.producer,
        Err(HandoffError::Panicked { role: Role::Producer })
    ));
    assert!(matches!(summary.consumer, Err(HandoffError::Closed)));
    assert_eq!(report.consumed(), vec!["1", "2"]);
    assert_eq!(count(&report.lines(), "Finished"), 1);
}

#[test]
fn independent_runs_do_not_share_state() {
    init_test_tracing();
    let first = Arc::new(MemoryReport::new());
    let second = Arc::new(MemoryReport::new());

    let a = Coordinator::new(quick(4))
        .with_report(first.clone())
        .spawn_with(counter())
        .expect("spawn");
    let b = Coordinator::new(quick(4))
        .with_report(second.clone())
        .spawn_with(|| "x".to_string())
        .expect("spawn");

    assert!(a.join().is_complete(4));
    assert!(b.join().is_complete(4));
    assert_eq!(first.consumed(), vec!["1", "2", "3", "4"]);
    assert_eq!(second.consumed(), vec!["x", "x", "x", "x"]);
}
