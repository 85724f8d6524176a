use super::*;
use std::thread;
use std::time::Duration as StdDuration;

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.now();
    thread::sleep(StdDuration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn system_clock_epoch_ms_is_positive() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_starts_at_unix_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::seconds(60));
    let t2 = clock.now();
    assert_eq!(t2 - t1, Duration::seconds(60));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::seconds(30));
    let t2 = clock1.now();
    assert_eq!(t2 - t1, Duration::seconds(30));
}

#[test]
fn fake_clock_default_matches_new() {
    let clock = FakeClock::default();
    assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn fake_clock_set_moves_to_exact_instant() {
    let clock = FakeClock::new();
    let future = DateTime::<Utc>::UNIX_EPOCH + Duration::hours(1);
    clock.set(future);
    assert_eq!(clock.now(), future);
}

#[test]
fn fake_clock_epoch_ms_tracks_advances() {
    let clock = FakeClock::new();
    clock.advance(Duration::milliseconds(2500));
    assert_eq!(clock.epoch_ms(), 2500);
}
