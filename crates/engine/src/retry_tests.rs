use super::*;
use rand::rngs::mock::StepRng;

#[test]
fn max_attempts_zero_never_retries() {
    let policy = RetryPolicy::new(0);
    assert!(!policy.admits_retry(1, "boom"));
}

#[test]
fn retries_until_max_attempts_is_reached() {
    let policy = RetryPolicy::new(3);
    assert!(policy.admits_retry(1, "boom"));
    assert!(policy.admits_retry(2, "boom"));
    assert!(!policy.admits_retry(3, "boom"));
}

#[test]
fn retryable_predicate_can_force_a_terminal_failure() {
    let policy = RetryPolicy::new(5).retryable(|err| err != "fatal");
    assert!(policy.admits_retry(1, "transient"));
    assert!(!policy.admits_retry(1, "fatal"));
}

#[test]
fn backoff_doubles_per_attempt_without_jitter() {
    let policy = RetryPolicy::new(5)
        .min_backoff(Duration::milliseconds(10))
        .max_backoff(Duration::milliseconds(1000))
        .jitter_frac(0.0);
    let mut rng = StepRng::new(0, 1);

    assert_eq!(policy.backoff_for(1, &mut rng), Duration::milliseconds(10));
    assert_eq!(policy.backoff_for(2, &mut rng), Duration::milliseconds(20));
    assert_eq!(policy.backoff_for(3, &mut rng), Duration::milliseconds(40));
}

#[test]
fn backoff_clamps_to_max_backoff() {
    let policy = RetryPolicy::new(10)
        .min_backoff(Duration::milliseconds(10))
        .max_backoff(Duration::milliseconds(40))
        .jitter_frac(0.0);
    let mut rng = StepRng::new(0, 1);

    assert_eq!(policy.backoff_for(10, &mut rng), Duration::milliseconds(40));
}

#[test]
fn backoff_jitter_stays_within_configured_width() {
    let policy = RetryPolicy::new(5)
        .min_backoff(Duration::milliseconds(100))
        .max_backoff(Duration::milliseconds(1000))
        .jitter_frac(0.20);
    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        let delay = policy.backoff_for(1, &mut rng);
        assert!(delay.num_milliseconds() >= 80, "delay {delay:?} below jitter floor");
        assert!(delay.num_milliseconds() <= 120, "delay {delay:?} above jitter ceiling");
    }
}

#[test]
fn default_policy_allows_exactly_one_attempt() {
    let policy = RetryPolicy::default();
    assert!(!policy.admits_retry(1, "boom"));
}
