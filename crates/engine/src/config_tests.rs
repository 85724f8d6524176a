use super::*;

#[test]
fn defaults_are_sane() {
    let cfg = EngineConfig::default();
    assert!(cfg.min_poll < cfg.max_poll);
    assert!(cfg.child_stale_running < cfg.child_max_wait);
}

#[test]
fn builder_overrides_take_effect() {
    let cfg = EngineConfig::builder()
        .min_poll(Duration::milliseconds(10))
        .max_poll(Duration::milliseconds(40))
        .build();
    assert_eq!(cfg.min_poll, Duration::milliseconds(10));
    assert_eq!(cfg.max_poll, Duration::milliseconds(40));
}

#[test]
fn clamp_poll_respects_bounds() {
    let min = Duration::milliseconds(100);
    let max = Duration::seconds(5);
    assert_eq!(clamp_poll(Duration::milliseconds(10), min, max), min);
    assert_eq!(clamp_poll(Duration::seconds(30), min, max), max);
    assert_eq!(clamp_poll(Duration::seconds(1), min, max), Duration::seconds(1));
}
