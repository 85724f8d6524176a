use super::*;

#[test]
fn defaults_are_sane() {
    let cfg = WorkerConfig::default();
    assert!(cfg.worker_count > 0);
    assert!(cfg.idle_poll < cfg.stale_lock_after);
    assert!(cfg.heartbeat_interval < cfg.stale_lock_after);
}

#[test]
fn builder_overrides_take_effect() {
    let cfg = WorkerConfig::builder()
        .worker_count(8)
        .idle_poll(Duration::milliseconds(50))
        .stale_lock_after(Duration::seconds(90))
        .heartbeat_interval(Duration::seconds(5))
        .build();
    assert_eq!(cfg.worker_count, 8);
    assert_eq!(cfg.idle_poll, Duration::milliseconds(50));
    assert_eq!(cfg.stale_lock_after, Duration::seconds(90));
    assert_eq!(cfg.heartbeat_interval, Duration::seconds(5));
}
