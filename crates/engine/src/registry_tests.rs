use super::*;
use async_trait::async_trait;
use std::sync::Arc;

struct Stub(&'static str);

#[async_trait]
impl Handler for Stub {
    fn job_type(&self) -> &str {
        self.0
    }

    async fn run(&self, _ctx: &RuntimeContext) -> Result<(), String> {
        Ok(())
    }
}

#[test]
fn registers_and_looks_up_by_job_type() {
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(Stub("demo.echo"))).unwrap();
    assert!(registry.get("demo.echo").is_some());
    assert!(registry.get("demo.other").is_none());
}

#[test]
fn rejects_empty_job_type() {
    let registry = HandlerRegistry::new();
    assert_eq!(registry.register(Arc::new(Stub(""))), Err(EngineError::EmptyHandlerType));
}

#[test]
fn rejects_duplicate_registration() {
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(Stub("demo.echo"))).unwrap();
    let err = registry.register(Arc::new(Stub("demo.echo"))).unwrap_err();
    assert_eq!(err, EngineError::DuplicateHandler("demo.echo".to_string()));
}

#[test]
fn len_and_is_empty_track_registrations() {
    let registry = HandlerRegistry::new();
    assert!(registry.is_empty());
    registry.register(Arc::new(Stub("demo.echo"))).unwrap();
    assert_eq!(registry.len(), 1);
}
