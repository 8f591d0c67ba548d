//! Support for hosts that call in through a flat function API
//!
//! Python module functions and C callers have no Rust owner for the engine
//! or a logger of their own. [`EngineSlot`] holds the engine between calls;
//! [`init_logging`] routes the crate's diagnostics to stderr.

use std::sync::RwLock;

use crate::core::adapter::EngineAdapter;
use crate::core::engine::{OsrmEngine, RoutingEngine};
use crate::core::error::{Error, Result};

/// At most one engine, shared by every caller of the flat API
pub struct EngineSlot<E: RoutingEngine = OsrmEngine> {
    inner: RwLock<Option<EngineAdapter<E>>>,
}

impl<E: RoutingEngine> EngineSlot<E> {
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Install `adapter` and hand back the engine it replaces
    pub fn replace(&self, adapter: EngineAdapter<E>) -> Option<EngineAdapter<E>> {
        let mut slot = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.replace(adapter)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Run `f` on the installed engine; `Error::NotInitialized` when empty
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&EngineAdapter<E>) -> Result<T>,
    {
        let slot = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let adapter = slot.as_ref().ok_or(Error::NotInitialized)?;
        f(adapter)
    }
}

impl<E: RoutingEngine> Default for EngineSlot<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Send `warn` and above to stderr unless `RUST_LOG` says otherwise
///
/// Does nothing when the host already installed a logger.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapter::tests::FakeEngine;
    use crate::core::response::{QueryResult, Status};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn failing_with(code: &str) -> EngineAdapter<FakeEngine> {
        let body = json!({"code": code, "message": format!("{code} engine")});
        EngineAdapter::new(FakeEngine::answering(Status::Error, body))
    }

    #[test]
    fn test_query_before_initialize_fails() {
        let slot: EngineSlot<FakeEngine> = EngineSlot::new();
        assert!(!slot.is_initialized());

        let mut called = false;
        let err = slot
            .with(|adapter| {
                called = true;
                adapter.nearest(7.41, 43.73)
            })
            .unwrap_err();

        assert!(matches!(err, Error::NotInitialized));
        assert!(!called);
    }

    #[test]
    fn test_initialized_slot_answers() {
        let slot = EngineSlot::new();
        assert!(slot.replace(EngineAdapter::new(FakeEngine::default())).is_none());
        assert!(slot.is_initialized());

        let result = slot.with(|adapter| adapter.route(&[7.41, 7.42], &[43.73, 43.74])).unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn test_reinitialize_replaces_engine() {
        let slot = EngineSlot::new();
        slot.replace(failing_with("First"));

        let previous = slot.replace(failing_with("Second")).expect("first engine is handed back");
        previous.nearest(0.0, 0.0).unwrap();
        assert_eq!(previous.engine().calls.load(Ordering::SeqCst), 1);

        let result = slot.with(|adapter| adapter.nearest(0.0, 0.0)).unwrap();
        match result {
            QueryResult::Failure { code, .. } => assert_eq!(code, "Second"),
            QueryResult::Success(_) => panic!("Expected failure from the second engine"),
        }
        assert_eq!(previous.engine().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();

        if std::env::var_os("RUST_LOG").is_none() {
            assert!(log::log_enabled!(log::Level::Warn));
        }
    }
}
