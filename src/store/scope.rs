//! Transaction scope
//!
//! Every public store operation runs its body inside a `TransactionScope`.
//! The scope commits on success, turns absence-class errors into the
//! operation's sentinel after rolling back, and propagates every other
//! error after rolling back. A scope that goes out of scope uncommitted
//! (early return, `?`, or a panic unwinding through the body) releases
//! its engine transaction, which discards its writes and locks.

use crate::engine::{EngineTx, GraphEngine};
use crate::error::StoreResult;
use tracing::{debug, warn};

/// Begin/commit-or-rollback wrapper around one engine transaction
pub(crate) struct TransactionScope<'e> {
    tx: EngineTx<'e>,
    operation: &'static str,
}

impl<'e> TransactionScope<'e> {
    pub fn begin(engine: &'e GraphEngine, operation: &'static str) -> Self {
        Self {
            tx: engine.begin(),
            operation,
        }
    }

    /// Scope over a snapshot; for operations that never write
    pub fn begin_read(engine: &'e GraphEngine, operation: &'static str) -> Self {
        Self {
            tx: engine.begin_read(),
            operation,
        }
    }

    pub fn tx(&self) -> &EngineTx<'e> {
        &self.tx
    }

    pub fn commit(self) -> StoreResult<()> {
        self.tx.commit()
    }

    pub fn rollback(self) {
        if let Err(e) = self.tx.rollback() {
            warn!("Rollback of {} failed: {}", self.operation, e);
        }
    }
}

/// Run a mutating operation
///
/// `absent` is what the caller sees when the body reports an absence.
pub(crate) fn run<T, F>(engine: &GraphEngine, operation: &'static str, absent: T, body: F) -> StoreResult<T>
where
    F: FnOnce(&EngineTx<'_>) -> StoreResult<T>,
{
    let scope = TransactionScope::begin(engine, operation);
    let outcome = body(scope.tx());
    match outcome {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(e) if e.is_absence() => {
            debug!("{}: {}", operation, e);
            scope.rollback();
            Ok(absent)
        }
        Err(e) => {
            warn!("{} failed, rolling back: {}", operation, e);
            scope.rollback();
            Err(e)
        }
    }
}

/// Run a mutating operation that has no absence sentinel
pub(crate) fn write<T, F>(engine: &GraphEngine, operation: &'static str, body: F) -> StoreResult<T>
where
    F: FnOnce(&EngineTx<'_>) -> StoreResult<T>,
{
    let scope = TransactionScope::begin(engine, operation);
    let outcome = body(scope.tx());
    match outcome {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(e) => {
            warn!("{} failed, rolling back: {}", operation, e);
            scope.rollback();
            Err(e)
        }
    }
}

/// Run a read-only operation; the transaction is always rolled back
///
/// The body reads one consistent snapshot, so writers committing
/// meanwhile cannot leave it holding index entries without records.
pub(crate) fn read<T, F>(engine: &GraphEngine, operation: &'static str, absent: T, body: F) -> StoreResult<T>
where
    F: FnOnce(&EngineTx<'_>) -> StoreResult<T>,
{
    let scope = TransactionScope::begin_read(engine, operation);
    let outcome = body(scope.tx());
    scope.rollback();
    match outcome {
        Ok(value) => Ok(value),
        Err(e) if e.is_absence() => {
            debug!("{}: {}", operation, e);
            Ok(absent)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::engine::records::StoredObject;
    use crate::error::StoreError;
    use crate::graph::ObjectHandle;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> GraphEngine {
        GraphEngine::open(&StoreConfig::new(dir.path())).unwrap()
    }

    fn exists(engine: &GraphEngine, handle: ObjectHandle) -> bool {
        read(engine, "exists", false, |tx| Ok(tx.get_object(handle)?.is_some())).unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine(&temp_dir);
        let handle = engine.allocate_object();

        let result = run(&engine, "put", false, |tx| {
            tx.put_object(handle, &StoredObject::placeholder(1))?;
            Ok(true)
        });
        assert!(result.unwrap());
        assert!(exists(&engine, handle));
    }

    #[test]
    fn test_absence_becomes_sentinel_and_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine(&temp_dir);
        let handle = engine.allocate_object();

        let result = run(&engine, "put", -1i64, |tx| {
            tx.put_object(handle, &StoredObject::placeholder(1))?;
            Err(StoreError::NodeNotFound(1))
        });
        assert_eq!(result.unwrap(), -1);
        assert!(!exists(&engine, handle));
    }

    #[test]
    fn test_systemic_error_propagates_and_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine(&temp_dir);
        let handle = engine.allocate_object();

        let result: StoreResult<bool> = run(&engine, "put", false, |tx| {
            tx.put_object(handle, &StoredObject::placeholder(1))?;
            Err(StoreError::PayloadTooLarge { size: 2, limit: 1 })
        });
        assert!(matches!(result, Err(StoreError::PayloadTooLarge { .. })));
        assert!(!exists(&engine, handle));
    }

    #[test]
    fn test_panic_in_body_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine(&temp_dir);
        let handle = engine.allocate_object();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: StoreResult<()> = run(&engine, "put", (), |tx| {
                tx.put_object(handle, &StoredObject::placeholder(1))?;
                panic!("body failed");
            });
        }));
        assert!(outcome.is_err());
        assert!(!exists(&engine, handle));
    }
}
