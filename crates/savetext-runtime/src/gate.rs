use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::{Error, Result};

/// Mutual exclusion at the "start a new ingestion unit" boundary.
///
/// A manual batch load refuses to start while a watch chunk is being
/// ingested and vice versa. The gate is never held inside a store
/// transaction wait or while an event source blocks for new input.
#[derive(Debug, Default)]
pub struct IngestGate {
    lock: Mutex<()>,
}

/// Held for the duration of one ingestion unit; released on drop.
#[derive(Debug)]
pub struct IngestGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl IngestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter without waiting; `Error::Busy` when another unit is in flight.
    pub fn try_begin(&self) -> Result<IngestGuard<'_>> {
        match self.lock.try_lock() {
            Ok(guard) => Ok(IngestGuard { _guard: guard }),
            Err(TryLockError::Poisoned(poisoned)) => Ok(IngestGuard {
                _guard: poisoned.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => Err(Error::Busy),
        }
    }

    /// Enter, waiting for the unit in flight to finish.
    pub fn begin(&self) -> IngestGuard<'_> {
        IngestGuard {
            _guard: self.lock.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.lock.try_lock(), Err(TryLockError::WouldBlock))
    }
}
