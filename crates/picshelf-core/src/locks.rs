use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use crate::error::{ShelfError, ShelfResult};

/// Per-image-name exclusion.
///
/// Blob operations on the same name must not interleave, even when they
/// belong to different coordinator calls. A caller claims every name it
/// will touch in one step; the claim waits until none of them is held by
/// anyone else, then takes all of them at once, so two callers claiming
/// overlapping sets can never deadlock.
#[derive(Debug, Default)]
pub(crate) struct NameLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl NameLocks {
    pub(crate) fn claim(&self, names: &[&str]) -> ShelfResult<NameClaim<'_>> {
        let mut wanted: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        wanted.sort();
        wanted.dedup();

        let poisoned = |_| ShelfError::Internal("name lock table poisoned".into());
        let mut held = self.held.lock().map_err(poisoned)?;
        while wanted.iter().any(|n| held.contains(n)) {
            held = self.released.wait(held).map_err(poisoned)?;
        }
        held.extend(wanted.iter().cloned());
        Ok(NameClaim {
            locks: self,
            names: wanted,
        })
    }
}

/// Names held until this claim is dropped.
#[derive(Debug)]
pub(crate) struct NameClaim<'a> {
    locks: &'a NameLocks,
    names: Vec<String>,
}

impl Drop for NameClaim<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for name in &self.names {
            held.remove(name);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
