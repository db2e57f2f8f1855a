//! Per-resource mutual exclusion.
//!
//! Each singleton resource owns one async mutex. Mutating requests try to
//! take it without waiting: a request that finds it held is rejected with
//! `Busy` instead of queueing behind the running one.

use crate::protocol::Failure;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Account,
    WifiProfiles,
    Update,
    Settings,
    Session,
}

impl Resource {
    const COUNT: usize = 5;

    const fn index(self) -> usize {
        match self {
            Resource::Account => 0,
            Resource::WifiProfiles => 1,
            Resource::Update => 2,
            Resource::Settings => 3,
            Resource::Session => 4,
        }
    }
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            Resource::Account => "Account",
            Resource::WifiProfiles => "WiFi profiles",
            Resource::Update => "Update",
            Resource::Settings => "Settings",
            Resource::Session => "Session",
        };
        formatter.write_str(name)
    }
}

/// Held for the lifetime of one mutating request.
pub type ResourceGuard = OwnedMutexGuard<()>;

#[derive(Clone)]
pub struct ResourceLocks {
    locks: Arc<[Arc<Mutex<()>>; Resource::COUNT]>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(std::array::from_fn(|_| Arc::new(Mutex::new(())))),
        }
    }

    /// Take the resource, or fail with `Busy` if a mutation is in flight.
    pub fn try_acquire(&self, resource: Resource) -> Result<ResourceGuard, Failure> {
        Arc::clone(&self.locks[resource.index()])
            .try_lock_owned()
            .map_err(|_| Failure::busy(resource))
    }

    pub fn is_held(&self, resource: Resource) -> bool {
        self.locks[resource.index()].try_lock().is_err()
    }
}

impl Default for ResourceLocks {
    fn default() -> Self {
        Self::new()
    }
}
