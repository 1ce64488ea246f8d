use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use uuid::Uuid;

use crate::types::DriverKind;

static GLOBAL: LazyLock<Arc<HandleRegistry>> = LazyLock::new(|| Arc::new(HandleRegistry::new()));

/// Process-wide bookkeeping of live native handles, keyed by a unique name.
///
/// One mutex guards registration and removal only; query execution never takes it.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    handles: Mutex<HashMap<String, DriverKind>>,
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by every pool that was not given its own.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Allocate a fresh unique name for a handle of `kind`.
    pub fn register(&self, kind: DriverKind) -> String {
        let mut handles = self.lock();
        loop {
            let name = format!("{kind}-{}", Uuid::new_v4());
            if !handles.contains_key(&name) {
                handles.insert(name.clone(), kind);
                return name;
            }
        }
    }

    /// Returns false if `name` was not registered.
    pub fn deregister(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    // A panic while holding the lock cannot leave the map half-updated, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, DriverKind>> {
        self.handles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
