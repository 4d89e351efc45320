//! Shared state per connection target.
//!
//! Every handle constructed against the same [`TargetKey`] resolves to one
//! [`Target`], so entries added through one handle are visible to all
//! others. Targets are created on first use and live as long as their
//! registry.

pub mod session;
pub mod target;

pub use session::{SessionOperation, SessionOverrides};
pub use target::{Scheme, TargetKey};

use crate::directory::Directory;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Debug)]
pub struct Target {
    key: TargetKey,
    directory: RwLock<Directory>,
    overrides: RwLock<SessionOverrides>,
}

impl Target {
    fn new(key: TargetKey) -> Self {
        Self {
            key,
            directory: RwLock::new(Directory::new()),
            overrides: RwLock::new(SessionOverrides::new()),
        }
    }

    pub fn key(&self) -> &TargetKey {
        &self.key
    }

    // Poisoned locks are recovered, never propagated.
    pub fn directory(&self) -> RwLockReadGuard<'_, Directory> {
        self.directory.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn directory_mut(&self) -> RwLockWriteGuard<'_, Directory> {
        self.directory.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn overrides(&self) -> RwLockReadGuard<'_, SessionOverrides> {
        self.overrides.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn overrides_mut(&self) -> RwLockWriteGuard<'_, SessionOverrides> {
        self.overrides.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    targets: DashMap<TargetKey, Arc<Target>>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`crate::MockLdap::new`].
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Returns the target for `target`, creating an empty one on first use.
    pub fn resolve(&self, target: &str) -> crate::Result<Arc<Target>> {
        Ok(self.resolve_key(TargetKey::parse(target)?))
    }

    pub fn resolve_key(&self, key: TargetKey) -> Arc<Target> {
        let target = self.targets.entry(key.clone()).or_insert_with(|| {
            info!("Creating in-memory directory for {}", key);
            Arc::new(Target::new(key.clone()))
        });
        Arc::clone(target.value())
    }

    /// Existing target only; never creates one.
    pub fn get(&self, target: &str) -> crate::Result<Option<Arc<Target>>> {
        let key = TargetKey::parse(target)?;
        Ok(self.targets.get(&key).map(|t| t.value().clone()))
    }

    /// Drops `target`. Handles already holding it keep the old tree; new
    /// handles start from an empty one.
    pub fn remove(&self, target: &str) -> crate::Result<bool> {
        let key = TargetKey::parse(target)?;
        Ok(self.targets.remove(&key).is_some())
    }

    /// Drops every target.
    pub fn reset(&self) {
        self.targets.clear();
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn keys(&self) -> Vec<TargetKey> {
        self.targets.iter().map(|t| t.key().clone()).collect()
    }
}
