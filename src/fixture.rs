//! Deploy-once fixture cache.
//!
//! A fixture function performs expensive setup (deploy contracts, fund
//! accounts) against a chain and returns a bundle of handles. The cache
//! runs each distinct fixture function exactly once per process, captures
//! a snapshot of the resulting chain state, and on every later `load`
//! restores that snapshot instead of re-running the setup.
//!
//! The cache key is the fixture function item itself: `load` takes a plain
//! `fn` pointer, so identity is the function, not the call site. Entries
//! live for the lifetime of the cache and are never persisted.
//!
//! Intended for strictly sequential use against a single chain instance;
//! interleaving loads and contract calls from several threads against one
//! chain is outside the contract.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::chain::state::ChainSnapshot;
use crate::chain::Chain;
use crate::error::{Result, TestchainError};

/// A fixture setup routine: builds state on the chain and returns the
/// bundle of handles (contracts, signers) later tests work with.
pub type FixtureFn<T> = fn(&Chain) -> Result<T>;

struct CacheEntry {
    snapshot: ChainSnapshot,
    bundle: Arc<dyn Any + Send + Sync>,
}

/// Process-lifetime cache of fixture snapshots and result bundles.
pub struct FixtureCache {
    entries: RwLock<HashMap<usize, CacheEntry>>,
}

impl FixtureCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Loads a fixture.
    ///
    /// First call for `fixture`: runs it, captures a snapshot of the chain
    /// immediately after it returns, caches `(snapshot, bundle)`, and
    /// returns the bundle. Every later call: restores the snapshot onto
    /// the live chain, reverting everything that happened since, and
    /// returns the *same* bundle (`Arc::ptr_eq` holds) without re-running
    /// the fixture.
    ///
    /// A failing first run caches nothing; the error propagates and the
    /// next call retries the full setup.
    pub fn load<T: Send + Sync + 'static>(
        &self,
        chain: &Chain,
        fixture: FixtureFn<T>,
    ) -> Result<Arc<T>> {
        let key = fixture as usize;

        let entries = self.entries.read().unwrap();
        if let Some(entry) = entries.get(&key) {
            let bundle = entry.bundle.clone().downcast::<T>().map_err(|_| {
                TestchainError::Fixture(
                    "cached bundle type does not match fixture return type".to_string(),
                )
            })?;
            chain.state().restore(&entry.snapshot);
            log::debug!(
                "fixture hit: restored chain to block {}",
                entry.snapshot.block_number()
            );
            return Ok(bundle);
        }
        drop(entries);

        let bundle = Arc::new(fixture(chain)?);
        let snapshot = chain.state().snapshot();
        log::debug!(
            "fixture miss: setup complete, captured chain at block {}",
            snapshot.block_number()
        );
        self.entries.write().unwrap().insert(
            key,
            CacheEntry {
                snapshot,
                bundle: bundle.clone(),
            },
        );
        Ok(bundle)
    }

    /// Whether the fixture already has a cached snapshot.
    pub fn contains<T: Send + Sync + 'static>(&self, fixture: FixtureFn<T>) -> bool {
        self.entries.read().unwrap().contains_key(&(fixture as usize))
    }

    /// Number of cached fixtures.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Drops every cached entry. The next `load` of any fixture re-runs it.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

impl Default for FixtureCache {
    fn default() -> Self {
        Self::new()
    }
}
