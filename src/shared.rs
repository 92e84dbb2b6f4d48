//! Thread-safe wrapper around [`TopologyTree`].
//!
//! Mutations take the write lock; flatten and lookups take the read lock, so
//! a flatten never observes a half-applied insert or delete. Selection over
//! an already produced array needs no lock at all.

use parking_lot::RwLock;

use crate::array::SerializedArray;
use crate::error::Result;
use crate::location::{Endpoint, EndpointId, LocationKey};
use crate::selector::{LocalitySelector, RandomChooser, SiblingChooser};
use crate::tree::TopologyTree;

/// Configuration for [`SharedTopology`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Node arena capacity hint.
    pub initial_capacity: usize,
    /// Seed for selectors built by [`Config::selector`]; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            seed: None,
        }
    }
}

impl Config {
    pub fn selector(&self) -> LocalitySelector<RandomChooser> {
        match self.seed {
            Some(seed) => LocalitySelector::seeded(seed),
            None => LocalitySelector::new(),
        }
    }
}

pub struct SharedTopology {
    inner: RwLock<TopologyTree>,
    config: Config,
}

impl SharedTopology {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(TopologyTree::with_capacity(config.initial_capacity)),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn insert(&self, endpoint: Endpoint) -> Result<()> {
        self.inner.write().insert(endpoint)
    }

    pub fn delete(&self, endpoint: &Endpoint) -> Result<Endpoint> {
        self.inner.write().delete(endpoint)
    }

    pub fn delete_id(&self, id: &EndpointId) -> Result<Endpoint> {
        self.inner.write().delete_id(id)
    }

    /// Consistent snapshot of the current tree.
    pub fn flatten(&self) -> SerializedArray {
        self.inner.read().flatten()
    }

    /// Endpoints at exactly `key`, copied out of the lock.
    pub fn candidates(&self, key: &LocationKey) -> Vec<Endpoint> {
        self.inner
            .read()
            .candidates(key)
            .map(<[Endpoint]>::to_vec)
            .unwrap_or_default()
    }

    /// Flatten and select under one read guard, so the array and the index
    /// agree.
    pub fn select<C: SiblingChooser>(
        &self,
        target: &LocationKey,
        selector: &mut LocalitySelector<C>,
    ) -> Result<Vec<Endpoint>> {
        let tree = self.inner.read();
        let array = tree.flatten();
        selector.select(target, &array, tree.leaf_index())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the tree under the read lock.
    pub fn with_tree<T>(&self, f: impl FnOnce(&TopologyTree) -> T) -> T {
        f(&*self.inner.read())
    }
}

impl Default for SharedTopology {
    fn default() -> Self {
        Self::new()
    }
}
