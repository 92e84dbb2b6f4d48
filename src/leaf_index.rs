//! Occupancy map from a full location to the endpoints registered there.
//!
//! An entry exists iff at least one endpoint is registered under its key. The
//! tree mutates this map only from the same call that creates or prunes the
//! matching subzone node, so the two never disagree.

use std::collections::HashMap;

use crate::error::{LocalityError, Result};
use crate::location::{Endpoint, EndpointId, LocationKey};

#[derive(Clone, Debug, Default)]
pub struct LeafIndex {
    by_key: HashMap<LocationKey, Vec<Endpoint>>,
    /// Reverse map; enforces id uniqueness across all keys.
    by_id: HashMap<EndpointId, LocationKey>,
}

impl LeafIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints registered at exactly `key`, in no particular order.
    pub fn get(&self, key: &LocationKey) -> Option<&[Endpoint]> {
        self.by_key.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &LocationKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn contains_id(&self, id: &EndpointId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn location_of(&self, id: &EndpointId) -> Option<LocationKey> {
        self.by_id.get(id).copied()
    }

    /// Occupied keys, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &LocationKey> + '_ {
        self.by_key.keys()
    }

    /// Number of registered endpoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of occupied keys.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.by_key.len()
    }

    /// Register `endpoint` under its own location.
    ///
    /// Returns `true` when this is the first endpoint at that key.
    pub(crate) fn put(&mut self, endpoint: Endpoint) -> Result<bool> {
        let id = endpoint.id();
        if self.by_id.contains_key(&id) {
            return Err(LocalityError::DuplicateEndpointId(id));
        }
        let key = endpoint.location();
        self.by_id.insert(id, key);
        let set = self.by_key.entry(key).or_default();
        set.push(endpoint);
        Ok(set.len() == 1)
    }

    /// Check that `id` is registered at `key` without changing anything.
    pub(crate) fn check_registered(&self, id: &EndpointId, key: &LocationKey) -> Result<()> {
        let set = self
            .by_key
            .get(key)
            .ok_or(LocalityError::UnknownLocationKey(*key))?;
        if set.iter().any(|e| e.id() == *id) {
            Ok(())
        } else {
            Err(LocalityError::UnknownEndpoint(*id))
        }
    }

    /// Unregister `id` from `key`. On error nothing is changed.
    ///
    /// Returns the removed endpoint and whether the key is now vacant.
    pub(crate) fn remove(&mut self, id: &EndpointId, key: &LocationKey) -> Result<(Endpoint, bool)> {
        self.check_registered(id, key)?;
        let set = self
            .by_key
            .get_mut(key)
            .ok_or(LocalityError::UnknownLocationKey(*key))?;
        let pos = set
            .iter()
            .position(|e| e.id() == *id)
            .ok_or(LocalityError::UnknownEndpoint(*id))?;
        let removed = set.swap_remove(pos);
        let vacated = set.is_empty();
        if vacated {
            self.by_key.remove(key);
        }
        self.by_id.remove(id);
        Ok((removed, vacated))
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
        self.by_id.clear();
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        for set in self.by_key.values_mut() {
            set.shrink_to_fit();
        }
        self.by_key.shrink_to_fit();
        self.by_id.shrink_to_fit();
    }
}
