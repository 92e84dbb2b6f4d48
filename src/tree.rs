//! The region → zone → subzone forest.
//!
//! Every node carries one code and two links: `first_child` starts the chain
//! one tier deeper, `next_sibling` continues the chain at the same tier. The
//! top-level chain (regions) starts at `head`. Codes are unique within a chain.
//!
//! A subzone node exists iff the [`LeafIndex`] holds at least one endpoint
//! under the node's full key. Both views change only inside
//! [`TopologyTree::insert`] and [`TopologyTree::delete`].

use std::fmt::Write as _;

use tracing::debug;

use crate::arena::{NodeArena, NodeId};
use crate::error::{LocalityError, Result};
use crate::leaf_index::LeafIndex;
use crate::location::{Endpoint, EndpointId, LocationKey, Region, Subzone, Tier, Zone};

/// Position of one node on a root-to-leaf path, captured before any unlink.
#[derive(Clone, Copy, Debug)]
struct PathStep {
    /// Owner of the chain holding `node`; `None` for the region chain.
    parent: Option<NodeId>,
    /// Sibling whose `next_sibling` points at `node`, or NULL if `node` heads its chain.
    prev: NodeId,
    node: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct TopologyTree {
    nodes: NodeArena,
    head: NodeId,
    index: LeafIndex,
}

impl TopologyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the node arena for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            head: NodeId::NULL,
            index: LeafIndex::new(),
        }
    }

    /// Number of registered endpoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of live tree nodes across all tiers.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    #[inline]
    pub fn leaf_index(&self) -> &LeafIndex {
        &self.index
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.index.contains_id(id)
    }

    /// Endpoints registered at exactly `key`.
    pub fn candidates(&self, key: &LocationKey) -> Option<&[Endpoint]> {
        self.index.get(key)
    }

    #[inline]
    pub(crate) fn head(&self) -> NodeId {
        self.head
    }

    #[inline]
    pub(crate) fn arena(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = NodeId::NULL;
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.index.shrink_to_fit();
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Register `endpoint`, creating whichever of its region, zone and
    /// subzone nodes are missing.
    ///
    /// Fails with [`LocalityError::DuplicateEndpointId`] before touching the
    /// tree if the id is already registered anywhere.
    pub fn insert(&mut self, endpoint: Endpoint) -> Result<()> {
        let id = endpoint.id();
        if self.index.contains_id(&id) {
            return Err(LocalityError::DuplicateEndpointId(id));
        }

        let key = endpoint.location();
        let codes = key.codes();
        let mut parent = None;
        let mut leaf_created = false;
        for tier in Tier::ALL {
            let (node, created) = self.find_or_append(parent, codes[tier.depth()]);
            if created {
                debug!(%key, %tier, ?node, "created node");
            }
            leaf_created = created;
            parent = Some(node);
        }

        let first_at_key = self.index.put(endpoint)?;
        debug_assert_eq!(
            first_at_key, leaf_created,
            "subzone node and leaf index disagree at {key}"
        );
        Ok(())
    }

    /// Scan the chain owned by `parent` for `code`, appending a new last
    /// sibling if it is absent.
    fn find_or_append(&mut self, parent: Option<NodeId>, code: u8) -> (NodeId, bool) {
        let mut prev = NodeId::NULL;
        for (id, node) in self.nodes.chain(self.chain_head(parent)) {
            if node.code == code {
                return (id, false);
            }
            prev = id;
        }

        let created = self.nodes.alloc(code);
        if prev.is_null() {
            self.set_chain_head(parent, created);
        } else {
            self.nodes.get_mut(prev).next_sibling = created;
        }
        (created, true)
    }

    #[inline]
    fn chain_head(&self, parent: Option<NodeId>) -> NodeId {
        match parent {
            None => self.head,
            Some(p) => self.nodes.get(p).first_child,
        }
    }

    #[inline]
    fn set_chain_head(&mut self, parent: Option<NodeId>, id: NodeId) {
        match parent {
            None => self.head = id,
            Some(p) => self.nodes.get_mut(p).first_child = id,
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Unregister `endpoint`. If its key becomes vacant the subzone node is
    /// pruned, then the zone and region nodes in turn while their child chains
    /// are empty.
    pub fn delete(&mut self, endpoint: &Endpoint) -> Result<Endpoint> {
        self.vacate(&endpoint.id(), &endpoint.location())
    }

    /// Like [`delete`](Self::delete), looking the location up by id.
    pub fn delete_id(&mut self, id: &EndpointId) -> Result<Endpoint> {
        let key = self
            .index
            .location_of(id)
            .ok_or(LocalityError::UnknownEndpoint(*id))?;
        self.vacate(id, &key)
    }

    fn vacate(&mut self, id: &EndpointId, key: &LocationKey) -> Result<Endpoint> {
        self.index.check_registered(id, key)?;
        let path = match self.locate(key) {
            Some(path) => path,
            None => {
                debug_assert!(false, "occupied key {key} has no tree path");
                return Err(LocalityError::UnknownLocationKey(*key));
            }
        };

        let (removed, vacated) = self.index.remove(id, key)?;
        if !vacated {
            return Ok(removed);
        }

        // Leaf first; each ancestor goes only once its child chain is empty.
        for (depth, step) in path.iter().enumerate().rev() {
            if depth < Tier::Subzone.depth() && !self.nodes.get(step.node).first_child.is_null() {
                break;
            }
            self.unlink(*step);
            debug!(%key, tier = %Tier::ALL[depth], node = ?step.node, "pruned node");
        }
        Ok(removed)
    }

    /// Find the region, zone and subzone nodes for `key` with their
    /// predecessors.
    fn locate(&self, key: &LocationKey) -> Option<[PathStep; 3]> {
        let codes = key.codes();
        let mut steps = [PathStep {
            parent: None,
            prev: NodeId::NULL,
            node: NodeId::NULL,
        }; 3];
        let mut parent = None;
        for (depth, code) in codes.into_iter().enumerate() {
            let mut prev = NodeId::NULL;
            let mut found = NodeId::NULL;
            for (id, node) in self.nodes.chain(self.chain_head(parent)) {
                if node.code == code {
                    found = id;
                    break;
                }
                prev = id;
            }
            if found.is_null() {
                return None;
            }
            steps[depth] = PathStep {
                parent,
                prev,
                node: found,
            };
            parent = Some(found);
        }
        Some(steps)
    }

    fn unlink(&mut self, step: PathStep) {
        let next = self.nodes.get(step.node).next_sibling;
        if step.prev.is_null() {
            self.set_chain_head(step.parent, next);
        } else {
            self.nodes.get_mut(step.prev).next_sibling = next;
        }
        self.nodes.free(step.node);
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Occupied keys in tree order: regions by insertion, then zones, then subzones.
    pub fn locations(&self) -> Vec<LocationKey> {
        let mut out = Vec::with_capacity(self.index.occupied());
        for (_, region) in self.nodes.chain(self.head) {
            for (_, zone) in self.nodes.chain(region.first_child) {
                for (_, subzone) in self.nodes.chain(zone.first_child) {
                    if let Some(key) = LocationKey::from_codes([region.code, zone.code, subzone.code]) {
                        out.push(key);
                    }
                }
            }
        }
        out
    }

    /// Render the forest one node per line, indented by tier.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        if self.head.is_null() {
            out.push_str("(empty)\n");
            return out;
        }
        for (_, region) in self.nodes.chain(self.head) {
            let _ = writeln!(out, "{}", code_name(Tier::Region, region.code));
            for (_, zone) in self.nodes.chain(region.first_child) {
                let _ = writeln!(out, "  {}", code_name(Tier::Zone, zone.code));
                for (_, subzone) in self.nodes.chain(zone.first_child) {
                    let count = LocationKey::from_codes([region.code, zone.code, subzone.code])
                        .and_then(|k| self.index.get(&k))
                        .map_or(0, <[_]>::len);
                    let _ = writeln!(
                        out,
                        "    {} ({count})",
                        code_name(Tier::Subzone, subzone.code)
                    );
                }
            }
        }
        out
    }
}

fn code_name(tier: Tier, code: u8) -> String {
    let name = match tier {
        Tier::Region => Region::from_code(code).map(|c| c.to_string()),
        Tier::Zone => Zone::from_code(code).map(|c| c.to_string()),
        Tier::Subzone => Subzone::from_code(code).map(|c| c.to_string()),
    };
    name.unwrap_or_else(|| format!("?{code}"))
}
