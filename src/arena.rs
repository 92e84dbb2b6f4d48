//! Node storage for the left-child/right-sibling forest.
//!
//! Nodes live in a `Vec` and refer to each other by 32-bit handles rather than
//! references, so unlinking a node is a handful of integer writes and a freed
//! slot can never be reached again through a stale link.

/// Handle to a node in a [`NodeArena`].
///
/// `NodeId::NULL` (all ones) plays the role of an absent link.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const NULL: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::NULL
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("NodeId(NULL)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A tree node: one code at its tier plus two links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub code: u8,
    /// Head of the chain one tier deeper.
    pub first_child: NodeId,
    /// Next node at the same tier under the same parent.
    pub next_sibling: NodeId,
}

impl Node {
    #[inline]
    fn leaf(code: u8) -> Self {
        Self {
            code,
            first_child: NodeId::NULL,
            next_sibling: NodeId::NULL,
        }
    }
}

/// Slot storage with a free list of vacated handles.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    slots: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Allocate an unlinked node, reusing a freed slot when one exists.
    pub fn alloc(&mut self, code: u8) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Node::leaf(code);
            return id;
        }
        // A full forest is 4 + 16 + 64 nodes, far below the sentinel.
        let raw = self.slots.len() as u32;
        debug_assert!(raw != u32::MAX);
        self.slots.push(Node::leaf(code));
        NodeId(raw)
    }

    /// Return a slot to the free list. The caller must already have unlinked it.
    pub fn free(&mut self, id: NodeId) {
        debug_assert!(!self.free.contains(&id), "double free of {id:?}");
        self.slots[id.index()] = Node::leaf(u8::MAX);
        self.free.push(id);
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.slots[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.index()]
    }

    /// Number of nodes currently allocated and not freed.
    #[inline]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Total slots, live or free.
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    pub fn is_free(&self, id: NodeId) -> bool {
        self.free.contains(&id)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Iterate a sibling chain starting at `head`.
    pub fn chain(&self, head: NodeId) -> Chain<'_> {
        Chain {
            arena: self,
            cursor: head,
        }
    }
}

pub struct Chain<'a> {
    arena: &'a NodeArena,
    cursor: NodeId,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_null() {
            return None;
        }
        let id = self.cursor;
        let node = self.arena.get(id);
        self.cursor = node.next_sibling;
        Some((id, node))
    }
}
