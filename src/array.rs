//! Pointer-free snapshot of the forest.
//!
//! The left-child/right-sibling forest is a binary tree (left = first child,
//! right = next sibling), so it can be laid out in heap order: the children of
//! index `i` sit at `2i + 1` and `2i + 2`. Absent positions hold
//! [`EMPTY_MARKER`] so the arithmetic stays valid, and trailing markers are
//! trimmed. The first region sits at index 0.
//!
//! Layout for Asia/{Zone1, Zone2}, Europe/Zone1, everything in Subzone1:
//!
//! ```text
//! index  0  1  2  3  4  5  6 ..  9 .. 11
//! entry  A  Z1 E  S1 Z2 Z1 -  .. S1 .. S1
//! ```
//!
//! An array is a value: it stays meaningful only until the next mutation of
//! the tree it came from.

use std::collections::VecDeque;
use std::fmt;

use crate::arena::NodeId;
use crate::error::{LocalityError, Result};
use crate::location::{LocationKey, Tier};
use crate::tree::TopologyTree;

/// Reserved wire value for "no node at this position". Never a valid code.
pub const EMPTY_MARKER: u8 = 0xFF;

/// Heap index of the first child (binary left) of `i`.
#[inline]
pub(crate) fn child_of(i: usize) -> Option<usize> {
    i.checked_mul(2)?.checked_add(1)
}

/// Heap index of the next sibling (binary right) of `i`.
#[inline]
pub(crate) fn sibling_of(i: usize) -> Option<usize> {
    i.checked_mul(2)?.checked_add(2)
}

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SerializedArray {
    entries: Vec<u8>,
}

impl SerializedArray {
    /// Breadth-first heap-order snapshot of `tree`.
    ///
    /// Deterministic: the same tree state always yields the same array.
    pub fn flatten(tree: &TopologyTree) -> Self {
        let arena = tree.arena();
        let mut entries = Vec::new();

        // NULL in the queue stands for a padding position.
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(tree.head());
        let mut live = usize::from(!tree.head().is_null());

        while live > 0 {
            let Some(id) = queue.pop_front() else {
                break;
            };
            if id.is_null() {
                entries.push(EMPTY_MARKER);
                queue.push_back(NodeId::NULL);
                queue.push_back(NodeId::NULL);
                continue;
            }

            live -= 1;
            let node = arena.get(id);
            entries.push(node.code);
            for link in [node.first_child, node.next_sibling] {
                if !link.is_null() {
                    live += 1;
                }
                queue.push_back(link);
            }
        }

        Self::from_bytes(entries)
    }

    /// Wrap raw wire bytes, trimming any trailing empty markers.
    pub fn from_bytes(mut entries: Vec<u8>) -> Self {
        while entries.last() == Some(&EMPTY_MARKER) {
            entries.pop();
        }
        Self { entries }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.entries
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code at `index`, or `None` for padding and out-of-range positions.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        match self.entries.get(index) {
            Some(&EMPTY_MARKER) | None => None,
            Some(&code) => Some(code),
        }
    }

    /// Every full key encoded in the array, in the same order as
    /// [`TopologyTree::locations`].
    pub fn locations(&self) -> Result<Vec<LocationKey>> {
        let mut out = Vec::new();
        if !self.is_empty() {
            self.collect_chain(0, 0, [0; 3], &mut out)?;
        }
        Ok(out)
    }

    fn collect_chain(
        &self,
        start: usize,
        depth: usize,
        mut codes: [u8; 3],
        out: &mut Vec<LocationKey>,
    ) -> Result<()> {
        let tier = Tier::ALL[depth];
        let mut index = Some(start);
        while let Some(i) = index {
            let Some(code) = self.get(i) else {
                break;
            };
            if !tier.is_valid_code(code) {
                return Err(LocalityError::MalformedArray { tier, index: i });
            }
            codes[depth] = code;

            if depth + 1 == Tier::ALL.len() {
                if let Some(key) = LocationKey::from_codes(codes) {
                    out.push(key);
                }
            } else {
                // Interior nodes always have at least one child.
                let next_tier = Tier::ALL[depth + 1];
                let child = child_of(i).ok_or(LocalityError::MalformedArray { tier: next_tier, index: i })?;
                if self.get(child).is_none() {
                    return Err(LocalityError::MalformedArray {
                        tier: next_tier,
                        index: child,
                    });
                }
                self.collect_chain(child, depth + 1, codes, out)?;
            }
            index = sibling_of(i);
        }
        Ok(())
    }
}

impl TopologyTree {
    /// Shorthand for [`SerializedArray::flatten`].
    pub fn flatten(&self) -> SerializedArray {
        SerializedArray::flatten(self)
    }
}

impl AsRef<[u8]> for SerializedArray {
    fn as_ref(&self) -> &[u8] {
        &self.entries
    }
}

impl From<SerializedArray> for Vec<u8> {
    fn from(array: SerializedArray) -> Self {
        array.entries
    }
}

/// Compact rendering: one digit per code, `-` for padding.
impl fmt::Display for SerializedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &entry in &self.entries {
            if entry == EMPTY_MARKER {
                f.write_str("-")?;
            } else {
                write!(f, "{entry}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SerializedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializedArray({self})")
    }
}
