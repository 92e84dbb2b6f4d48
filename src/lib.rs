//! # locality-tree
//!
//! Locality-aware endpoint selection over a compact region → zone → subzone
//! tree.
//!
//! Endpoints are grouped by location in a forest encoded with
//! left-child/right-sibling links. The forest flattens into a pointer-free
//! heap-ordered byte array that can be shipped to another process, where a
//! [`LocalitySelector`] resolves a request's location against it: same
//! subzone if possible, else same zone, else same region, else anywhere.
//!
//! ## Example
//!
//! ```rust
//! use locality_tree::{Endpoint, LocalitySelector, LocationKey, Region, Subzone, TopologyTree, Zone};
//!
//! let mut tree = TopologyTree::new();
//! let here = LocationKey::new(Region::Europe, Zone::Zone2, Subzone::Subzone1);
//! let there = LocationKey::new(Region::Europe, Zone::Zone1, Subzone::Subzone1);
//! tree.insert(Endpoint::with_name(here, "a")).unwrap();
//! tree.insert(Endpoint::with_name(there, "b")).unwrap();
//!
//! let array = tree.flatten();
//! let mut selector = LocalitySelector::seeded(42);
//!
//! let exact = selector.select(&here, &array, tree.leaf_index()).unwrap();
//! assert_eq!(exact[0].name(), Some("a"));
//!
//! // No Zone3 in Europe: falls back to some Europe zone.
//! let missing = LocationKey::new(Region::Europe, Zone::Zone3, Subzone::Subzone1);
//! let resolution = selector.resolve(&missing, &array).unwrap();
//! assert_eq!(resolution.key.region, Region::Europe);
//! ```

pub mod arena;
pub mod array;
pub mod error;
pub mod leaf_index;
pub mod location;
pub mod selector;
pub mod shared;
pub mod tree;

pub use array::{SerializedArray, EMPTY_MARKER};
pub use error::{LocalityError, Result};
pub use leaf_index::LeafIndex;
pub use location::{Endpoint, EndpointId, LocationKey, Region, Subzone, Tier, Zone, MAX_CODES};
pub use selector::{LocalitySelector, RandomChooser, Resolution, SiblingChooser};
pub use shared::{Config, SharedTopology};
pub use tree::TopologyTree;

#[cfg(test)]
mod testutil;

#[cfg(test)]
mod proptests;
