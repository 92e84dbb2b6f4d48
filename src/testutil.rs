//! Shared fixtures for unit tests.

use crate::location::{Endpoint, LocationKey, Region, Subzone, Zone};
use crate::tree::TopologyTree;

pub(crate) fn key(region: Region, zone: Zone) -> LocationKey {
    LocationKey::new(region, zone, Subzone::Subzone1)
}

pub(crate) struct Sample {
    pub tree: TopologyTree,
    /// `ep1`..`ep8`, in insertion order.
    pub eps: Vec<Endpoint>,
}

/// Asia/{Zone1 ×2, Zone2, Zone3}, Europe/{Zone1, Zone2 ×2}, NorthAmerica/Zone1,
/// all in Subzone1.
pub(crate) fn sample() -> Sample {
    let placements = [
        (Region::Asia, Zone::Zone1),
        (Region::Asia, Zone::Zone1),
        (Region::Asia, Zone::Zone2),
        (Region::Asia, Zone::Zone3),
        (Region::Europe, Zone::Zone1),
        (Region::Europe, Zone::Zone2),
        (Region::Europe, Zone::Zone2),
        (Region::NorthAmerica, Zone::Zone1),
    ];

    let mut tree = TopologyTree::new();
    let mut eps = Vec::with_capacity(placements.len());
    for (i, (region, zone)) in placements.into_iter().enumerate() {
        let ep = Endpoint::with_name(key(region, zone), format!("ep{}", i + 1));
        tree.insert(ep.clone()).unwrap();
        eps.push(ep);
    }
    Sample { tree, eps }
}
