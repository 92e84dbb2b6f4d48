//! Build a small topology, ship it as bytes, and resolve a few requests.
//!
//! Run with `RUST_LOG=locality_tree=debug` to see node creation, pruning and
//! degraded matches.

use locality_tree::{
    Endpoint, LocalitySelector, LocationKey, Region, SerializedArray, Subzone, TopologyTree, Zone,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let at = |r, z| LocationKey::new(r, z, Subzone::Subzone1);
    let placements = [
        ("ep1", at(Region::Asia, Zone::Zone1)),
        ("ep2", at(Region::Asia, Zone::Zone1)),
        ("ep3", at(Region::Asia, Zone::Zone2)),
        ("ep4", at(Region::Asia, Zone::Zone3)),
        ("ep5", at(Region::Europe, Zone::Zone1)),
        ("ep6", at(Region::Europe, Zone::Zone2)),
        ("ep7", at(Region::Europe, Zone::Zone2)),
        ("ep8", at(Region::NorthAmerica, Zone::Zone1)),
    ];

    let mut tree = TopologyTree::new();
    let mut endpoints = Vec::new();
    for (name, key) in placements {
        let ep = Endpoint::with_name(key, name);
        tree.insert(ep.clone())?;
        endpoints.push(ep);
    }

    println!("=== Topology ===\n{}", tree.debug_dump());

    // What a remote router would receive.
    let wire = tree.flatten().into_bytes();
    let array = SerializedArray::from_bytes(wire);
    println!("array: {array} ({} bytes)\n", array.len());

    let mut selector = LocalitySelector::new();
    for target in [
        at(Region::Europe, Zone::Zone2),
        at(Region::Europe, Zone::Zone4),
        at(Region::SouthAmerica, Zone::Zone1),
    ] {
        let resolution = selector.resolve(&target, &array)?;
        let names: Vec<_> = tree
            .candidates(&resolution.key)
            .unwrap_or_default()
            .iter()
            .filter_map(Endpoint::name)
            .collect();
        println!(
            "{target} -> {} (degraded at {:?}): {names:?}",
            resolution.key, resolution.degraded
        );
    }

    println!("\n=== After removing ep6, ep7 ===");
    tree.delete(&endpoints[5])?;
    tree.delete(&endpoints[6])?;
    print!("{}", tree.debug_dump());
    let array = tree.flatten();
    println!("array: {array}");

    let got = selector.select(&at(Region::Europe, Zone::Zone2), &array, tree.leaf_index())?;
    for ep in got {
        println!("Europe/Zone2 request served by {}", ep.name().unwrap_or("?"));
    }
    Ok(())
}
