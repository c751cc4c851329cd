//! Synthetic two-corridor network.
//!
//! ```text
//!                      ┌─ f0 ─▶ a1 ─ f1 ─▶ a2 ─ f2 ─┐     (arterial, 25 m/s)
//!   origin ─entry─▶ split                            ▶ merge ─exit─▶ sink
//!                      └─ s0 ─▶ b1 ─ s1 ─▶ b2 ─ s2 ─┘     (side road, 12 m/s)
//! ```
//!
//! The arterial is faster but short on storage, so a steady stream of
//! vehicles jams it and pushes rerouting vehicles onto the side road.

use anyhow::Result;
use dt_core::EdgeId;
use dt_spatial::{RoadNetwork, RoadNetworkBuilder};

pub struct Corridors {
    pub network: RoadNetwork,
    pub entry:   EdgeId,
    pub exit:    EdgeId,
    pub fast:    [EdgeId; 3],
    pub slow:    [EdgeId; 3],
}

pub fn build_network() -> Result<Corridors> {
    let mut b = RoadNetworkBuilder::new();
    let origin = b.add_node();
    let split = b.add_node();
    let [a1, a2, b1, b2] = [b.add_node(), b.add_node(), b.add_node(), b.add_node()];
    let merge = b.add_node();
    let sink = b.add_node();

    let entry = b.add_directed_edge(origin, split, 150.0, 15.0)?;
    let fast = [
        b.add_directed_edge(split, a1, 200.0, 25.0)?,
        b.add_directed_edge(a1, a2, 60.0, 25.0)?,
        b.add_directed_edge(a2, merge, 200.0, 25.0)?,
    ];
    let slow = [
        b.add_directed_edge(split, b1, 250.0, 12.0)?,
        b.add_directed_edge(b1, b2, 250.0, 12.0)?,
        b.add_directed_edge(b2, merge, 250.0, 12.0)?,
    ];
    let exit = b.add_directed_edge(merge, sink, 150.0, 15.0)?;

    Ok(Corridors { network: b.build(), entry, exit, fast, slow })
}
