//! Shared helpers for synthesizing `TRELLIS_SLICE` cells and cluster links.
//!
//! Every SLICE-packing stage (carry legalization, mux expansion, DPRAM
//! expansion, LUT/FF pair packing) ends the same way: allocate a
//! `TrellisSlice` cell, set its `MODE`, and optionally link it into a
//! cluster relative to a root. Centralizing that here keeps the stage
//! modules focused on their own discovery/grouping logic.

use aion_netlist::{CellId, CellType, ClusterInfo, Netlist, NetId};

/// Creates a new `TRELLIS_SLICE` cell with the given `MODE` parameter.
pub fn new_slice(nl: &mut Netlist, name: &str, mode: &str) -> CellId {
    let slice = nl.create_cell(name, CellType::TrellisSlice);
    nl.cell_mut(slice)
        .params
        .insert("MODE".to_string(), mode.into());
    slice
}

/// Links `child` into `root`'s cluster at the given root-relative offset.
pub fn link_cluster(nl: &mut Netlist, root: CellId, child: CellId, dx: i32, dy: i32, dz: i32, abs_z: bool) {
    if child != root {
        nl.cell_mut(child).cluster = Some(ClusterInfo {
            root,
            dx,
            dy,
            dz,
            abs_z,
        });
        nl.cell_mut(root).cluster_children.push(child);
    }
}

/// Rewires every connection of `old_cell` onto a freshly created
/// `TRELLIS_SLICE` with the given `MODE`, carrying its parameters across
/// verbatim, then erases `old_cell`. Used when an input primitive's port
/// shape maps 1:1 onto the slice (carry cells); LUT/FF/mux absorption,
/// whose ports get renamed, does its own rewiring instead.
pub fn convert_to_slice(nl: &mut Netlist, old_cell: CellId, name: &str, mode: &str) -> CellId {
    let slice = new_slice(nl, name, mode);
    let params = nl.cell(old_cell).params.clone();
    nl.cell_mut(slice).params.extend(params);
    let ports: Vec<(String, NetId)> = nl
        .cell(old_cell)
        .connections
        .iter()
        .map(|(p, n)| (p.clone(), *n))
        .collect();
    for (port, net) in ports {
        let was_driver = nl
            .net(net)
            .driver
            .as_ref()
            .is_some_and(|d| d.cell == old_cell && d.port == port);
        nl.disconnect_port(old_cell, &port, net);
        nl.connect_port(slice, &port, net, was_driver);
    }
    nl.erase_cell(old_cell);
    slice
}

/// Attempts to opportunistically absorb a flip-flop driven by one of a
/// slice's `F0`/`F1` outputs into the slice's `FF0`/`FF1` sub-slot.
///
/// Returns `true` on success. Fails (leaving the FF untouched) if the
/// slot is already occupied or if the FF's `CLK`/`LSR`/`CE` nets conflict
/// with another FF already sharing the slice (§4.2.3).
pub fn try_absorb_ff(
    nl: &mut Netlist,
    slice: CellId,
    ff: CellId,
    slot: u32,
    usage: &mut crate::state::SliceUsage,
) -> bool {
    let existing = if slot == 0 { usage.ff0 } else { usage.ff1 };
    if existing.is_some() {
        return false;
    }
    if nl.cell(ff).port_net("M").is_some() {
        return false;
    }
    for bundle_port in ["CLK", "LSR", "CE"] {
        let ff_net = nl.cell(ff).port_net(bundle_port);
        let slice_net = nl.cell(slice).port_net(bundle_port);
        if let (Some(a), Some(b)) = (ff_net, slice_net) {
            if a != b {
                return false;
            }
        }
    }
    for bundle_port in ["CLK", "LSR", "CE"] {
        if let Some(net) = nl.cell(ff).port_net(bundle_port) {
            if nl.cell(slice).port_net(bundle_port).is_none() {
                nl.connect_port(slice, bundle_port, net, false);
            }
            nl.disconnect_port(ff, bundle_port, net);
        }
    }
    let d_port = if slot == 0 { "DI0" } else { "DI1" };
    if let Some(net) = nl.cell(ff).port_net("DI") {
        nl.disconnect_port(ff, "DI", net);
        nl.connect_port(slice, d_port, net, false);
    }
    let q_port = if slot == 0 { "Q0" } else { "Q1" };
    if let Some(net) = nl.cell(ff).port_net("Q") {
        let was_driver = nl
            .net(net)
            .driver
            .as_ref()
            .is_some_and(|d| d.cell == ff && d.port == "Q");
        nl.disconnect_port(ff, "Q", net);
        nl.connect_port(slice, q_port, net, was_driver);
    }
    let prefix = if slot == 0 { "FF0_" } else { "FF1_" };
    let params = nl.cell(ff).params.clone();
    for (k, v) in params {
        nl.cell_mut(slice).params.insert(format!("{prefix}{k}"), v);
    }
    if slot == 0 {
        usage.ff0 = Some(ff);
    } else {
        usage.ff1 = Some(ff);
    }
    nl.erase_cell(ff);
    true
}
