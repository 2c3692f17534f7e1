//! Pair packing, remaining LUTs, remaining FFs (§4.2.6).

use crate::config::PackerConfig;
use crate::lutpair::{can_pack_ffs, can_pack_ffs_in_tile};
use crate::slice::{new_slice, try_absorb_ff};
use crate::state::{PackerState, SliceUsage};
use aion_arch::Ecp5Device;
use aion_netlist::{CellId, CellType, Netlist};
use std::collections::{HashSet, VecDeque};

pub fn run(nl: &mut Netlist, state: &mut PackerState, device: &dyn Ecp5Device, config: &PackerConfig) {
    pair_packing(nl, state);
    nl.flush();
    remaining_lut_packing(nl, state);
    nl.flush();
    remaining_ff_packing(nl, state, device, config);
    nl.flush();
}

fn move_lut_inputs(nl: &mut Netlist, lut: CellId, slice: CellId, suffix: char) {
    for port in ["A", "B", "C", "D"] {
        if let Some(net) = nl.cell(lut).port_net(port) {
            let was_driver = nl
                .net(net)
                .driver
                .as_ref()
                .is_some_and(|d| d.cell == lut && d.port == port);
            nl.disconnect_port(lut, port, net);
            nl.connect_port(slice, &format!("{port}{suffix}"), net, was_driver);
        }
    }
}

/// For each `lut_pairs` entry (visited once per unordered pair), folds
/// both LUTs into one SLICE at positions 0/1, absorbing each LUT's
/// paired FF into the matching slot.
fn pair_packing(nl: &mut Netlist, state: &mut PackerState) {
    let pairs: Vec<(CellId, CellId)> = state
        .lut_pairs
        .iter()
        .map(|(&a, &b)| if a.as_raw() < b.as_raw() { (a, b) } else { (b, a) })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    for (lut0, lut1) in pairs {
        let name = format!("{}$slice", nl.cell(lut0).name.clone());
        let slice = new_slice(nl, &name, "LOGIC");
        move_lut_inputs(nl, lut0, slice, '0');
        move_lut_inputs(nl, lut1, slice, '1');
        let init0 = nl.cell(lut0).param("INIT").cloned();
        let init1 = nl.cell(lut1).param("INIT").cloned();
        if let Some(v) = init0 {
            nl.cell_mut(slice).params.insert("LUT0_INITVAL".to_string(), v);
        }
        if let Some(v) = init1 {
            nl.cell_mut(slice).params.insert("LUT1_INITVAL".to_string(), v);
        }

        let mut usage = SliceUsage {
            lut0: Some(lut0),
            lut1: Some(lut1),
            ..Default::default()
        };

        let ff0 = state.lutff_pairs.get(&lut0).copied();
        let ff1 = state.lutff_pairs.get(&lut1).copied();
        nl.erase_cell(lut0);
        nl.erase_cell(lut1);
        if let Some(ff) = ff0 {
            try_absorb_ff(nl, slice, ff, 0, &mut usage);
        }
        if let Some(ff) = ff1 {
            try_absorb_ff(nl, slice, ff, 1, &mut usage);
        }
        state.slice_usage.insert(slice, usage);
    }
}

/// For each `LUT4` left unpaired, creates a singleton SLICE holding it at
/// position 1 (convention), absorbing its paired FF if any.
fn remaining_lut_packing(nl: &mut Netlist, state: &mut PackerState) {
    let luts: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::Lut4)
        .collect();

    for lut in luts {
        let name = format!("{}$slice", nl.cell(lut).name.clone());
        let slice = new_slice(nl, &name, "LOGIC");
        move_lut_inputs(nl, lut, slice, '1');
        if let Some(v) = nl.cell(lut).param("INIT").cloned() {
            nl.cell_mut(slice).params.insert("LUT1_INITVAL".to_string(), v);
        }
        let mut usage = SliceUsage {
            lut1: Some(lut),
            ..Default::default()
        };
        let ff = state.lutff_pairs.get(&lut).copied();
        nl.erase_cell(lut);
        if let Some(ff) = ff {
            try_absorb_ff(nl, slice, ff, 1, &mut usage);
        }
        state.slice_usage.insert(slice, usage);
    }
}

fn cluster_size(nl: &Netlist, slice: CellId) -> usize {
    let root = nl.cell(slice).cluster.as_ref().map(|c| c.root).unwrap_or(slice);
    1 + nl.cell(root).cluster_children.len()
}

fn slice_free_ff_slot(nl: &Netlist, state: &PackerState, slice: CellId) -> Option<u32> {
    let usage = state.slice_usage.get(&slice)?;
    if usage.ff0.is_none() {
        Some(0)
    } else if usage.ff1.is_none() {
        Some(1)
    } else {
        None
    }
}

/// A BFS candidate search compatible with an existing FF slot in `slice`,
/// honoring §4.2.3's tile rule (omitting `CE` when the slice is part of a
/// cluster) and §4.2.6's cluster-size cap.
fn is_viable_candidate(nl: &Netlist, state: &PackerState, config: &PackerConfig, slice: CellId, ff: CellId) -> bool {
    if slice_free_ff_slot(nl, state, slice).is_none() {
        return false;
    }
    if cluster_size(nl, slice) > config.dense_pack_max_cluster as usize {
        return false;
    }
    let usage = state.slice_usage.get(&slice);
    let in_cluster = nl.cell(slice).cluster.is_some() || !nl.cell(slice).cluster_children.is_empty();
    let existing_ff = usage.and_then(|u| u.ff0.or(u.ff1));
    match existing_ff {
        None => true,
        Some(other) if in_cluster => can_pack_ffs_in_tile(nl, ff, other),
        Some(other) => can_pack_ffs(nl, ff, other),
    }
}

/// §4.2.6's netlist-local BFS: visits cells reachable from `ff` via nets
/// of fanout at most `dense_pack_bfs_fanout_limit`, bounded to
/// `dense_pack_bfs_cap` visited cells, looking for a SLICE with a usable
/// free FF slot.
fn bfs_find_slice(nl: &Netlist, state: &PackerState, config: &PackerConfig, ff: CellId) -> Option<CellId> {
    let mut visited: HashSet<CellId> = HashSet::new();
    let mut queue: VecDeque<CellId> = VecDeque::new();
    visited.insert(ff);
    queue.push_back(ff);

    while let Some(cell) = queue.pop_front() {
        for &net in nl.cell(cell).connections.values() {
            let fanout = nl.net(net).users.len() as u32;
            if fanout > config.dense_pack_bfs_fanout_limit {
                continue;
            }
            let mut neighbors: Vec<CellId> = nl.net(net).users.iter().map(|u| u.cell).collect();
            if let Some(driver) = &nl.net(net).driver {
                neighbors.push(driver.cell);
            }
            for neighbor in neighbors {
                if visited.contains(&neighbor) {
                    continue;
                }
                if visited.len() as u32 >= config.dense_pack_bfs_cap {
                    return None;
                }
                visited.insert(neighbor);
                if nl.cell(neighbor).cell_type == CellType::TrellisSlice
                    && is_viable_candidate(nl, state, config, neighbor, ff)
                {
                    return Some(neighbor);
                }
                queue.push_back(neighbor);
            }
        }
    }
    None
}

/// For each orphan FF (no `M` driver), packs into an existing SLICE via
/// dense-mode BFS once utilization crosses `dense_pack_threshold`, else
/// creates a singleton SLICE.
fn remaining_ff_packing(nl: &mut Netlist, state: &mut PackerState, device: &dyn Ecp5Device, config: &PackerConfig) {
    let available_slices = device
        .bels()
        .into_iter()
        .filter(|&b| device.bel_type(b) == aion_arch::BelType::Slice)
        .count()
        .max(1);

    let ffs: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::TrellisFf)
        .collect();

    for ff in ffs {
        let used_slices = state.slice_usage.len();
        let dense_mode = (used_slices as f64) > config.dense_pack_threshold * (available_slices as f64);
        let m_driven = nl.cell(ff).port_net("M").is_some();

        let target = if dense_mode && !m_driven {
            bfs_find_slice(nl, state, config, ff)
        } else {
            None
        };

        if let Some(slice) = target {
            let slot = slice_free_ff_slot(nl, state, slice).expect("viable candidate has a free slot");
            let mut usage = state.slice_usage.remove(&slice).unwrap_or_default();
            try_absorb_ff(nl, slice, ff, slot, &mut usage);
            state.slice_usage.insert(slice, usage);
        } else {
            let name = format!("{}$slice", nl.cell(ff).name.clone());
            let slice = new_slice(nl, &name, "LOGIC");
            let mut usage = SliceUsage::default();
            try_absorb_ff(nl, slice, ff, 0, &mut usage);
            state.slice_usage.insert(slice, usage);
        }
    }
}
