//! LUT5/6/7 mux expansion (§4.2.4).
//!
//! Folds a `PFUMX` and its two driving `LUT4`s into one `TRELLIS_SLICE`
//! (LUT5), then an `L6MUX21` whose `D0`/`D1` are both SLICE `OFX0` outputs
//! into a 2-slice cluster (LUT6), then an `L6MUX21` whose `D0`/`D1` are
//! both `OFX1` outputs of LUT6 clusters into a 4-slice cluster (LUT7).
//! Each pass flushes before the next: LUT6 packing looks for slices LUT5
//! packing created, and LUT7 packing looks for clusters LUT6 packing
//! created.

use crate::error::PackError;
use crate::slice::{link_cluster, try_absorb_ff};
use crate::state::{PackerState, SliceUsage};
use aion_netlist::{CellId, CellType, Netlist, NetId, Property};

/// Runs all three mux-expansion passes.
pub fn run(nl: &mut Netlist, state: &mut PackerState) -> Result<(), PackError> {
    pack_lut5(nl, state)?;
    nl.flush();
    pack_lut6(nl, state);
    nl.flush();
    pack_lut7(nl, state);
    nl.flush();
    Ok(())
}

fn driven_by(nl: &Netlist, net: NetId, cell_type: CellType, port: &str) -> Option<CellId> {
    let driver = nl.net(net).driver.as_ref()?;
    if nl.cell(driver.cell).cell_type == cell_type && driver.port == port {
        Some(driver.cell)
    } else {
        None
    }
}

/// Moves `old_port` of `src` onto `new_port` of `dst`, preserving whether
/// it acted as a driver or a user.
fn move_port(nl: &mut Netlist, src: CellId, old_port: &str, dst: CellId, new_port: &str) {
    if let Some(net) = nl.cell(src).port_net(old_port) {
        let was_driver = nl
            .net(net)
            .driver
            .as_ref()
            .is_some_and(|d| d.cell == src && d.port == old_port);
        nl.disconnect_port(src, old_port, net);
        nl.connect_port(dst, new_port, net, was_driver);
    }
}

fn move_lut_inputs(nl: &mut Netlist, lut: CellId, slice: CellId, suffix: char) {
    for port in ["A", "B", "C", "D"] {
        move_port(nl, lut, port, slice, &format!("{port}{suffix}"));
    }
}

fn required_port(nl: &Netlist, cell: CellId, cell_type: &str, port: &str) -> Result<NetId, PackError> {
    nl.cell(cell).port_net(port).ok_or_else(|| PackError::MissingRequiredPort {
        cell: nl.cell(cell).name.clone(),
        cell_type: cell_type.to_string(),
        port: port.to_string(),
    })
}

/// Folds every `PFUMX` into a single `TRELLIS_SLICE` holding both feeding
/// LUTs (LUT5 collapse, §8 scenario 4).
fn pack_lut5(nl: &mut Netlist, state: &mut PackerState) -> Result<(), PackError> {
    let muxes: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::Pfumx)
        .collect();

    for mux in muxes {
        let f0 = required_port(nl, mux, "PFUMX", "BLUT")?;
        let f1 = required_port(nl, mux, "PFUMX", "ALUT")?;
        let lut0 = driven_by(nl, f0, CellType::Lut4, "Z").ok_or_else(|| PackError::MalformedInput {
            cell: nl.cell(mux).name.clone(),
            reason: "BLUT not driven by a LUT4's Z output".to_string(),
        })?;
        let lut1 = driven_by(nl, f1, CellType::Lut4, "Z").ok_or_else(|| PackError::MalformedInput {
            cell: nl.cell(mux).name.clone(),
            reason: "ALUT not driven by a LUT4's Z output".to_string(),
        })?;

        let slice = nl.create_cell(format!("{}$slice", nl.cell(mux).name.clone()), CellType::TrellisSlice);
        nl.cell_mut(slice).params.insert("MODE".to_string(), "LOGIC".into());
        move_lut_inputs(nl, lut0, slice, '0');
        move_lut_inputs(nl, lut1, slice, '1');
        let init0 = nl.cell(lut0).param("INIT").cloned().unwrap_or_else(|| Property::from_int(0, 16));
        let init1 = nl.cell(lut1).param("INIT").cloned().unwrap_or_else(|| Property::from_int(0, 16));
        nl.cell_mut(slice).params.insert("LUT0_INITVAL".to_string(), init0);
        nl.cell_mut(slice).params.insert("LUT1_INITVAL".to_string(), init1);

        move_port(nl, mux, "C0", slice, "M0");
        move_port(nl, mux, "Z", slice, "OFX0");

        let mut usage = SliceUsage {
            lut0: Some(lut0),
            lut1: Some(lut1),
            mux5: Some(slice),
            ..Default::default()
        };

        nl.erase_cell(lut0);
        nl.erase_cell(lut1);

        if let Some(&ff) = state.lutff_pairs.get(&mux) {
            try_absorb_ff(nl, slice, ff, 0, &mut usage);
            state.lutff_pairs.remove(&mux);
            state.fflut_pairs.remove(&ff);
        }
        state.slice_usage.insert(slice, usage);

        nl.erase_cell(mux);
    }
    Ok(())
}

/// Folds an `L6MUX21` whose `D0`/`D1` are both SLICE `OFX0` outputs into a
/// 2-slice LUT6 cluster. Muxes whose inputs don't match this shape are left
/// alone for the LUT7 pass.
fn pack_lut6(nl: &mut Netlist, state: &mut PackerState) {
    let muxes: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::L6Mux21)
        .collect();

    for mux in muxes {
        let Some(d0) = nl.cell(mux).port_net("D0") else { continue };
        let Some(d1) = nl.cell(mux).port_net("D1") else { continue };
        let Some(slice0) = driven_by(nl, d0, CellType::TrellisSlice, "OFX0") else { continue };
        let Some(slice1) = driven_by(nl, d1, CellType::TrellisSlice, "OFX0") else { continue };

        move_port(nl, mux, "D0", slice1, "FXA");
        move_port(nl, mux, "D1", slice1, "FXB");
        move_port(nl, mux, "SD", slice1, "M1");
        move_port(nl, mux, "Z", slice1, "OFX1");

        link_cluster(nl, slice1, slice0, 0, 0, 1, false);

        if let Some(&ff) = state.lutff_pairs.get(&mux) {
            let mut usage = state.slice_usage.remove(&slice1).unwrap_or_default();
            try_absorb_ff(nl, slice1, ff, 1, &mut usage);
            state.slice_usage.insert(slice1, usage);
            state.lutff_pairs.remove(&mux);
            state.fflut_pairs.remove(&ff);
        }

        nl.erase_cell(mux);
    }
}

/// Folds an `L6MUX21` whose `D0`/`D1` are both `OFX1` outputs of existing
/// LUT6 clusters into a 4-slice LUT7 cluster, re-rooting all four slices
/// under the slice backing the new mux's own output.
fn pack_lut7(nl: &mut Netlist, state: &mut PackerState) {
    let muxes: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::L6Mux21)
        .collect();

    for mux in muxes {
        let Some(d0) = nl.cell(mux).port_net("D0") else { continue };
        let Some(d1) = nl.cell(mux).port_net("D1") else { continue };
        let Some(slice1) = driven_by(nl, d0, CellType::TrellisSlice, "OFX1") else { continue };
        let Some(slice3) = driven_by(nl, d1, CellType::TrellisSlice, "OFX1") else { continue };

        let Some(fxa0) = nl.cell(slice1).port_net("FXA") else { continue };
        let Some(fxa1) = nl.cell(slice3).port_net("FXA") else { continue };
        let Some(slice0) = driven_by(nl, fxa0, CellType::TrellisSlice, "OFX0") else { continue };
        let Some(slice2) = driven_by(nl, fxa1, CellType::TrellisSlice, "OFX0") else { continue };

        move_port(nl, mux, "D0", slice2, "FXA");
        move_port(nl, mux, "D1", slice2, "FXB");
        move_port(nl, mux, "SD", slice2, "M1");
        move_port(nl, mux, "Z", slice2, "OFX1");

        for s in [slice0, slice1, slice2, slice3] {
            nl.cell_mut(s).cluster = None;
            nl.cell_mut(s).cluster_children.clear();
        }
        link_cluster(nl, slice3, slice2, 0, 0, 1, true);
        link_cluster(nl, slice3, slice1, 0, 0, 2, true);
        link_cluster(nl, slice3, slice0, 0, 0, 3, true);

        if let Some(&ff) = state.lutff_pairs.get(&mux) {
            let mut usage = state.slice_usage.remove(&slice2).unwrap_or_default();
            try_absorb_ff(nl, slice2, ff, 1, &mut usage);
            state.slice_usage.insert(slice2, usage);
            state.lutff_pairs.remove(&mux);
            state.fflut_pairs.remove(&ff);
        }

        nl.erase_cell(mux);
    }
}
