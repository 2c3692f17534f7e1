//! Distributed-RAM packing (§4.2.5).
//!
//! Each `DPRAM16` cell expands into a fixed 3-slice cluster: `DPRAM0`
//! (root) and `DPRAM1` each realize half the RAM's data width by
//! repurposing their LUTs as writable storage and share the original
//! cell's data/address connections; `RAMW` carries the write port (`WCK`,
//! `WRE`) that the other two reference by cluster membership rather than
//! by a direct net. The original cell's write clock/reset are moved onto
//! `RAMW` rather than left connected to a cell that's about to be erased.

use crate::slice::{link_cluster, new_slice, try_absorb_ff};
use crate::state::{PackerState, SliceUsage};
use aion_netlist::{CellId, CellType, Netlist, NetId};

/// Expands every live `DPRAM16` cell into its 3-slice cluster.
pub fn run(nl: &mut Netlist, state: &mut PackerState) {
    let drams: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::Dpram16)
        .collect();

    for dram in drams {
        let base = nl.cell(dram).name.clone();
        let ramw = new_slice(nl, &format!("{base}$RAMW_SLICE"), "RAMW");
        let dpram0 = new_slice(nl, &format!("{base}$DPRAM0_SLICE"), "DPRAM");
        let dpram1 = new_slice(nl, &format!("{base}$DPRAM1_SLICE"), "DPRAM");

        let params = nl.cell(dram).params.clone();
        nl.cell_mut(dpram0).params.extend(params.clone());
        nl.cell_mut(dpram1).params.extend(params);

        move_port(nl, dram, "WCK", ramw, "WCK");
        move_port(nl, dram, "WRE", ramw, "WRE");

        let shared: Vec<(String, NetId)> = nl
            .cell(dram)
            .connections
            .iter()
            .map(|(p, n)| (p.clone(), *n))
            .collect();
        for (port, net) in shared {
            let was_driver = nl
                .net(net)
                .driver
                .as_ref()
                .is_some_and(|d| d.cell == dram && d.port == port);
            nl.disconnect_port(dram, &port, net);
            nl.connect_port(dpram0, &port, net, was_driver);
            nl.connect_port(dpram1, &port, net, false);
        }
        nl.erase_cell(dram);

        link_cluster(nl, dpram0, dpram1, 0, 0, 1, true);
        link_cluster(nl, dpram0, ramw, 0, 0, 2, true);

        let mut usage0 = SliceUsage {
            dpram: Some(dpram0),
            ..Default::default()
        };
        let mut usage1 = SliceUsage {
            dpram: Some(dpram1),
            ..Default::default()
        };
        for (slice, usage) in [(dpram0, &mut usage0), (dpram1, &mut usage1)] {
            for (slot, out_port) in [(0u32, "F0"), (1u32, "F1")] {
                let Some(net) = nl.cell(slice).port_net(out_port) else { continue };
                if nl.net(net).users.len() != 1 {
                    continue;
                }
                let user = nl.net(net).users[0].clone();
                if user.port != "DI" || nl.cell(user.cell).cell_type != CellType::TrellisFf {
                    continue;
                }
                if !can_pack_ff_dram(nl, slice, user.cell) {
                    continue;
                }
                try_absorb_ff(nl, slice, user.cell, slot, usage);
            }
        }
        state.slice_usage.insert(dpram0, usage0);
        state.slice_usage.insert(dpram1, usage1);
    }
}

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

/// §4.2.3's DPRAM-slot FF rule: the FF's `M` port must be unconnected, its
/// `CLKMUX` must agree with the slice's `WCKMUX` (or both default), and
/// likewise `LSRMUX`/`WREMUX`.
fn can_pack_ff_dram(nl: &Netlist, slice: CellId, ff: CellId) -> bool {
    if nl.cell(ff).port_net("M").is_some() {
        return false;
    }
    let wckmux = nl
        .cell(slice)
        .param("WCKMUX")
        .map(|p| p.str_or_default("WCK").to_string())
        .unwrap_or_else(|| "WCK".to_string());
    let clkmux = nl
        .cell(ff)
        .param("CLKMUX")
        .map(|p| p.str_or_default("CLK").to_string())
        .unwrap_or_else(|| "CLK".to_string());
    if wckmux != clkmux && !(wckmux == "WCK" && clkmux == "CLK") {
        return false;
    }
    let wremux = nl
        .cell(slice)
        .param("WREMUX")
        .map(|p| p.str_or_default("WRE").to_string())
        .unwrap_or_else(|| "WRE".to_string());
    let lsrmux = nl
        .cell(ff)
        .param("LSRMUX")
        .map(|p| p.str_or_default("LSR").to_string())
        .unwrap_or_else(|| "LSR".to_string());
    if wremux != lsrmux && !(wremux == "WRE" && lsrmux == "LSR") {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpram_expands_into_three_clustered_slices() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let dram = nl.create_cell("ram0", CellType::Dpram16);
        let wck = nl.create_net("wck");
        let wre = nl.create_net("wre");
        let di0 = nl.create_net("di0");
        nl.connect_port(dram, "WCK", wck, false);
        nl.connect_port(dram, "WRE", wre, false);
        nl.connect_port(dram, "DI0", di0, false);

        run(&mut nl, &mut state);
        nl.flush();

        assert!(nl.cell_by_name("ram0").is_none());
        let dpram0 = nl.cell_by_name("ram0$DPRAM0_SLICE").expect("dpram0 slice");
        let dpram1 = nl.cell_by_name("ram0$DPRAM1_SLICE").expect("dpram1 slice");
        let ramw = nl.cell_by_name("ram0$RAMW_SLICE").expect("ramw slice");

        assert_eq!(nl.cell(dpram1).cluster.as_ref().unwrap().root, dpram0);
        assert_eq!(nl.cell(dpram1).cluster.as_ref().unwrap().dz, 1);
        assert_eq!(nl.cell(ramw).cluster.as_ref().unwrap().dz, 2);
        assert_eq!(nl.cell(ramw).port_net("WCK"), Some(wck));
        assert_eq!(nl.cell(ramw).port_net("WRE"), Some(wre));
        assert!(nl.cell(dram).port_net("WCK").is_none());
        assert_eq!(nl.cell(dpram0).port_net("DI0"), Some(di0));
        assert_eq!(nl.cell(dpram1).port_net("DI0"), Some(di0));
    }

    #[test]
    fn ff_with_unrelated_clkmux_is_not_absorbed() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let dram = nl.create_cell("ram1", CellType::Dpram16);
        let f0 = nl.create_net("f0");
        nl.connect_port(dram, "F0", f0, true);

        run(&mut nl, &mut state);
        nl.flush();

        let dpram0 = nl.cell_by_name("ram1$DPRAM0_SLICE").expect("dpram0 slice");
        let ff = nl.create_cell("ff0", CellType::TrellisFf);
        nl.connect_port(ff, "DI", f0, false);
        nl.cell_mut(ff).params.insert("CLKMUX".to_string(), "FOO".into());

        assert!(!can_pack_ff_dram(&nl, dpram0, ff));
    }
}
