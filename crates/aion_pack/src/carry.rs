//! Carry-chain legalizer (§4.3).
//!
//! Discovers `CCU2C` chains along `COUT -> CIN` links, splits them at the
//! device's per-column SLICE capacity with synthesized feed-out cells,
//! prepends a feed-in cell when a chain's true head draws its carry-in from
//! fabric, and taps a feed-out-with-loopback onto a chain's tail when its
//! final `COUT` is still read downstream. Every resulting logical cell is
//! expanded into a `TRELLIS_SLICE(MODE=CCU2)` and clustered 4-per-tile.

use crate::error::PackError;
use crate::slice::{convert_to_slice, link_cluster, try_absorb_ff};
use crate::state::{PackerState, SliceUsage};
use aion_arch::Ecp5Device;
use aion_netlist::{CellId, CellType, Netlist, Property};

/// Runs carry-chain discovery, legalization, and SLICE packing.
pub fn run(
    nl: &mut Netlist,
    device: &dyn Ecp5Device,
    state: &mut PackerState,
) -> Result<(), PackError> {
    let l_max = legal_chain_length(device);
    let mut seq = 0u32;
    loop {
        let heads = find_chain_heads(nl);
        if heads.is_empty() {
            break;
        }
        for head in heads {
            if nl.is_packed(head) {
                continue;
            }
            let chain = walk_chain(nl, head);
            legalize_and_pack(nl, state, chain, l_max, &mut seq)?;
        }
    }
    nl.flush();
    Ok(())
}

fn legal_chain_length(device: &dyn Ecp5Device) -> usize {
    let (width, _height) = device.grid_size();
    (width.saturating_sub(4) * 4).saturating_sub(2).max(1) as usize
}

fn is_ccu2(nl: &Netlist, id: CellId) -> bool {
    nl.cell(id).cell_type == CellType::Ccu2c
}

/// A chain head: a live `CCU2C` whose `CIN` is not the `COUT` of another
/// `CCU2C`.
fn find_chain_heads(nl: &Netlist) -> Vec<CellId> {
    nl.live_cells()
        .into_iter()
        .filter(|&id| is_ccu2(nl, id))
        .filter(|&id| match nl.cell(id).port_net("CIN") {
            None => true,
            Some(net) => match &nl.net(net).driver {
                None => true,
                Some(d) => !(is_ccu2(nl, d.cell) && d.port == "COUT"),
            },
        })
        .collect()
}

/// Walks forward from `head` along `COUT -> CIN` links while `COUT`'s net
/// has exactly one user.
fn walk_chain(nl: &Netlist, head: CellId) -> Vec<CellId> {
    let mut chain = vec![head];
    let mut current = head;
    loop {
        let Some(cout) = nl.cell(current).port_net("COUT") else {
            break;
        };
        let net = nl.net(cout);
        if net.users.len() != 1 {
            break;
        }
        let next = &net.users[0];
        if next.port != "CIN" || !is_ccu2(nl, next.cell) {
            break;
        }
        current = next.cell;
        chain.push(current);
    }
    chain
}

fn bump(seq: &mut u32) -> u32 {
    let v = *seq;
    *seq += 1;
    v
}

fn new_feed_cell(nl: &mut Netlist, name: String, init0: u64, init1: u64, inject0: &str, inject1: &str) -> CellId {
    let id = nl.create_cell(name, CellType::Ccu2c);
    nl.cell_mut(id).params.extend([
        ("INIT0".to_string(), Property::from_int(init0, 16)),
        ("INIT1".to_string(), Property::from_int(init1, 16)),
        ("INJECT1_0".to_string(), Property::from_str(inject0)),
        ("INJECT1_1".to_string(), Property::from_str(inject1)),
    ]);
    id
}

/// Splits, legalizes, and packs a single discovered chain.
fn legalize_and_pack(
    nl: &mut Netlist,
    state: &mut PackerState,
    chain: Vec<CellId>,
    l_max: usize,
    seq: &mut u32,
) -> Result<(), PackError> {
    let head = chain[0];
    let head_name = nl.cell(head).name.clone();
    let mut logical: Vec<CellId> = Vec::new();

    if let Some(fabric_net) = nl.cell(head).port_net("CIN") {
        let feed_in = new_feed_cell(
            nl,
            format!("$PACKER_CARRY_FEEDIN_{}", bump(seq)),
            10,
            0xFFFF,
            "NO",
            "YES",
        );
        nl.connect_port(feed_in, "CIN", fabric_net, false);
        let bridge = nl.create_net(format!("$PACKER_CARRY_FEEDIN_{}_COUT", seq));
        nl.connect_port(feed_in, "COUT", bridge, true);
        nl.move_port_to(head, "CIN", fabric_net, bridge);
        logical.push(feed_in);
    }

    let mut in_subchain = 0usize;
    for &cell in &chain {
        if in_subchain == l_max {
            let Some(&prev) = logical.last() else {
                return Err(PackError::CarryFeedOutNotFound {
                    chain_root: head_name.clone(),
                });
            };
            let Some(link_net) = nl.cell(prev).port_net("COUT") else {
                return Err(PackError::CarryFeedOutNotFound {
                    chain_root: head_name.clone(),
                });
            };
            let feed_out = new_feed_cell(
                nl,
                format!("$PACKER_CARRY_FEEDOUT_{}", bump(seq)),
                0,
                10,
                "NO",
                "NO",
            );
            nl.connect_port(feed_out, "CIN", link_net, false);
            let bridge = nl.create_net(format!("$PACKER_CARRY_FEEDOUT_{}_COUT", seq));
            nl.connect_port(feed_out, "COUT", bridge, true);
            nl.move_port_to(cell, "CIN", link_net, bridge);
            logical.push(feed_out);
            in_subchain = 0;
        }
        logical.push(cell);
        in_subchain += 1;
    }

    if let Some(loopback) = apply_terminal_loopback(nl, seq, *chain.last().unwrap())? {
        logical.push(loopback);
    }

    let mut root: Option<CellId> = None;
    for (i, cell) in logical.into_iter().enumerate() {
        let name = format!("{}$slice", nl.cell(cell).name.clone());
        let slice_id = convert_to_slice(nl, cell, &name, "CCU2");
        match root {
            None => root = Some(slice_id),
            Some(r) => link_cluster(nl, r, slice_id, (i / 4) as i32, 0, (i % 4) as i32, true),
        }
        let mut usage = state.slice_usage.remove(&slice_id).unwrap_or_default();
        absorb_output_ff(nl, slice_id, "F0", 0, &mut usage);
        absorb_output_ff(nl, slice_id, "F1", 1, &mut usage);
        state.slice_usage.insert(slice_id, usage);
    }

    Ok(())
}

/// If the chain's tail `COUT` is still read by anything, taps a
/// feed-out-with-loopback onto it: any downstream `CCU2C` `CIN` consumer
/// (a chain this walk never discovered, because the fanout disqualified it
/// from a simple linear extension) is migrated onto the new bridge net;
/// fabric consumers keep reading the original net directly.
fn apply_terminal_loopback(
    nl: &mut Netlist,
    seq: &mut u32,
    last_cell: CellId,
) -> Result<Option<CellId>, PackError> {
    let Some(cout) = nl.cell(last_cell).port_net("COUT") else {
        return Ok(None);
    };
    let users = nl.net(cout).users.clone();
    if users.is_empty() {
        return Ok(None);
    }
    let feed_out = new_feed_cell(
        nl,
        format!("$PACKER_CARRY_FEEDOUT_{}", bump(seq)),
        0,
        10,
        "NO",
        "NO",
    );
    nl.connect_port(feed_out, "CIN", cout, false);
    let bridge = nl.create_net(format!("$PACKER_CARRY_FEEDOUT_{}_COUT", seq));
    nl.connect_port(feed_out, "COUT", bridge, true);
    for u in users {
        if u.port == "CIN" && is_ccu2(nl, u.cell) {
            nl.move_port_to(u.cell, "CIN", cout, bridge);
        }
    }
    Ok(Some(feed_out))
}

/// Opportunistically absorbs a flip-flop exclusively driven by a slice's
/// `F0`/`F1` output into the matching `FF0`/`FF1` slot.
fn absorb_output_ff(nl: &mut Netlist, slice: CellId, out_port: &str, slot: u32, usage: &mut SliceUsage) {
    let Some(net) = nl.cell(slice).port_net(out_port) else {
        return;
    };
    let users = nl.net(net).users.clone();
    if users.len() != 1 {
        return;
    }
    let u = &users[0];
    if u.port != "DI" || nl.cell(u.cell).cell_type != CellType::TrellisFf {
        return;
    }
    try_absorb_ff(nl, slice, u.cell, slot, usage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedWidthDevice(u32);

    impl Ecp5Device for FixedWidthDevice {
        fn device_name(&self) -> &str {
            "TEST"
        }
        fn device_kind(&self) -> aion_arch::DeviceKind {
            aion_arch::DeviceKind::Lfe5u
        }
        fn grid_size(&self) -> (u32, u32) {
            (self.0, self.0)
        }
        fn bels(&self) -> Vec<aion_arch::BelId> {
            unimplemented!()
        }
        fn bel_type(&self, _bel: aion_arch::BelId) -> aion_arch::BelType {
            unimplemented!()
        }
        fn bel_location(&self, _bel: aion_arch::BelId) -> (u32, u32, u32) {
            unimplemented!()
        }
        fn bel_by_name(&self, _name: &str) -> Option<aion_arch::BelId> {
            unimplemented!()
        }
        fn bel_by_location(&self, _x: u32, _y: u32, _z: u32) -> Option<aion_arch::BelId> {
            unimplemented!()
        }
        fn bel_pins(&self, _bel: aion_arch::BelId) -> Vec<aion_arch::BelPin> {
            unimplemented!()
        }
        fn bel_pin_wire(&self, _bel: aion_arch::BelId, _pin_name: &str) -> Option<aion_arch::WireId> {
            unimplemented!()
        }
        fn check_bel_avail(&self, _bel: aion_arch::BelId) -> bool {
            unimplemented!()
        }
        fn bind_bel(&mut self, _bel: aion_arch::BelId) {
            unimplemented!()
        }
        fn pips_uphill(&self, _wire: aion_arch::WireId) -> Vec<aion_arch::PipId> {
            unimplemented!()
        }
        fn pips_downhill(&self, _wire: aion_arch::WireId) -> Vec<aion_arch::PipId> {
            unimplemented!()
        }
        fn pip_src_wire(&self, _pip: aion_arch::PipId) -> aion_arch::WireId {
            unimplemented!()
        }
        fn pip_dst_wire(&self, _pip: aion_arch::PipId) -> aion_arch::WireId {
            unimplemented!()
        }
        fn bind_pip(&mut self, _pip: aion_arch::PipId) {
            unimplemented!()
        }
        fn wire_bel_pins(&self, _wire: aion_arch::WireId) -> Vec<(aion_arch::BelId, String)> {
            unimplemented!()
        }
        fn wire_basename(&self, _wire: aion_arch::WireId) -> String {
            unimplemented!()
        }
        fn package_pin_bel(&self, _pin_name: &str) -> Option<aion_arch::BelId> {
            unimplemented!()
        }
        fn pio_bel_bank(&self, _bel: aion_arch::BelId) -> Option<u32> {
            unimplemented!()
        }
        fn pio_dqs_group(&self, _bel: aion_arch::BelId) -> Option<aion_arch::DqsGroup> {
            unimplemented!()
        }
        fn io_banks(&self) -> &[aion_arch::IoBank] {
            unimplemented!()
        }
    }

    fn chain_of(nl: &mut Netlist, n: usize) -> Vec<CellId> {
        let mut cells = Vec::new();
        for i in 0..n {
            cells.push(nl.create_cell(format!("ccu2_{i}"), CellType::Ccu2c));
        }
        for i in 0..n - 1 {
            let net = nl.create_net(format!("carry_{i}"));
            nl.connect_port(cells[i], "COUT", net, true);
            nl.connect_port(cells[i + 1], "CIN", net, false);
        }
        cells
    }

    #[test]
    fn walk_chain_follows_single_fanout_cout_links() {
        let mut nl = Netlist::new();
        let cells = chain_of(&mut nl, 3);
        let heads = find_chain_heads(&nl);
        assert_eq!(heads, vec![cells[0]]);
        assert_eq!(walk_chain(&nl, cells[0]), cells);
    }

    #[test]
    fn chain_fitting_in_one_column_becomes_one_cluster() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let device = FixedWidthDevice(20); // l_max = (20-4)*4-2 = 62
        chain_of(&mut nl, 4);
        run(&mut nl, &device, &mut state).unwrap();

        let slices: Vec<_> = nl
            .live_cells()
            .into_iter()
            .filter(|&id| nl.cell(id).cell_type == CellType::TrellisSlice)
            .collect();
        assert_eq!(slices.len(), 4);
        let root = nl.cell(slices[0]).cluster_children.clone();
        assert_eq!(root.len(), 3);
    }

    #[test]
    fn fabric_driven_head_gets_a_feed_in() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let device = FixedWidthDevice(20);
        let cells = chain_of(&mut nl, 2);
        let lut = nl.create_cell("lut_src", CellType::Lut4);
        let fabric = nl.create_net("fabric_cin");
        nl.connect_port(lut, "Z", fabric, true);
        nl.connect_port(cells[0], "CIN", fabric, false);

        run(&mut nl, &device, &mut state).unwrap();

        let slices: Vec<_> = nl
            .live_cells()
            .into_iter()
            .filter(|&id| nl.cell(id).cell_type == CellType::TrellisSlice)
            .collect();
        // 2 original cells + 1 synthesized feed-in.
        assert_eq!(slices.len(), 3);
        let feed_in = slices
            .iter()
            .find(|&&id| nl.cell(id).name.contains("FEEDIN"))
            .expect("feed-in slice present");
        assert_eq!(
            nl.cell(*feed_in).param("INIT1").unwrap().int_or_default(0),
            0xFFFF
        );
    }

    #[test]
    fn chain_longer_than_column_splits_with_a_feed_out() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let device = FixedWidthDevice(5); // l_max = (5-4)*4-2 = 2
        chain_of(&mut nl, 5);

        run(&mut nl, &device, &mut state).unwrap();

        let slices: Vec<_> = nl
            .live_cells()
            .into_iter()
            .filter(|&id| nl.cell(id).cell_type == CellType::TrellisSlice)
            .collect();
        // 5 original cells + feed-outs at each 2-cell boundary (after cell
        // index 2 and index 4): 5 + 2 = 7.
        assert_eq!(slices.len(), 7);
        assert!(slices.iter().any(|&id| nl.cell(id).name.contains("FEEDOUT")));
    }

    #[test]
    fn terminal_cout_read_by_fabric_gets_loopback_tap() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let device = FixedWidthDevice(20);
        let cells = chain_of(&mut nl, 2);
        let sink = nl.create_cell("sink", CellType::TrellisComb);
        let tail_cout = nl.create_net("tail_cout");
        nl.connect_port(cells[1], "COUT", tail_cout, true);
        nl.connect_port(sink, "I", tail_cout, false);

        run(&mut nl, &device, &mut state).unwrap();

        let slices: Vec<_> = nl
            .live_cells()
            .into_iter()
            .filter(|&id| nl.cell(id).cell_type == CellType::TrellisSlice)
            .collect();
        assert_eq!(slices.len(), 3);
        assert!(slices.iter().any(|&id| nl.cell(id).name.contains("FEEDOUT")));
        // The fabric sink still reads the original net, untouched.
        assert_eq!(nl.cell(sink).port_net("I"), Some(tail_cout));
    }
}
