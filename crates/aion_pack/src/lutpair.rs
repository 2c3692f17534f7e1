//! LUT-LUT pair discovery and FF compatibility (§4.2.2, §4.2.3).

use crate::config::PackerConfig;
use crate::state::PackerState;
use aion_netlist::{CellId, CellType, Netlist, NetId};

const LUT_INPUTS: [&str; 4] = ["A", "B", "C", "D"];

/// Populates `state.lut_pairs` by running the five-step priority search
/// for every unprocessed `LUT4`.
pub fn run(nl: &Netlist, state: &mut PackerState, config: &PackerConfig) {
    state.lut_pairs.clear();
    let luts: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::Lut4)
        .collect();

    for &lut in &luts {
        if is_paired(state, lut) {
            continue;
        }
        let partner = fanout_partner(nl, state, lut)
            .or_else(|| ff_fanout_partner(nl, state, lut))
            .or_else(|| fanin_partner(nl, state, lut))
            .or_else(|| common_sink_partner(nl, state, config, lut))
            .or_else(|| common_input_partner(nl, state, config, lut));
        if let Some(partner) = partner {
            if ff_compatible(nl, state, lut, partner) {
                state.lut_pairs.insert(lut, partner);
                state.lut_pairs.insert(partner, lut);
            }
        }
    }
}

fn is_paired(state: &PackerState, lut: CellId) -> bool {
    state.lut_pairs.contains_key(&lut)
}

fn is_unpaired_lut(nl: &Netlist, state: &PackerState, id: CellId) -> bool {
    nl.cell(id).cell_type == CellType::Lut4 && !is_paired(state, id)
}

/// Step 1: a LUT driven by `lut`'s own `Z` output.
fn fanout_partner(nl: &Netlist, state: &PackerState, lut: CellId) -> Option<CellId> {
    let z = nl.cell(lut).port_net("Z")?;
    for user in &nl.net(z).users {
        if is_unpaired_lut(nl, state, user.cell) && LUT_INPUTS.contains(&user.port.as_str()) {
            return Some(user.cell);
        }
    }
    None
}

/// Step 2: a LUT driven by `lut`'s paired FF's `Q` output.
fn ff_fanout_partner(nl: &Netlist, state: &PackerState, lut: CellId) -> Option<CellId> {
    let ff = *state.lutff_pairs.get(&lut)?;
    let q = nl.cell(ff).port_net("Q")?;
    for user in &nl.net(q).users {
        if is_unpaired_lut(nl, state, user.cell) && LUT_INPUTS.contains(&user.port.as_str()) {
            return Some(user.cell);
        }
    }
    None
}

/// Step 3: a LUT driving one of `lut`'s inputs directly, or whose paired
/// FF drives one of `lut`'s inputs.
fn fanin_partner(nl: &Netlist, state: &PackerState, lut: CellId) -> Option<CellId> {
    for port in LUT_INPUTS {
        let Some(net) = nl.cell(lut).port_net(port) else { continue };
        let Some(driver) = &nl.net(net).driver else { continue };
        if is_unpaired_lut(nl, state, driver.cell) {
            return Some(driver.cell);
        }
        if nl.cell(driver.cell).cell_type == CellType::TrellisFf {
            if let Some(&src_lut) = state.fflut_pairs.get(&driver.cell) {
                if is_unpaired_lut(nl, state, src_lut) {
                    return Some(src_lut);
                }
            }
        }
    }
    None
}

/// Step 4: if `lut`'s fanout is small, another unpaired LUT feeding the
/// same downstream sink.
fn common_sink_partner(
    nl: &Netlist,
    state: &PackerState,
    config: &PackerConfig,
    lut: CellId,
) -> Option<CellId> {
    let z = nl.cell(lut).port_net("Z")?;
    let users = &nl.net(z).users;
    if users.len() as u32 > config.common_sink_fanout_limit {
        return None;
    }
    for user in users {
        let sink = user.cell;
        for (_, &other_net) in &nl.cell(sink).connections {
            if other_net == z {
                continue;
            }
            let Some(driver) = &nl.net(other_net).driver else { continue };
            if driver.cell != lut && is_unpaired_lut(nl, state, driver.cell) {
                return Some(driver.cell);
            }
        }
    }
    None
}

/// Step 5: another unpaired LUT sharing a low-fanout input net with
/// `lut`, preferring the lowest-fanout shared net.
fn common_input_partner(
    nl: &Netlist,
    state: &PackerState,
    config: &PackerConfig,
    lut: CellId,
) -> Option<CellId> {
    let mut candidates: Vec<(usize, CellId, NetId)> = Vec::new();
    for port in LUT_INPUTS {
        let Some(net) = nl.cell(lut).port_net(port) else { continue };
        let fanout = nl.net(net).users.len();
        if fanout as u32 > config.common_input_fanout_limit {
            continue;
        }
        for user in &nl.net(net).users {
            if user.cell != lut && is_unpaired_lut(nl, state, user.cell) {
                candidates.push((fanout, user.cell, net));
            }
        }
    }
    candidates.sort_by_key(|&(fanout, _, net)| (fanout, net.as_raw()));
    candidates.first().map(|&(_, cell, _)| cell)
}

/// §4.2.3's full FF compatibility check: `{CLK, CE, LSR}` nets and
/// `{CLKMUX, CEMUX, LSRMUX, SRMODE, GSR}` parameters must all agree
/// (falling back to the documented defaults when unset).
pub fn can_pack_ffs(nl: &Netlist, a: CellId, b: CellId) -> bool {
    for port in ["CLK", "CE", "LSR"] {
        if nl.cell(a).port_net(port) != nl.cell(b).port_net(port) {
            return false;
        }
    }
    for (param, default) in [
        ("CLKMUX", "CLK"),
        ("CEMUX", "1"),
        ("LSRMUX", "LSR"),
        ("SRMODE", "LSR_OVER_CE"),
        ("GSR", "DISABLED"),
    ] {
        if param_str(nl, a, param, default) != param_str(nl, b, param, default) {
            return false;
        }
    }
    true
}

/// The tile-level (4-slice) variant of [`can_pack_ffs`]: omits `CE`/`CEMUX`.
pub fn can_pack_ffs_in_tile(nl: &Netlist, a: CellId, b: CellId) -> bool {
    for port in ["CLK", "LSR"] {
        if nl.cell(a).port_net(port) != nl.cell(b).port_net(port) {
            return false;
        }
    }
    for (param, default) in [
        ("CLKMUX", "CLK"),
        ("LSRMUX", "LSR"),
        ("SRMODE", "LSR_OVER_CE"),
        ("GSR", "DISABLED"),
    ] {
        if param_str(nl, a, param, default) != param_str(nl, b, param, default) {
            return false;
        }
    }
    true
}

fn param_str(nl: &Netlist, cell: CellId, name: &str, default: &str) -> String {
    nl.cell(cell)
        .param(name)
        .map(|p| p.str_or_default(default).to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Runs the FF compatibility check for `lut`'s and `partner`'s paired
/// FFs; unpaired LUTs are always compatible.
fn ff_compatible(nl: &Netlist, state: &PackerState, lut: CellId, partner: CellId) -> bool {
    let ff_a = state.lutff_pairs.get(&lut);
    let ff_b = state.lutff_pairs.get(&partner);
    match (ff_a, ff_b) {
        (Some(&a), Some(&b)) => can_pack_ffs(nl, a, b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_lut(nl: &mut Netlist, name: &str) -> CellId {
        nl.create_cell(name, CellType::Lut4)
    }

    #[test]
    fn fanout_pairing_wins_first() {
        let mut nl = Netlist::new();
        let config = PackerConfig::default();
        let lut0 = make_lut(&mut nl, "lut0");
        let lut1 = make_lut(&mut nl, "lut1");
        let z = nl.create_net("z");
        nl.connect_port(lut0, "Z", z, true);
        nl.connect_port(lut1, "A", z, false);

        let mut state = PackerState::new();
        run(&nl, &mut state, &config);

        assert_eq!(state.lut_pairs.get(&lut0), Some(&lut1));
        assert_eq!(state.lut_pairs.get(&lut1), Some(&lut0));
    }

    #[test]
    fn incompatible_paired_ffs_block_the_match() {
        let mut nl = Netlist::new();
        let config = PackerConfig::default();
        let lut0 = make_lut(&mut nl, "lut0");
        let lut1 = make_lut(&mut nl, "lut1");
        let z = nl.create_net("z");
        nl.connect_port(lut0, "Z", z, true);
        nl.connect_port(lut1, "A", z, false);

        let ff0 = nl.create_cell("ff0", CellType::TrellisFf);
        let ff1 = nl.create_cell("ff1", CellType::TrellisFf);
        let clk_a = nl.create_net("clk_a");
        let clk_b = nl.create_net("clk_b");
        nl.connect_port(ff0, "CLK", clk_a, false);
        nl.connect_port(ff1, "CLK", clk_b, false);

        let mut state = PackerState::new();
        state.lutff_pairs.insert(lut0, ff0);
        state.lutff_pairs.insert(lut1, ff1);
        run(&nl, &mut state, &config);

        assert!(!state.lut_pairs.contains_key(&lut0));
    }

    #[test]
    fn common_input_pairing_prefers_lowest_fanout_net() {
        let mut nl = Netlist::new();
        let config = PackerConfig::default();
        let lut0 = make_lut(&mut nl, "lut0");
        let lut_far = make_lut(&mut nl, "lut_far");
        let lut_near = make_lut(&mut nl, "lut_near");
        let shared_wide = nl.create_net("wide");
        let shared_narrow = nl.create_net("narrow");
        nl.connect_port(lut0, "A", shared_wide, false);
        nl.connect_port(lut_far, "A", shared_wide, false);
        let extra_user = nl.create_cell("extra", CellType::TrellisComb);
        nl.connect_port(extra_user, "I", shared_wide, false);

        nl.connect_port(lut0, "B", shared_narrow, false);
        nl.connect_port(lut_near, "B", shared_narrow, false);

        let mut state = PackerState::new();
        run(&nl, &mut state, &config);

        assert_eq!(state.lut_pairs.get(&lut0), Some(&lut_near));
    }

    #[test]
    fn can_pack_ffs_in_tile_ignores_ce() {
        let mut nl = Netlist::new();
        let ff0 = nl.create_cell("ff0", CellType::TrellisFf);
        let ff1 = nl.create_cell("ff1", CellType::TrellisFf);
        let ce_a = nl.create_net("ce_a");
        let ce_b = nl.create_net("ce_b");
        nl.connect_port(ff0, "CE", ce_a, false);
        nl.connect_port(ff1, "CE", ce_b, false);

        assert!(!can_pack_ffs(&nl, ff0, ff1));
        assert!(can_pack_ffs_in_tile(&nl, ff0, ff1));
    }
}
