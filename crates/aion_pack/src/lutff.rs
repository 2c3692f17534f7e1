//! LUT-FF pair discovery (§4.2.1).
//!
//! A read-only analysis: for each `LUT4`/`PFUMX`/`L6MUX21` cell, if its `Z`
//! output drives exactly one flip-flop's `DI` input exclusively, and that
//! flip-flop has no `M` (preload) driver, the pairing is recorded
//! bidirectionally in [`PackerState`]. Later stages (mux expansion, DPRAM
//! expansion, pair packing) consult `lutff_pairs`/`fflut_pairs` rather than
//! re-deriving this relationship themselves.

use crate::state::PackerState;
use aion_netlist::{CellType, Netlist};

/// Populates `state.lutff_pairs`/`state.fflut_pairs` for every LUT-shaped
/// cell (`LUT4`, `PFUMX`, `L6MUX21`) with an exclusive FF consumer.
pub fn run(nl: &Netlist, state: &mut PackerState) {
    state.lutff_pairs.clear();
    state.fflut_pairs.clear();
    for cell in nl.live_cells() {
        if !matches!(
            nl.cell(cell).cell_type,
            CellType::Lut4 | CellType::Pfumx | CellType::L6Mux21
        ) {
            continue;
        }
        let Some(z) = nl.cell(cell).port_net("Z") else {
            continue;
        };
        let net = nl.net(z);
        if net.users.len() != 1 {
            continue;
        }
        let user = &net.users[0];
        if user.port != "DI" || nl.cell(user.cell).cell_type != CellType::TrellisFf {
            continue;
        }
        if nl.cell(user.cell).port_net("M").is_some() {
            continue;
        }
        state.lutff_pairs.insert(cell, user.cell);
        state.fflut_pairs.insert(user.cell, cell);
    }
}
