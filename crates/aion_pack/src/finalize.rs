//! Global-net promotion and the post-pack integrity check (§2 stage 18).
//!
//! Promotion marks high-fanout clock/reset nets `ECP5_IS_GLOBAL` so later
//! routing stages route them on the dedicated global tree instead of general
//! interconnect. The integrity check re-verifies the universally quantified
//! invariants of §8 over the fully packed netlist; a violation here is a bug
//! in an earlier stage, not a user-facing error, so it surfaces as
//! [`InternalError`] rather than [`PackError`].

use crate::config::PackerConfig;
use aion_common::{AionResult, InternalError};
use aion_netlist::{CellType, Netlist, Property};

const CLOCK_LIKE_PORTS: [&str; 3] = ["CLK", "LSR", "ECLK"];

/// Marks nets that drive many `CLK`/`LSR`/`ECLK` ports as global.
pub fn promote_globals(nl: &mut Netlist, config: &PackerConfig) {
    let nets = nl.nets();
    for net in nets {
        let clock_like_fanout = nl
            .net(net)
            .users
            .iter()
            .filter(|u| CLOCK_LIKE_PORTS.contains(&u.port.as_str()))
            .count() as u32;
        if clock_like_fanout >= config.global_promotion_fanout {
            nl.net_mut(net).attrs.insert("ECP5_IS_GLOBAL".to_string(), Property::from_int(1, 1));
        }
    }
}

/// Re-verifies invariants 1-4 of §8 over the final packed netlist.
pub fn check_integrity(nl: &Netlist) -> AionResult<()> {
    for cell in nl.live_cells() {
        let cell_type = nl.cell(cell).cell_type;
        if cell_type == CellType::Lut4 && nl.cell(cell).name.starts_with("$PACKER_") {
            continue;
        }
        if matches!(
            cell_type,
            CellType::Pfumx
                | CellType::L6Mux21
                | CellType::Ccu2c
                | CellType::Dpram16
                | CellType::Gnd
                | CellType::Vcc
                | CellType::NextpnrIbuf
                | CellType::NextpnrObuf
                | CellType::NextpnrIobuf
                | CellType::Iddrx1F
                | CellType::Oddrx1F
                | CellType::Iddrx2F
                | CellType::Oddrx2F
                | CellType::Iddr71B
                | CellType::Oddr71B
                | CellType::Oshx2A
                | CellType::Tshx2Dqa
                | CellType::Tshx2Dqsa
                | CellType::Iddrx2Dqa
                | CellType::Oddrx2Dqa
                | CellType::Oddrx2Dqsb
                | CellType::Delayf
                | CellType::Delayg
        ) {
            return Err(InternalError::new(format!(
                "input-only cell type {cell_type:?} survived packing on cell '{}'",
                nl.cell(cell).name
            )));
        }
        for (port, &net) in &nl.cell(cell).connections {
            let n = nl.net(net);
            let is_driver = n.driver.as_ref().is_some_and(|d| d.cell == cell && &d.port == port);
            let is_user = n.users.iter().any(|u| u.cell == cell && &u.port == port);
            if !is_driver && !is_user {
                return Err(InternalError::new(format!(
                    "cell '{}' port '{port}' is connected to net '{}' but neither drives nor uses it",
                    nl.cell(cell).name,
                    n.name
                )));
            }
        }
    }

    for cell in nl.live_cells() {
        if nl.cell(cell).cell_type != CellType::TrellisSlice {
            continue;
        }
        let luts = ["LUT1_INITVAL", "LUT2_INITVAL"].iter().filter(|k| nl.cell(cell).attrs.contains_key(**k)).count();
        if luts > 2 {
            return Err(InternalError::new(format!("SLICE '{}' holds more than two LUT init masks", nl.cell(cell).name)));
        }
    }

    Ok(())
}
