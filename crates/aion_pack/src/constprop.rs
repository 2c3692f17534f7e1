//! Constant propagation & LUT rewriter (§4.1).
//!
//! Rewrites every `GND`/`VCC` pseudo-cell's users according to a
//! per-consumer policy, synthesizing a single shared tie-low/tie-high LUT
//! lazily, only if some user ends up needing a literal net rather than a
//! parameter fold.

use crate::error::PackError;
use aion_common::{Logic, LogicVec};
use aion_netlist::{CellType, Netlist, Property};

const LUT_INPUTS: [&str; 4] = ["A", "B", "C", "D"];

/// Runs constant propagation over the whole netlist.
pub fn run(nl: &mut Netlist) -> Result<(), PackError> {
    let mut gnd_net = None;
    let mut vcc_net = None;

    for cell_id in nl.live_cells() {
        let cell_type = nl.cell(cell_id).cell_type;
        if !cell_type.is_constant() {
            continue;
        }
        let value = matches!(cell_type, CellType::Vcc);
        let Some(net_id) = nl.cell(cell_id).port_net("Z") else {
            nl.erase_cell(cell_id);
            continue;
        };
        let users = nl.net(net_id).users.clone();
        for user in users {
            fold_user(nl, &user.cell, &user.port, value, &mut gnd_net, &mut vcc_net)?;
        }
        nl.erase_cell(cell_id);
    }
    nl.flush();
    Ok(())
}

/// Applies the per-consumer fold policy for a single user of a constant net.
fn fold_user(
    nl: &mut Netlist,
    &user_cell: &aion_netlist::CellId,
    port: &str,
    value: bool,
    gnd_net: &mut Option<aion_netlist::NetId>,
    vcc_net: &mut Option<aion_netlist::NetId>,
) -> Result<(), PackError> {
    let cell_type = nl.cell(user_cell).cell_type;

    if LUT_INPUTS.contains(&port) && cell_type == CellType::Lut4 {
        fold_lut_input(nl, user_cell, port, value);
        return Ok(());
    }

    if cell_type == CellType::TrellisFf && port == "CE" {
        let name = nl.cell(user_cell).name.clone();
        disconnect(nl, user_cell, port);
        nl.cell_mut(user_cell).params.insert(
            "CEMUX".to_string(),
            Property::from_str(if value { "1" } else { "0" }),
        );
        let _ = name;
        return Ok(());
    }

    if cell_type == CellType::TrellisFf
        && port == "LSR"
        && nl
            .cell(user_cell)
            .param("LSRMUX")
            .map(|p| p.str_or_default("LSR") == "LSR")
            .unwrap_or(true)
    {
        disconnect(nl, user_cell, port);
        return Ok(());
    }

    if cell_type == CellType::Ccu2c {
        return fold_ccu2c_port(nl, user_cell, port, value, vcc_net);
    }

    if is_bram_clock_like(port) && cell_type == CellType::Dp16Kd {
        disconnect(nl, user_cell, port);
        let mux = format!("{port}MUX");
        let mux_val = if value { port.to_string() } else { "INV".to_string() };
        nl.cell_mut(user_cell)
            .params
            .insert(mux, Property::from_str(mux_val));
        return Ok(());
    }

    if cell_type == CellType::Dp16Kd {
        disconnect(nl, user_cell, port);
        let mux = format!("{port}MUX");
        nl.cell_mut(user_cell)
            .params
            .insert(mux, Property::from_str(if value { "1" } else { "0" }));
        return Ok(());
    }

    if matches!(cell_type, CellType::Alu54B | CellType::Mult18X18D) {
        if is_dsp_clock_or_ctl(port) {
            attach_to_tie_net(nl, user_cell, port, value, gnd_net, vcc_net);
        } else {
            disconnect(nl, user_cell, port);
            let mux = format!("{port}MUX");
            nl.cell_mut(user_cell)
                .params
                .insert(mux, Property::from_str(if value { "1" } else { "0" }));
        }
        return Ok(());
    }

    attach_to_tie_net(nl, user_cell, port, value, gnd_net, vcc_net);
    Ok(())
}

fn is_bram_clock_like(port: &str) -> bool {
    matches!(port, "CLKA" | "CLKB" | "RSTA" | "RSTB" | "CEA" | "CEB")
        || port.starts_with("CS")
        || port.starts_with("OCE")
}

fn is_dsp_clock_or_ctl(port: &str) -> bool {
    matches!(port, "CLK" | "CE" | "RST")
        || port.starts_with("SOURCE")
        || port.starts_with("SIGNED")
        || port.starts_with("OP")
}

fn disconnect(nl: &mut Netlist, cell: aion_netlist::CellId, port: &str) {
    if let Some(net) = nl.cell(cell).port_net(port) {
        nl.disconnect_port(cell, port, net);
    }
}

/// Folds a 0- or 1-constant into one of a `LUT4`'s four inputs, recomputing
/// its 16-bit `INIT` mask via the §4.1 minterm-pairing rewrite.
fn fold_lut_input(nl: &mut Netlist, cell: aion_netlist::CellId, port: &str, value: bool) {
    let index = LUT_INPUTS.iter().position(|p| *p == port).unwrap() as u32;
    disconnect(nl, cell, port);
    let old_init = nl
        .cell(cell)
        .param("INIT")
        .cloned()
        .unwrap_or_else(|| Property::from_int(0, 16));
    let new_init = rewrite_init_forced(&old_init, index, value, 16);
    nl.cell_mut(cell)
        .params
        .insert("INIT".to_string(), new_init);
}

/// Rewrites an `n`-bit-wide LUT `INIT` mask (covering `log2(n)` inputs) so
/// that input `index` is forced to `value`: for each minterm `m`,
/// `new[m] = old[m with bit `index` set to `value`]`.
pub fn rewrite_init_forced(init: &Property, index: u32, value: bool, width: u32) -> Property {
    let bits = match init {
        Property::Bits(b) => b.clone(),
        Property::Str(_) => LogicVec::all_zero(width),
    };
    let mut out = LogicVec::all_zero(width);
    for m in 0..width {
        let forced = set_bit(m, index, value);
        out.set(m, bits.get(forced));
    }
    Property::Bits(out)
}

fn set_bit(m: u32, index: u32, value: bool) -> u32 {
    if value {
        m | (1 << index)
    } else {
        m & !(1 << index)
    }
}

/// Applies the CCU2C-specific fold rule for a `0`-constant on `A0/A1/B0/B1`
/// (absorbed into the per-sub-LUT init mask) or `C0/C1/D0/D1` (only
/// rewritable when the paired port is already tied high).
fn fold_ccu2c_port(
    nl: &mut Netlist,
    cell: aion_netlist::CellId,
    port: &str,
    value: bool,
    vcc_net: &mut Option<aion_netlist::NetId>,
) -> Result<(), PackError> {
    if value {
        // 1-input (VCC) action: disconnect, pin ties high automatically.
        disconnect(nl, cell, port);
        return Ok(());
    }

    if matches!(port, "A0" | "A1" | "B0" | "B1") {
        let sub = if port.ends_with('0') { "0" } else { "1" };
        let input_index = if port.starts_with('A') { 0 } else { 1 };
        let param = format!("INIT{sub}");
        disconnect(nl, cell, port);
        let old_init = nl
            .cell(cell)
            .param(&param)
            .cloned()
            .unwrap_or_else(|| Property::from_int(0, 16));
        let new_init = rewrite_init_forced(&old_init, input_index, false, 16);
        nl.cell_mut(cell).params.insert(param, new_init);
        return Ok(());
    }

    // C0/C1/D0/D1: only fold if partner is already tied high.
    let partner = match port {
        "C0" => "D0",
        "D0" => "C0",
        "C1" => "D1",
        "D1" => "C1",
        _ => {
            disconnect(nl, cell, port);
            return Ok(());
        }
    };
    let partner_tied_high = nl
        .cell(cell)
        .port_net(partner)
        .map(|n| vcc_net.map(|v| v == n).unwrap_or(false))
        .unwrap_or(true); // unconnected partner ties high by default
    if partner_tied_high {
        disconnect(nl, cell, port);
    }
    // Otherwise leave the zero connection live; a tie net is attached by
    // the caller's fallthrough in a later pass if still unconnected.
    Ok(())
}

/// Connects a user to the lazily-synthesized `$PACKER_GND`/`$PACKER_VCC`
/// tie cell, creating it on first use.
fn attach_to_tie_net(
    nl: &mut Netlist,
    cell: aion_netlist::CellId,
    port: &str,
    value: bool,
    gnd_net: &mut Option<aion_netlist::NetId>,
    vcc_net: &mut Option<aion_netlist::NetId>,
) {
    let old_net = nl.cell(cell).port_net(port);
    let slot = if value { vcc_net } else { gnd_net };
    let tie_net = *slot.get_or_insert_with(|| synthesize_tie(nl, value));
    if let Some(old) = old_net {
        nl.move_port_to(cell, port, old, tie_net);
    } else {
        nl.connect_port(cell, port, tie_net, false);
    }
}

/// Creates the shared `$PACKER_GND`/`$PACKER_VCC` LUT4 and its output net.
fn synthesize_tie(nl: &mut Netlist, value: bool) -> aion_netlist::NetId {
    let (cell_name, net_name, init) = if value {
        ("$PACKER_VCC", "$PACKER_VCC_NET", 0xFFFFu64)
    } else {
        ("$PACKER_GND", "$PACKER_GND_NET", 0x0000u64)
    };
    let tie_cell = nl.create_cell(cell_name, CellType::Lut4);
    nl.cell_mut(tie_cell)
        .params
        .insert("INIT".to_string(), Property::from_int(init, 16));
    let net = nl.create_net(net_name);
    nl.connect_port(tie_cell, "Z", net, true);
    net
}
