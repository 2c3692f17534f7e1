//! BRAM normalization (§2 stage 6): rewrite `PDPW16KD` (36-bit
//! pseudo-dual-port) cells into `DP16KD` (18-bit true-dual-port) form, then
//! auto-create tie-off ports on every `DP16KD` so unused address/data/control
//! lines route to a stable constant rather than being left dangling.

use aion_netlist::{CellId, CellType, Netlist, Property};

const PORT_WIDTHS: &[(&str, u32)] = &[("ADA", 14), ("ADB", 14), ("DIA", 18), ("DIB", 18), ("CSA", 3), ("CSB", 3)];
const SCALAR_PORTS: &[&str] = &["CLKA", "CEA", "OCEA", "WEA", "RSTA", "CLKB", "CEB", "OCEB", "WEB", "RSTB"];

/// Rewrites every `PDPW16KD` into a `DP16KD`, then ensures every expected
/// `DP16KD` port exists, wiring any left disconnected to a shared ground net.
pub fn run(nl: &mut Netlist) {
    let pdps: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Pdpw16Kd).collect();
    for cell in pdps {
        convert_pdp_to_dp(nl, cell);
    }

    let brams: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Dp16Kd).collect();
    if brams.is_empty() {
        return;
    }

    let mut gnd_net = None;
    for (i, &bram) in brams.iter().enumerate() {
        for (prefix, width) in PORT_WIDTHS {
            for bit in 0..*width {
                let port = format!("{prefix}{bit}");
                if nl.cell(bram).port_net(&port).is_none() {
                    let net = gnd_net.get_or_insert_with(|| tie_low(nl));
                    nl.connect_port(bram, &port, *net, false);
                }
            }
        }
        for port in SCALAR_PORTS {
            if nl.cell(bram).port_net(port).is_none() {
                let net = gnd_net.get_or_insert_with(|| tie_low(nl));
                nl.connect_port(bram, port, *net, false);
            }
        }
        nl.cell_mut(bram).attrs.insert("WID".to_string(), ((i + 3) as u64).to_string().into());
    }
}

/// Converts a 36-bit `PDPW16KD` into the 18-bit `DP16KD` shape the bel
/// actually implements: busses, ports and params are renamed onto their
/// DP-mode equivalents and `RST` is fanned out to both new clock domains.
fn convert_pdp_to_dp(nl: &mut Netlist, cell: CellId) {
    nl.cell_mut(cell).params.insert("DATA_WIDTH_A".to_string(), Property::from_int(36, 8));
    nl.cell_mut(cell).params.remove("DATA_WIDTH_W");

    rename_bus(nl, cell, "BE", "ADA", 4, 0, 0);
    rename_bus(nl, cell, "ADW", "ADA", 9, 0, 5);
    rename_bus(nl, cell, "ADR", "ADB", 14, 0, 0);
    rename_bus(nl, cell, "CSW", "CSA", 3, 0, 0);
    rename_bus(nl, cell, "CSR", "CSB", 3, 0, 0);
    rename_bus(nl, cell, "DI", "DIA", 18, 0, 0);
    rename_bus(nl, cell, "DI", "DIB", 18, 18, 0);
    rename_bus(nl, cell, "DO", "DOA", 18, 18, 0);
    rename_bus(nl, cell, "DO", "DOB", 18, 0, 0);
    rename_port(nl, cell, "CLKW", "CLKA");
    rename_port(nl, cell, "CLKR", "CLKB");
    rename_port(nl, cell, "CEW", "CEA");
    rename_port(nl, cell, "CER", "CEB");
    rename_port(nl, cell, "OCER", "OCEB");

    rename_param(nl, cell, "CLKWMUX", "CLKAMUX");
    if nl.cell(cell).param("CLKAMUX").map(|p| p.str_or_default("")) == Some("CLKW") {
        nl.cell_mut(cell).params.insert("CLKAMUX".to_string(), "CLKA".into());
    }
    if nl.cell(cell).param("CLKBMUX").map(|p| p.str_or_default("")) == Some("CLKR") {
        nl.cell_mut(cell).params.insert("CLKBMUX".to_string(), "CLKB".into());
    }
    rename_param(nl, cell, "CSDECODE_W", "CSDECODE_A");
    rename_param(nl, cell, "CSDECODE_R", "CSDECODE_B");
    rename_param(nl, cell, "DATA_WIDTH_R", "DATA_WIDTH_B");

    let regmode = nl.cell(cell).param("REGMODE").map(|p| p.str_or_default("NOREG").to_string()).unwrap_or_else(|| "NOREG".to_string());
    nl.cell_mut(cell).params.insert("REGMODE_A".to_string(), regmode.clone().into());
    nl.cell_mut(cell).params.insert("REGMODE_B".to_string(), regmode.into());
    nl.cell_mut(cell).params.remove("REGMODE");

    if let Some(rst) = nl.cell(cell).port_net("RST") {
        nl.disconnect_port(cell, "RST", rst);
        nl.connect_port(cell, "RSTA", rst, false);
        nl.connect_port(cell, "RSTB", rst, false);
    }

    nl.cell_mut(cell).cell_type = CellType::Dp16Kd;
}

/// Moves a single port's connection from `old` to `new`, preserving
/// whether it was acting as driver or user.
fn rename_port(nl: &mut Netlist, cell: CellId, old: &str, new: &str) {
    let Some(net) = nl.cell(cell).port_net(old) else { return };
    let was_driver = nl.net(net).driver.as_ref().is_some_and(|d| d.cell == cell && d.port == old);
    nl.disconnect_port(cell, old, net);
    nl.connect_port(cell, new, net, was_driver);
}

/// Renames a contiguous port bus, e.g. `BE0..BE3` -> `ADA0..ADA3`.
fn rename_bus(nl: &mut Netlist, cell: CellId, old_prefix: &str, new_prefix: &str, width: u32, old_offset: u32, new_offset: u32) {
    for i in 0..width {
        rename_port(nl, cell, &format!("{old_prefix}{}", i + old_offset), &format!("{new_prefix}{}", i + new_offset));
    }
}

/// Moves a param's value from `old` to `new`, a no-op if `old` is absent.
fn rename_param(nl: &mut Netlist, cell: CellId, old: &str, new: &str) {
    if let Some(value) = nl.cell_mut(cell).params.remove(old) {
        nl.cell_mut(cell).params.insert(new.to_string(), value);
    }
}

fn tie_low(nl: &mut Netlist) -> aion_netlist::NetId {
    let gnd = nl.create_cell("$PACKER_GND_BRAM", CellType::Gnd);
    let net = nl.create_net("$PACKER_GND_BRAM_NET");
    nl.connect_port(gnd, "Z", net, true);
    net
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_ports_are_tied_to_ground() {
        let mut nl = Netlist::new();
        let bram = nl.create_cell("ram0", CellType::Dp16Kd);
        run(&mut nl);

        assert!(nl.cell(bram).port_net("ADA0").is_some());
        assert!(nl.cell(bram).port_net("CLKA").is_some());
        assert_eq!(nl.cell(bram).attrs.get("WID").unwrap().str_or_default(""), "3");
    }

    #[test]
    fn pdp_cell_is_rewritten_to_dp_shape() {
        let mut nl = Netlist::new();
        let pdp = nl.create_cell("ram0", CellType::Pdpw16Kd);
        nl.cell_mut(pdp).params.insert("REGMODE".to_string(), "OUTREG".into());
        nl.cell_mut(pdp).params.insert("DATA_WIDTH_R".to_string(), "18".into());
        let be0 = nl.create_net("be0");
        nl.connect_port(pdp, "BE0", be0, false);
        let clkw = nl.create_net("clkw");
        nl.connect_port(pdp, "CLKW", clkw, false);
        let rst = nl.create_net("rst");
        nl.connect_port(pdp, "RST", rst, false);

        run(&mut nl);

        assert_eq!(nl.cell(pdp).cell_type, CellType::Dp16Kd);
        assert_eq!(nl.cell(pdp).port_net("ADA0"), Some(be0));
        assert_eq!(nl.cell(pdp).port_net("CLKA"), Some(clkw));
        assert!(nl.cell(pdp).port_net("BE0").is_none());
        assert_eq!(nl.cell(pdp).port_net("RSTA"), Some(rst));
        assert_eq!(nl.cell(pdp).port_net("RSTB"), Some(rst));
        assert_eq!(nl.cell(pdp).param("REGMODE_A").unwrap().str_or_default(""), "OUTREG");
        assert_eq!(nl.cell(pdp).param("REGMODE_B").unwrap().str_or_default(""), "OUTREG");
        assert_eq!(nl.cell(pdp).param("DATA_WIDTH_B").unwrap().str_or_default(""), "18");
        assert!(nl.cell(pdp).param("REGMODE").is_none());
    }

    #[test]
    fn existing_connection_is_preserved() {
        let mut nl = Netlist::new();
        let bram = nl.create_cell("ram0", CellType::Dp16Kd);
        let clk = nl.create_net("clka");
        nl.connect_port(bram, "CLKA", clk, false);
        run(&mut nl);

        assert_eq!(nl.cell(bram).port_net("CLKA"), Some(clk));
    }
}
