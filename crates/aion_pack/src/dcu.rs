//! DCU / EXTREFB / PCSCLKDIV binding (§2 stage 8): resolves `LOC`
//! attributes naming a SERDES quadrant to a concrete `BEL`, then derives
//! `EXTREFB`/`PCSCLKDIV` placement from the DCU they're paired with.

use crate::error::PackError;
use aion_arch::Ecp5Device;
use aion_netlist::{CellId, CellType, Netlist};

/// Maps a `DCUA`'s `LOC` (`"DCU0"`/`"DCU1"`) plus device name to its fixed
/// site name, mirroring the vendor placement table for each die size.
fn dcu_loc_to_bel(device_name: &str, loc: &str) -> Option<&'static str> {
    match (device_name, loc) {
        ("LFE5UM-25F" | "LFE5UM5G-25F", "DCU0") => Some("X42/Y50/DCU"),
        ("LFE5UM-45F" | "LFE5UM5G-45F", "DCU0") => Some("X42/Y71/DCU"),
        ("LFE5UM-45F" | "LFE5UM5G-45F", "DCU1") => Some("X69/Y71/DCU"),
        ("LFE5UM-85F" | "LFE5UM5G-85F", "DCU0") => Some("X46/Y95/DCU"),
        ("LFE5UM-85F" | "LFE5UM5G-85F", "DCU1") => Some("X71/Y95/DCU"),
        _ => None,
    }
}

/// Binds every `DCUA`, then every `EXTREFB`/`PCSCLKDIV` paired with one.
pub fn run(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let dcus: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Dcua).collect();
    for dcu in dcus {
        let name = nl.cell(dcu).name.clone();
        if let Some(loc) = nl.cell(dcu).attrs.get("LOC").map(|p| p.str_or_default("").to_string()) {
            let bel = dcu_loc_to_bel(device.device_name(), &loc).ok_or_else(|| PackError::UnknownBel {
                cell: name.clone(),
                site: loc.clone(),
            })?;
            nl.cell_mut(dcu).attrs.insert("BEL".to_string(), bel.into());
        }
        if !nl.cell(dcu).attrs.contains_key("BEL") {
            return Err(PackError::UnknownBel {
                cell: name,
                site: "<unconstrained DCU>".to_string(),
            });
        }
    }

    let extrefs: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Extrefb).collect();
    for extref in extrefs {
        let name = nl.cell(extref).name.clone();
        let refo = nl.cell(extref).port_net("REFCLKO").ok_or_else(|| PackError::MissingRequiredPort {
            cell: name.clone(),
            cell_type: "EXTREFB".to_string(),
            port: "REFCLKO".to_string(),
        })?;
        let mut dcu_from_net = None;
        for user in &nl.net(refo).users {
            if nl.cell(user.cell).cell_type == CellType::Dcua {
                if let Some(existing) = dcu_from_net {
                    if existing != user.cell {
                        return Err(PackError::MalformedInput {
                            cell: name.clone(),
                            reason: "REFCLKO must only drive a single DCUA".to_string(),
                        });
                    }
                }
                dcu_from_net = Some(user.cell);
            }
        }

        let loc_bel = nl.cell(extref).attrs.get("LOC").map(|p| p.str_or_default("").to_string());
        let dcu_bel = dcu_from_net.and_then(|dcu| nl.cell(dcu).attrs.get("BEL").map(|p| p.str_or_default("").to_string())).map(|b| b.replace("DCU", "EXTREF"));

        match (loc_bel, dcu_bel) {
            (None, None) => {
                return Err(PackError::UnknownBel {
                    cell: name,
                    site: "<no LOC or associated DCUA>".to_string(),
                });
            }
            (Some(loc), None) => {
                nl.cell_mut(extref).attrs.insert("BEL".to_string(), loc.into());
            }
            (None, Some(derived)) => {
                nl.cell_mut(extref).attrs.insert("BEL".to_string(), derived.into());
            }
            (Some(loc), Some(derived)) if loc == derived => {
                nl.cell_mut(extref).attrs.insert("BEL".to_string(), derived.into());
            }
            (Some(loc), Some(derived)) => {
                return Err(PackError::UnknownBel {
                    cell: name,
                    site: format!("conflicting LOC '{loc}' and associated DCUA bel '{derived}'"),
                });
            }
        }
    }

    let clkdivs: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Pcsclkdiv).collect();
    for clkdiv in clkdivs {
        let Some(clki) = nl.cell(clkdiv).port_net("CLKI") else { continue };
        let Some(driver) = nl.net(clki).driver.clone() else { continue };
        if nl.cell(driver.cell).cell_type != CellType::Dcua {
            continue;
        }
        let bel_name = nl.cell(driver.cell).attrs.get("BEL").ok_or_else(|| PackError::UnknownBel {
            cell: nl.cell(clkdiv).name.clone(),
            site: "<DCU without a fixed BEL>".to_string(),
        })?;
        let bel = device.bel_by_name(bel_name.str_or_default("")).ok_or_else(|| PackError::UnknownBel {
            cell: nl.cell(clkdiv).name.clone(),
            site: bel_name.str_or_default("").to_string(),
        })?;
        let (x, _, _) = device.bel_location(bel);
        nl.cell_mut(clkdiv).attrs.insert("CONSTR_ABS_Z".to_string(), "1".into());
        nl.cell_mut(clkdiv).attrs.insert("CONSTR_Z".to_string(), (if x >= 69 { "1" } else { "0" }).into());
    }
    Ok(())
}
