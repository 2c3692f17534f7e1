//! DSP shape checking (§2 stage 7): bind each `MULT18X18D` feeding an
//! `ALU54B`'s `MA`/`MB` bus to that `ALU54B`'s cluster and verify the
//! wiring shape the hardened macro requires.

use crate::error::PackError;
use crate::slice::link_cluster;
use aion_netlist::{CellId, CellType, Netlist};

/// Clusters and checks every live `ALU54B`/`MULT18X18D` pairing.
pub fn run(nl: &mut Netlist) -> Result<(), PackError> {
    let alus: Vec<CellId> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Alu54B).collect();

    for alu in alus {
        let mult_a = driving_mult(nl, alu, "MA0");
        let mult_b = driving_mult(nl, alu, "MB0");
        check_alu(nl, alu, mult_a, mult_b)?;
        let (mult_a, mult_b) = (mult_a.unwrap(), mult_b.unwrap());
        link_cluster(nl, alu, mult_a, -3, 0, -3, true);
        link_cluster(nl, alu, mult_b, -2, 0, -2, true);
    }
    Ok(())
}

fn driving_mult(nl: &Netlist, alu: CellId, port: &str) -> Option<CellId> {
    let net = nl.cell(alu).port_net(port)?;
    let driver = nl.net(net).driver.as_ref()?;
    if driver.port == "P0" && nl.cell(driver.cell).cell_type == CellType::Mult18X18D {
        Some(driver.cell)
    } else {
        None
    }
}

fn check_alu(nl: &Netlist, alu: CellId, mult_a: Option<CellId>, mult_b: Option<CellId>) -> Result<(), PackError> {
    let alu_name = nl.cell(alu).name.clone();
    let Some(mult_a) = mult_a else {
        return Err(PackError::AluWiringViolation {
            alu: alu_name,
            mult: String::new(),
            reason: "no MULT18X18D found connected to port A".to_string(),
        });
    };
    let Some(mult_b) = mult_b else {
        return Err(PackError::AluWiringViolation {
            alu: alu_name,
            mult: String::new(),
            reason: "no MULT18X18D found connected to port B".to_string(),
        });
    };

    let alu_has_bel = nl.cell(alu).attrs.contains_key("BEL");
    for mult in [mult_a, mult_b] {
        let mult_has_bel = nl.cell(mult).attrs.contains_key("BEL");
        if alu_has_bel != mult_has_bel {
            return Err(PackError::AluWiringViolation {
                alu: alu_name.clone(),
                mult: nl.cell(mult).name.clone(),
                reason: "ALU54B and its MULT18X18Ds must either both or neither carry a fixed BEL".to_string(),
            });
        }
        let reg_output_clk = nl.cell(mult).param("REG_OUTPUT_CLK").map(|p| p.str_or_default("NONE").to_string()).unwrap_or_else(|| "NONE".to_string());
        let bypass = nl.cell(mult).param("MULT_BYPASS").map(|p| p.str_or_default("DISABLED").to_string()).unwrap_or_else(|| "DISABLED".to_string());
        if reg_output_clk != "NONE" && bypass != "ENABLED" {
            return Err(PackError::AluWiringViolation {
                alu: alu_name.clone(),
                mult: nl.cell(mult).name.clone(),
                reason: "REG_OUTPUT_CLK must be NONE when driving an ALU without MULT_BYPASS".to_string(),
            });
        }
    }

    check_signed(nl, alu, "SIGNEDIA", mult_a, &alu_name)?;
    check_signed(nl, alu, "SIGNEDIB", mult_b, &alu_name)?;

    for i in 0..36u32 {
        let ro_port = if i < 18 { format!("ROA{i}") } else { format!("ROB{}", i - 18) };
        check_driven_by(nl, alu, &format!("A{i}"), mult_a, &ro_port, &alu_name)?;
        check_driven_by(nl, alu, &format!("B{i}"), mult_b, &ro_port, &alu_name)?;
        check_driven_by(nl, alu, &format!("MA{i}"), mult_a, &format!("P{i}"), &alu_name)?;
        check_driven_by(nl, alu, &format!("MB{i}"), mult_b, &format!("P{i}"), &alu_name)?;
    }
    Ok(())
}

fn check_signed(nl: &Netlist, alu: CellId, port: &str, mult: CellId, alu_name: &str) -> Result<(), PackError> {
    let Some(net) = nl.cell(alu).port_net(port) else {
        return Err(PackError::AluWiringViolation {
            alu: alu_name.to_string(),
            mult: nl.cell(mult).name.clone(),
            reason: format!("{port} must be driven by SIGNEDP of {}", nl.cell(mult).name),
        });
    };
    let ok = nl.net(net).driver.as_ref().is_some_and(|d| d.cell == mult && d.port == "SIGNEDP");
    if !ok {
        return Err(PackError::AluWiringViolation {
            alu: alu_name.to_string(),
            mult: nl.cell(mult).name.clone(),
            reason: format!("{port} must be driven by SIGNEDP of {}", nl.cell(mult).name),
        });
    }
    Ok(())
}

fn check_driven_by(nl: &Netlist, alu: CellId, alu_port: &str, mult: CellId, mult_port: &str, alu_name: &str) -> Result<(), PackError> {
    let Some(net) = nl.cell(alu).port_net(alu_port) else {
        return Err(PackError::AluWiringViolation {
            alu: alu_name.to_string(),
            mult: nl.cell(mult).name.clone(),
            reason: format!("{alu_port} must be driven by {mult_port} of {}", nl.cell(mult).name),
        });
    };
    let ok = nl.net(net).driver.as_ref().is_some_and(|d| d.cell == mult && d.port == mult_port);
    if !ok {
        return Err(PackError::AluWiringViolation {
            alu: alu_name.to_string(),
            mult: nl.cell(mult).name.clone(),
            reason: format!("{alu_port} must be driven by {mult_port} of {}", nl.cell(mult).name),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mult_on_port_a_is_fatal() {
        let mut nl = Netlist::new();
        let alu = nl.create_cell("alu0", CellType::Alu54B);
        let err = run(&mut nl).unwrap_err();
        assert!(matches!(err, PackError::AluWiringViolation { .. }));
        let _ = alu;
    }
}
