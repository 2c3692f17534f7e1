//! Prepack checks (§2 stage 1): reject malformed input before any stage
//! relies on a parameter's shape.

use crate::error::PackError;
use aion_netlist::{CellId, CellType, Netlist, Property};

/// Runs every structural check against the as-loaded netlist.
pub fn run(nl: &Netlist) -> Result<(), PackError> {
    for cell in nl.live_cells() {
        match nl.cell(cell).cell_type {
            CellType::Lut4 => check_init_width(nl, cell, "INIT", 16)?,
            CellType::Ccu2c => {
                check_init_width(nl, cell, "INIT0", 16)?;
                check_init_width(nl, cell, "INIT1", 16)?;
            }
            CellType::Dpram16 => check_init_width(nl, cell, "INITIAL", 64)?,
            _ => {}
        }
    }
    Ok(())
}

/// A present `Bits` parameter must carry exactly `expected` bits; a legacy
/// net list with the wrong width is rejected rather than silently
/// truncated or zero-extended.
fn check_init_width(nl: &Netlist, cell: CellId, name: &str, expected: u32) -> Result<(), PackError> {
    if let Some(Property::Bits(bits)) = nl.cell(cell).param(name) {
        if bits.width() != expected {
            return Err(PackError::MalformedInput {
                cell: nl.cell(cell).name.clone(),
                reason: format!("parameter {name} must be {expected} bits wide, got {}", bits.width()),
            });
        }
    }
    Ok(())
}
