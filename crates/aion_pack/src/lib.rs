//! The ECP5 technology-mapping and packing stage.
//!
//! Transforms a generic, post-synthesis netlist into a device-legal one
//! whose cells correspond one-to-one to physical ECP5 tiles, running the
//! eighteen pipeline stages in the fixed order below. Each stage either
//! mutates `nl` in place or raises a [`PackError`] that aborts the whole
//! pass with no partial rollback.

mod bram;
mod carry;
pub mod config;
mod clockconstr;
mod constprop;
mod dcu;
mod dpram;
mod dqs;
mod dsp;
pub mod error;
mod finalize;
mod io_pack;
mod iologic;
mod lutff;
mod lutpair;
mod misc;
mod muxexpand;
mod packing;
mod pll;
mod prepack;
pub mod slice;
pub mod state;

use aion_arch::Ecp5Device;
use aion_common::{AionResult, InternalError};
use aion_diagnostics::DiagnosticSink;
use aion_netlist::{NetId, Netlist};
use std::collections::HashMap;

pub use config::PackerConfig;
pub use error::PackError;
pub use state::PackerState;

/// Runs the full eighteen-stage packing pass over `nl`.
///
/// `user_constraints` carries any designer-supplied clock period constraints
/// (net -> period in nanoseconds) consumed by stage 17. Returns the outer
/// [`AionResult`] for bugs in the packer itself (an integrity-check failure
/// after the pass completes); the inner `Result` carries ordinary,
/// expected-to-happen fatal packing errors from bad input.
pub fn pack(
    nl: &mut Netlist,
    device: &mut dyn Ecp5Device,
    config: &PackerConfig,
    diagnostics: &DiagnosticSink,
    user_constraints: &HashMap<NetId, f64>,
) -> AionResult<Result<(), PackError>> {
    if let Err(e) = run_stages(nl, device, config, diagnostics, user_constraints) {
        return Ok(Err(e));
    }
    nl.flush();
    finalize::check_integrity(nl).map_err(|e| InternalError::new(format!("post-pack integrity check failed: {e}")))?;
    Ok(Ok(()))
}

fn run_stages(
    nl: &mut Netlist,
    device: &mut dyn Ecp5Device,
    config: &PackerConfig,
    diagnostics: &DiagnosticSink,
    user_constraints: &HashMap<NetId, f64>,
) -> Result<(), PackError> {
    let mut state = PackerState::new();

    prepack::run(nl)?; // 1. Prepack checks
    nl.flush();

    io_pack::run(nl, device)?; // 2. I/O packing
    nl.flush();

    dqs::run(nl, device)?; // 3. DQS-buffer placement
    nl.flush();

    pll::run(nl, device)?; // 4. PLL preplacement
    nl.flush();

    iologic::run(nl, &mut state, device, config)?; // 5. IOLOGIC packing
    nl.flush();

    bram::run(nl); // 6. BRAM normalization
    nl.flush();

    dsp::run(nl)?; // 7. DSP shape checking
    nl.flush();

    dcu::run(nl, device)?; // 8. DCU/EXTREFB/PCSCLKDIV binding
    nl.flush();

    misc::run(nl, device)?; // 9. Misc (USRMCLK/GSR)
    nl.flush();

    constprop::run(nl)?; // 10. Constant packing
    nl.flush();

    dpram::run(nl, &mut state); // 11. Distributed-RAM packing
    nl.flush();

    carry::run(nl, device, &mut state)?; // 12. Carry packing
    nl.flush();

    lutff::run(nl, &mut state); // 13. LUT-FF pairing discovery
    muxexpand::run(nl, &mut state)?; // 14. LUT5/6/7 mux expansion
    nl.flush();

    lutpair::run(nl, &mut state, config); // 15. LUT-LUT pairing
    packing::run(nl, &mut state, device, config); // 16. Pair/remaining-LUT/remaining-FF packing
    nl.flush();

    let derived_periods = clockconstr::run(nl, user_constraints, diagnostics); // 17. Clock-constraint propagation
    apply_periods(nl, &derived_periods);

    finalize::promote_globals(nl, config); // 18. Global-net promotion (integrity check runs in `pack`)

    Ok(())
}

fn apply_periods(nl: &mut Netlist, periods: &HashMap<NetId, f64>) {
    for (&net, &period_ns) in periods {
        nl.net_mut(net).clock = Some(aion_netlist::ClockConstraint {
            period_ps: (period_ns * 1000.0).round() as u64,
            derived: true,
        });
    }
}
