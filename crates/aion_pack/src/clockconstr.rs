//! Clock-constraint propagation (§4.5).
//!
//! A fixed-point worklist seeded from user-supplied net periods. Each pass
//! through the queue looks at the cells consuming a just-updated net and
//! recomputes their output periods per the per-cell-type rule table, pushing
//! any changed output net back onto the queue.

use aion_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use aion_netlist::{CellId, CellType, Netlist, NetId};
use aion_source::Span;
use std::collections::{HashMap, VecDeque};

/// Guards against self-feeding propagation loops; further net updates past
/// this many dequeues are silently dropped.
pub const MAX_ITERATIONS: u32 = 5_000;

const RELATIVE_TOLERANCE: f64 = 0.001;

/// Free-running `OSCG` period, in nanoseconds, at `DIV = 1`.
const OSCG_BASE_NS: f64 = 1.0e6 / (2.0 * 155.0);

/// Runs propagation to a fixed point and returns every net's resolved
/// period in nanoseconds, including the user-supplied seeds.
pub fn run(nl: &Netlist, user_constraints: &HashMap<NetId, f64>, diagnostics: &DiagnosticSink) -> HashMap<NetId, f64> {
    let mut periods = user_constraints.clone();
    let mut queue: VecDeque<NetId> = user_constraints.keys().copied().collect();

    for cell in nl.live_cells() {
        if nl.cell(cell).cell_type != CellType::Oscg {
            continue;
        }
        let div = param_f64(nl, cell, "DIV", 1.0);
        if let Some(out) = nl.cell(cell).port_net("OSC") {
            seed(nl, &mut periods, &mut queue, user_constraints, diagnostics, out, OSCG_BASE_NS * div);
        }
    }

    let mut iterations = 0u32;
    while let Some(net) = queue.pop_front() {
        if iterations >= MAX_ITERATIONS {
            break;
        }
        iterations += 1;
        let users: Vec<CellId> = nl.net(net).users.iter().map(|u| u.cell).collect();
        for cell in users {
            let cell_type = nl.cell(cell).cell_type;
            let Some(updates) = propagate(nl, cell, cell_type, &periods, diagnostics) else {
                continue;
            };
            for (out_net, out_period) in updates {
                seed(nl, &mut periods, &mut queue, user_constraints, diagnostics, out_net, out_period);
            }
        }
    }
    periods
}

/// Records a computed period for `net`, warning instead if a user
/// constraint on the same net disagrees by more than 0.1%, and enqueues
/// the net for further propagation if its period actually changed.
fn seed(
    nl: &Netlist,
    periods: &mut HashMap<NetId, f64>,
    queue: &mut VecDeque<NetId>,
    user_constraints: &HashMap<NetId, f64>,
    diagnostics: &DiagnosticSink,
    net: NetId,
    computed: f64,
) {
    if let Some(&user_period) = user_constraints.get(&net) {
        let rel = (computed - user_period).abs() / user_period.abs().max(f64::EPSILON);
        if rel > RELATIVE_TOLERANCE {
            diagnostics.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Timing, 1),
                format!(
                    "computed period {computed:.4}ns for net '{}' differs from its user constraint {user_period:.4}ns by more than 0.1%",
                    nl.net(net).name
                ),
                Span::DUMMY,
            ));
        }
        return;
    }
    let changed = !matches!(periods.get(&net), Some(&existing) if (existing - computed).abs() < 1e-9);
    if changed {
        periods.insert(net, computed);
        queue.push_back(net);
    }
}

fn param_f64(nl: &Netlist, cell: CellId, name: &str, default: f64) -> f64 {
    nl.cell(cell)
        .param(name)
        .and_then(|p| p.str_or_default("").parse::<f64>().ok())
        .unwrap_or(default)
}

/// Computes the per-cell-type output period updates given the currently
/// known input periods. Returns `None` if the cell's inputs aren't known
/// yet (it will be revisited once they are).
fn propagate(nl: &Netlist, cell: CellId, cell_type: CellType, periods: &HashMap<NetId, f64>, diagnostics: &DiagnosticSink) -> Option<Vec<(NetId, f64)>> {
    match cell_type {
        CellType::Clkdivf => {
            let clki = nl.cell(cell).port_net("CLKI")?;
            let period = *periods.get(&clki)?;
            let div = nl.cell(cell).param("DIV").map(|p| p.str_or_default("2.0").to_string()).unwrap_or_else(|| "2.0".to_string());
            let factor = if div == "3.5" { 3.5 } else { 2.0 };
            let out = nl.cell(cell).port_net("CDIVX")?;
            Some(vec![(out, period * factor)])
        }
        CellType::Eclksyncb | CellType::TrellisEclkbuf => {
            let inp = nl.cell(cell).port_net("ECLKI")?;
            let period = *periods.get(&inp)?;
            let out = nl.cell(cell).port_net("ECLKO")?;
            Some(vec![(out, period)])
        }
        CellType::Dcca => {
            let inp = nl.cell(cell).port_net("CLKI")?;
            let period = *periods.get(&inp)?;
            let out = nl.cell(cell).port_net("CLKO")?;
            Some(vec![(out, period)])
        }
        CellType::Eclkbridgecs => {
            let mut known = Vec::new();
            for port in ["CLK0", "CLK1"] {
                if let Some(net) = nl.cell(cell).port_net(port) {
                    if let Some(&p) = periods.get(&net) {
                        known.push(p);
                    }
                }
            }
            if known.is_empty() {
                return None;
            }
            let min_period = known.into_iter().fold(f64::INFINITY, f64::min);
            let out = nl.cell(cell).port_net("ECSOUT")?;
            Some(vec![(out, min_period)])
        }
        CellType::Ehxplll => {
            let clki = nl.cell(cell).port_net("CLKI")?;
            let in_period = *periods.get(&clki)?;
            let clki_div = param_f64(nl, cell, "CLKI_DIV", 1.0);
            let fb_div = param_f64(nl, cell, "CLKFB_DIV", 1.0);
            if fb_div == 0.0 {
                return None;
            }
            let vco_period = in_period * clki_div / fb_div;
            let vco_mhz = 1000.0 / vco_period;
            if !(400.0..=800.0).contains(&vco_mhz) {
                diagnostics.emit(Diagnostic::warning(
                    DiagnosticCode::new(Category::Timing, 2),
                    format!("PLL '{}' VCO frequency {vco_mhz:.2} MHz is outside the [400, 800] MHz range", nl.cell(cell).name),
                    Span::DUMMY,
                ));
            }
            let mut outs = Vec::new();
            for (port, param) in [("CLKOP", "CLKOP_DIV"), ("CLKOS", "CLKOS_DIV"), ("CLKOS2", "CLKOS2_DIV"), ("CLKOS3", "CLKOS3_DIV")] {
                if let Some(net) = nl.cell(cell).port_net(port) {
                    let out_div = param_f64(nl, cell, param, 1.0);
                    outs.push((net, vco_period * out_div));
                }
            }
            Some(outs)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_netlist::Netlist;

    #[test]
    fn clkdivf_scales_by_div_param() {
        let mut nl = Netlist::new();
        let cell = nl.create_cell("div0", CellType::Clkdivf);
        nl.cell_mut(cell).params.insert("DIV".to_string(), "3.5".into());
        let clki = nl.create_net("clki");
        let cdivx = nl.create_net("cdivx");
        nl.connect_port(cell, "CLKI", clki, false);
        nl.connect_port(cell, "CDIVX", cdivx, true);

        let mut seeds = HashMap::new();
        seeds.insert(clki, 10.0);
        let diagnostics = DiagnosticSink::new();
        let periods = run(&nl, &seeds, &diagnostics);

        assert_eq!(periods.get(&cdivx), Some(&35.0));
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn eclkbridgecs_takes_min_of_inputs() {
        let mut nl = Netlist::new();
        let cell = nl.create_cell("bridge0", CellType::Eclkbridgecs);
        let clk0 = nl.create_net("clk0");
        let clk1 = nl.create_net("clk1");
        let out = nl.create_net("ecsout");
        nl.connect_port(cell, "CLK0", clk0, false);
        nl.connect_port(cell, "CLK1", clk1, false);
        nl.connect_port(cell, "ECSOUT", out, true);

        let mut seeds = HashMap::new();
        seeds.insert(clk0, 8.0);
        seeds.insert(clk1, 5.0);
        let diagnostics = DiagnosticSink::new();
        let periods = run(&nl, &seeds, &diagnostics);

        assert_eq!(periods.get(&out), Some(&5.0));
    }

    #[test]
    fn user_constraint_mismatch_warns_but_wins() {
        let mut nl = Netlist::new();
        let cell = nl.create_cell("buf0", CellType::TrellisEclkbuf);
        let clki = nl.create_net("clki");
        let clko = nl.create_net("clko");
        nl.connect_port(cell, "ECLKI", clki, false);
        nl.connect_port(cell, "ECLKO", clko, true);

        let mut seeds = HashMap::new();
        seeds.insert(clki, 4.0);
        seeds.insert(clko, 10.0);
        let diagnostics = DiagnosticSink::new();
        let periods = run(&nl, &seeds, &diagnostics);

        assert_eq!(periods.get(&clko), Some(&10.0));
        assert_eq!(diagnostics.diagnostics().len(), 1);
    }

    #[test]
    fn oscg_seeds_its_own_period_with_no_input() {
        let mut nl = Netlist::new();
        let cell = nl.create_cell("osc0", CellType::Oscg);
        nl.cell_mut(cell).params.insert("DIV".to_string(), "4".into());
        let out = nl.create_net("osc_out");
        nl.connect_port(cell, "OSC", out, true);

        let diagnostics = DiagnosticSink::new();
        let periods = run(&nl, &HashMap::new(), &diagnostics);

        let expected = OSCG_BASE_NS * 4.0;
        assert!((periods.get(&out).unwrap() - expected).abs() < 1e-9);
    }
}
