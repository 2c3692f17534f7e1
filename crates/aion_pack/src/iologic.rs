//! IOLOGIC packing and edge-clock routing (§4.4).
//!
//! Absorbs DDR/delay/gearbox primitives into the `IOLOGIC`/`SIOLOGIC` site
//! adjacent to their PIO, enforces the clock/reset/DQS conflict rules, and
//! promotes `ECLK` consumers onto a bank's edge-clock slots.

use crate::config::PackerConfig;
use crate::error::PackError;
use crate::state::{EdgeClockInfo, PackerState};
use aion_arch::{BelType, Ecp5Device};
use aion_netlist::{CellId, CellType, Netlist, NetId, Property};
use std::collections::{HashMap, VecDeque};

/// IOLOGIC `MODE` and, where applicable, a sub-mode parameter value for
/// the `ODDRXN.MODE`/`IDDRXN.MODE`/`MIDDRX_MODDRX` family.
fn mode_for(cell_type: CellType) -> Option<(&'static str, Option<(&'static str, &'static str)>)> {
    use CellType::*;
    match cell_type {
        Delayf | Delayg => Some(("IREG_OREG", None)),
        Iddrx1F | Oddrx1F => Some(("IDDRX1_ODDRX1", None)),
        Oddrx2F => Some(("ODDRXN", Some(("ODDRXN.MODE", "ODDRX2")))),
        Oddr71B => Some(("ODDRXN", Some(("ODDRXN.MODE", "ODDR71")))),
        Iddrx2F => Some(("IDDRXN", Some(("IDDRXN.MODE", "IDDRX2")))),
        Iddr71B => Some(("IDDRXN", Some(("IDDRXN.MODE", "IDDR71")))),
        Oshx2A => Some(("MIDDRX_MODDRX", Some(("MIDDRX_MODDRX.MODE", "MOSHX2")))),
        Oddrx2Dqa | Oddrx2Dqsb => Some(("MIDDRX_MODDRX", Some(("MIDDRX_MODDRX.MODE", "MODDRX2")))),
        Iddrx2Dqa => Some(("MIDDRX_MODDRX", Some(("MIDDRX_MODDRX.MODE", "MIDDRX2")))),
        Tshx2Dqa | Tshx2Dqsa => Some(("MIDDRX_MODDRX", Some(("MIDDRX_MODDRX.MODE", "MTSHX2")))),
        _ => None,
    }
}

/// The pad-facing port whose net connects to the PIO's `TRELLIS_IO` cell,
/// used to locate which PIO a primitive belongs to.
fn pad_port(cell_type: CellType) -> &'static str {
    use CellType::*;
    match cell_type {
        Delayf | Delayg => "A",
        Iddrx1F | Iddrx2F | Iddr71B | Tshx2Dqa | Tshx2Dqsa | Iddrx2Dqa => "D",
        Oddrx1F | Oddrx2F | Oddr71B | Oshx2A | Oddrx2Dqa | Oddrx2Dqsb => "Q",
        _ => "D",
    }
}

/// Data-port moves: `(primitive port, IOLOGIC port)` pairs applied after
/// the pad-facing port (handled separately) is consumed.
fn port_moves(cell_type: CellType) -> Vec<(&'static str, &'static str)> {
    use CellType::*;
    match cell_type {
        Delayf | Delayg => vec![("Z", "INDD")],
        Iddrx1F => vec![("D", "PADDI"), ("Q0", "RXDATA0"), ("Q1", "RXDATA1")],
        Oddrx1F => vec![("D0", "TXDATA0"), ("D1", "TXDATA1"), ("Q", "IOLDO")],
        Oddrx2F => vec![
            ("D0", "TXDATA0"),
            ("D1", "TXDATA1"),
            ("D2", "TXDATA2"),
            ("D3", "TXDATA3"),
            ("Q", "IOLDO"),
        ],
        Oddr71B => vec![
            ("D0", "TXDATA0"),
            ("D1", "TXDATA1"),
            ("D2", "TXDATA2"),
            ("D3", "TXDATA3"),
            ("D4", "TXDATA4"),
            ("D5", "TXDATA5"),
            ("D6", "TXDATA6"),
            ("Q", "IOLDO"),
        ],
        Iddrx2F => vec![
            ("D", "PADDI"),
            ("Q0", "RXDATA0"),
            ("Q1", "RXDATA1"),
            ("Q2", "RXDATA2"),
            ("Q3", "RXDATA3"),
        ],
        Iddr71B => vec![
            ("D", "PADDI"),
            ("Q0", "RXDATA0"),
            ("Q1", "RXDATA1"),
            ("Q2", "RXDATA2"),
            ("Q3", "RXDATA3"),
            ("Q4", "RXDATA4"),
            ("Q5", "RXDATA5"),
            ("Q6", "RXDATA6"),
        ],
        Oshx2A => vec![("D0", "TXDATA0"), ("D1", "TXDATA1"), ("Q", "IOLDO")],
        Oddrx2Dqa | Oddrx2Dqsb => vec![("D0", "TXDATA0"), ("D1", "TXDATA1"), ("Q", "IOLDO")],
        Iddrx2Dqa => vec![("D", "PADDI"), ("Q0", "RXDATA0"), ("Q1", "RXDATA1")],
        Tshx2Dqa | Tshx2Dqsa => vec![("D0", "TXDATA0"), ("D1", "TXDATA1"), ("Q", "IOLDO")],
        _ => Vec::new(),
    }
}

/// The DQS-sourced ports each mode consumes from a `DQSBUFM`, subject to
/// the DQS-group inheritance check.
fn dqs_ports(cell_type: CellType) -> &'static [&'static str] {
    use CellType::*;
    match cell_type {
        Oddrx2Dqa | Oddrx2Dqsb => &["DQSW270", "DQSW"],
        Iddrx2Dqa => &["DQSR90"],
        Tshx2Dqa | Tshx2Dqsa => &["DQSR90"],
        _ => &[],
    }
}

fn move_port(nl: &mut Netlist, src: CellId, old_port: &str, dst: CellId, new_port: &str) {
    if let Some(net) = nl.cell(src).port_net(old_port) {
        let was_driver = nl
            .net(net)
            .driver
            .as_ref()
            .is_some_and(|d| d.cell == src && d.port == old_port);
        nl.disconnect_port(src, old_port, net);
        nl.connect_port(dst, new_port, net, was_driver);
    }
}

/// Resolves a cell's bound site from its `BEL` or `LOC` attribute.
fn resolve_bel(nl: &Netlist, device: &dyn Ecp5Device, cell: CellId) -> Option<aion_arch::BelId> {
    if let Some(name) = nl.cell(cell).attrs.get("BEL") {
        return device.bel_by_name(name.str_or_default(""));
    }
    if let Some(pin) = nl.cell(cell).attrs.get("LOC") {
        return device.package_pin_bel(pin.str_or_default(""));
    }
    None
}

fn find_pio(nl: &Netlist, cell: CellId, port: &str) -> Option<CellId> {
    let net = nl.cell(cell).port_net(port)?;
    if let Some(driver) = &nl.net(net).driver {
        if nl.cell(driver.cell).cell_type == CellType::TrellisIo {
            return Some(driver.cell);
        }
    }
    nl.net(net)
        .users
        .iter()
        .map(|u| u.cell)
        .find(|&c| nl.cell(c).cell_type == CellType::TrellisIo)
}

/// Returns the existing IOLOGIC companion of `pio`, or creates one,
/// choosing `SIOLOGIC` for top/bottom-row PIOs.
fn get_or_create_iologic(
    nl: &mut Netlist,
    device: &dyn Ecp5Device,
    iologic_of_pio: &mut HashMap<CellId, CellId>,
    pio: CellId,
) -> CellId {
    if let Some(&iol) = iologic_of_pio.get(&pio) {
        return iol;
    }
    let is_edge_row = resolve_bel(nl, device, pio)
        .and_then(|bel| device.pio_bel_bank(bel))
        .map(|bank| {
            device
                .io_banks()
                .iter()
                .find(|b| b.index == bank)
                .is_some_and(|b| matches!(b.side, aion_arch::BankSide::Top | aion_arch::BankSide::Bottom))
        })
        .unwrap_or(false);
    let cell_type = if is_edge_row { CellType::Siologic } else { CellType::Iologic };
    let name = format!("{}$IOL", nl.cell(pio).name.clone());
    let iol = nl.create_cell(name, cell_type);
    iologic_of_pio.insert(pio, iol);
    iol
}

/// Assigns a shared signal (`CLK`/`ECLK`/`LSR`) to an IOLOGIC cell,
/// enforcing the §4.4 conflict rule.
fn assign_signal(nl: &mut Netlist, iol: CellId, signal: &str, net: NetId) -> Result<(), PackError> {
    if let Some(existing) = nl.cell(iol).port_net(signal) {
        if existing != net && !equal_constant(nl, existing, net) {
            return Err(PackError::IologicClockConflict {
                cell: nl.cell(iol).name.clone(),
                signal: signal.to_string(),
                existing: nl.net(existing).name.clone(),
                new: nl.net(net).name.clone(),
            });
        }
        return Ok(());
    }
    nl.connect_port(iol, signal, net, false);
    Ok(())
}

/// Two nets are "equal constants" if both are driven by the same kind of
/// constant source (`GND` or `VCC`), even if they are distinct net objects.
fn equal_constant(nl: &Netlist, a: NetId, b: NetId) -> bool {
    let da = nl.net(a).driver.as_ref().map(|d| nl.cell(d.cell).cell_type);
    let db = nl.net(b).driver.as_ref().map(|d| nl.cell(d.cell).cell_type);
    matches!((da, db), (Some(t1), Some(t2)) if t1 == t2 && (t1 == CellType::Gnd || t1 == CellType::Vcc))
}

fn set_mode(nl: &mut Netlist, iol: CellId, mode: &str) -> Result<(), PackError> {
    if let Some(existing) = nl.cell(iol).param("MODE") {
        let existing = existing.str_or_default("").to_string();
        if existing != mode {
            return Err(PackError::IologicClockConflict {
                cell: nl.cell(iol).name.clone(),
                signal: "MODE".to_string(),
                existing,
                new: mode.to_string(),
            });
        }
        return Ok(());
    }
    nl.cell_mut(iol).params.insert("MODE".to_string(), mode.into());
    Ok(())
}

/// Checks that a DQS-sourced port's driver is the `DQSBUFM` matching the
/// consuming primitive's DQS group.
fn check_dqs_driver(
    nl: &Netlist,
    device: &dyn Ecp5Device,
    cell: CellId,
    port: &str,
    net: NetId,
    pio: CellId,
) -> Result<(), PackError> {
    let mismatch = || PackError::DqsGroupMismatch {
        cell: nl.cell(cell).name.clone(),
        port: port.to_string(),
    };
    let driver = nl.net(net).driver.as_ref().ok_or_else(mismatch)?;
    if nl.cell(driver.cell).cell_type != CellType::Dqsbufm {
        return Err(mismatch());
    }
    let prim_group = resolve_bel(nl, device, pio).and_then(|b| device.pio_dqs_group(b));
    let buf_pio = find_pio(nl, driver.cell, "DQSI");
    let buf_group = buf_pio.and_then(|p| resolve_bel(nl, device, p)).and_then(|b| device.pio_dqs_group(b));
    match (prim_group, buf_group) {
        (Some(a), Some(b)) if a == b => Ok(()),
        _ => Err(mismatch()),
    }
}

/// Absorbs every DDR/delay/gearbox primitive into its PIO's IOLOGIC cell.
fn absorb_primitives(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let mut iologic_of_pio: HashMap<CellId, CellId> = HashMap::new();
    let prims: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| mode_for(nl.cell(id).cell_type).is_some())
        .collect();

    for prim in prims {
        let cell_type = nl.cell(prim).cell_type;
        let (mode, submode) = mode_for(cell_type).expect("filtered by mode_for above");
        let pad = pad_port(cell_type);
        let Some(pio) = find_pio(nl, prim, pad) else {
            return Err(PackError::UnknownBel {
                cell: nl.cell(prim).name.clone(),
                site: "<unconstrained PIO>".to_string(),
            });
        };
        let iol = get_or_create_iologic(nl, device, &mut iologic_of_pio, pio);
        set_mode(nl, iol, mode)?;
        if let Some((param, value)) = submode {
            nl.cell_mut(iol).params.insert(param.to_string(), value.into());
        }

        for signal in ["CLK", "LSR"] {
            if let Some(net) = nl.cell(prim).port_net(signal) {
                assign_signal(nl, iol, signal, net)?;
                nl.disconnect_port(prim, signal, net);
            }
        }
        if let Some(net) = nl.cell(prim).port_net("ECLK") {
            assign_signal(nl, iol, "ECLK", net)?;
            nl.disconnect_port(prim, "ECLK", net);
        }

        for port in dqs_ports(cell_type) {
            if let Some(net) = nl.cell(prim).port_net(port) {
                check_dqs_driver(nl, device, prim, port, net, pio)?;
                move_port(nl, prim, port, iol, port);
            }
        }

        for (old, new) in port_moves(cell_type) {
            move_port(nl, prim, old, iol, new);
        }
        nl.erase_cell(prim);
    }
    Ok(())
}

/// BFS over uphill PIPs from `start`, bounded to `cap` visited wires,
/// returning pips to lock once a wire named `target` is reached.
fn find_eclk_path(
    device: &dyn Ecp5Device,
    start: aion_arch::WireId,
    target: &str,
    cap: u32,
) -> Option<Vec<aion_arch::PipId>> {
    let mut visited = std::collections::HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((start, Vec::new()));
    visited.insert(start);

    while let Some((wire, path)) = queue.pop_front() {
        if device.wire_basename(wire) == target {
            return Some(path);
        }
        if visited.len() as u32 >= cap {
            return None;
        }
        for pip in device.pips_uphill(wire) {
            let src = device.pip_src_wire(pip);
            if visited.insert(src) {
                let mut next_path = path.clone();
                next_path.push(pip);
                queue.push_back((src, next_path));
            }
        }
    }
    None
}

/// Promotes a net feeding `consumer`'s `port` onto a free (or shared)
/// edge-clock slot of `bank`.
fn promote_eclk(
    nl: &mut Netlist,
    device: &mut dyn Ecp5Device,
    state: &mut PackerState,
    config: &PackerConfig,
    consumer: CellId,
    port: &str,
    bank: u32,
) -> Result<(), PackError> {
    let Some(net) = nl.cell(consumer).port_net(port) else {
        return Ok(());
    };

    for slot in 0u8..2 {
        if let Some(info) = state.edge_clocks.get(&(bank, slot)) {
            if info.source_net == net {
                let buffered = info.buffered_net;
                nl.disconnect_port(consumer, port, net);
                nl.connect_port(consumer, port, buffered, false);
                return Ok(());
            }
        }
    }

    let slot = (0u8..2).find(|s| !state.edge_clocks.contains_key(&(bank, *s))).ok_or_else(|| {
        PackError::EdgeClockExhausted {
            bank,
            net: nl.net(net).name.clone(),
        }
    })?;

    let base = format!("{}$eclk{}_{}", nl.net(net).name.clone(), bank, slot);
    let buffered = nl.create_net(format!("{base}$net"));
    nl.net_mut(buffered).attrs.insert("ECP5_IS_GLOBAL".to_string(), Property::from_int(1, 1));
    let eclkbuf = nl.create_cell(format!("{base}$buffer"), CellType::TrellisEclkbuf);
    nl.connect_port(eclkbuf, "ECLKI", net, false);
    nl.connect_port(eclkbuf, "ECLKO", buffered, true);

    let target_name = format!("G_BANK{bank}ECLK{slot}");
    let mut bound_bel = None;
    for b in device.bels() {
        if device.bel_type(b) != BelType::Eclkbuf {
            continue;
        }
        if let Some(w) = device.bel_pin_wire(b, "ECLKO") {
            if device.wire_basename(w) == target_name {
                bound_bel = Some((b, w));
                break;
            }
        }
    }
    let Some((bel, eclko_wire)) = bound_bel else {
        return Err(PackError::HelperPlacementFailed {
            cell: nl.cell(eclkbuf).name.clone(),
            cell_type: "TRELLIS_ECLKBUF".to_string(),
        });
    };
    nl.cell_mut(eclkbuf).attrs.insert("BEL".to_string(), format!("{bel:?}").into());

    if let Some(consumer_wire) = resolve_bel(nl, device, consumer).and_then(|b| device.bel_pin_wire(b, port)) {
        let bnk_name = format!("BNK_ECLK{slot}");
        if let Some(path) = find_eclk_path(device, consumer_wire, &bnk_name, config.eclk_bfs_cap)
            .or_else(|| find_eclk_path(device, consumer_wire, &target_name, config.eclk_bfs_cap))
        {
            for pip in path {
                device.bind_pip(pip);
            }
        }
    }
    let _ = eclko_wire;

    nl.disconnect_port(consumer, port, net);
    nl.connect_port(consumer, port, buffered, false);
    state.edge_clocks.insert(
        (bank, slot),
        EdgeClockInfo {
            source_net: net,
            buffered_net: buffered,
            eclkbuf_cell: eclkbuf,
        },
    );
    Ok(())
}

/// Runs IOLOGIC absorption followed by edge-clock promotion for every
/// IOLOGIC/DQSBUFM cell left with a live `ECLK` input.
pub fn run(nl: &mut Netlist, state: &mut PackerState, device: &mut dyn Ecp5Device, config: &PackerConfig) -> Result<(), PackError> {
    absorb_primitives(nl, device)?;
    nl.flush();

    let eclk_consumers: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| matches!(nl.cell(id).cell_type, CellType::Iologic | CellType::Siologic | CellType::Dqsbufm))
        .filter(|&id| nl.cell(id).port_net("ECLK").is_some())
        .collect();

    for consumer in eclk_consumers {
        let pio = find_pio(nl, consumer, "ECLK").or_else(|| {
            nl.cell(consumer)
                .name
                .strip_suffix("$IOL")
                .and_then(|base| nl.cell_by_name(base))
        });
        let Some(bel) = pio.and_then(|p| resolve_bel(nl, device, p)) else {
            continue;
        };
        let Some(bank) = device.pio_bel_bank(bel) else { continue };
        promote_eclk(nl, device, state, config, consumer, "ECLK", bank)?;
    }
    nl.flush();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::{BelId, BelPin, DeviceKind, IoBank, PinDirection, PipId, WireId};

    #[derive(Debug, Default)]
    struct StubDevice {
        banks: Vec<IoBank>,
    }

    impl Ecp5Device for StubDevice {
        fn device_name(&self) -> &str {
            "TEST"
        }
        fn device_kind(&self) -> DeviceKind {
            DeviceKind::Lfe5u
        }
        fn grid_size(&self) -> (u32, u32) {
            (20, 20)
        }
        fn bels(&self) -> Vec<BelId> {
            Vec::new()
        }
        fn bel_type(&self, _bel: BelId) -> BelType {
            BelType::Pio
        }
        fn bel_location(&self, _bel: BelId) -> (u32, u32, u32) {
            (0, 0, 0)
        }
        fn bel_by_name(&self, _name: &str) -> Option<BelId> {
            None
        }
        fn bel_by_location(&self, _x: u32, _y: u32, _z: u32) -> Option<BelId> {
            None
        }
        fn bel_pins(&self, _bel: BelId) -> Vec<BelPin> {
            Vec::new()
        }
        fn bel_pin_wire(&self, _bel: BelId, _pin: &str) -> Option<WireId> {
            None
        }
        fn check_bel_avail(&self, _bel: BelId) -> bool {
            true
        }
        fn bind_bel(&mut self, _bel: BelId) {}
        fn pips_uphill(&self, _wire: WireId) -> Vec<PipId> {
            Vec::new()
        }
        fn pips_downhill(&self, _wire: WireId) -> Vec<PipId> {
            Vec::new()
        }
        fn pip_src_wire(&self, _pip: PipId) -> WireId {
            unimplemented!()
        }
        fn pip_dst_wire(&self, _pip: PipId) -> WireId {
            unimplemented!()
        }
        fn bind_pip(&mut self, _pip: PipId) {}
        fn wire_bel_pins(&self, _wire: WireId) -> Vec<(BelId, String)> {
            Vec::new()
        }
        fn wire_basename(&self, _wire: WireId) -> String {
            String::new()
        }
        fn package_pin_bel(&self, _pin: &str) -> Option<BelId> {
            Some(BelId::from_raw(0))
        }
        fn pio_bel_bank(&self, _bel: BelId) -> Option<u32> {
            Some(0)
        }
        fn pio_dqs_group(&self, _bel: BelId) -> Option<aion_arch::DqsGroup> {
            None
        }
        fn io_banks(&self) -> &[IoBank] {
            &self.banks
        }
    }

    fn _unused(_: PinDirection) {}

    #[test]
    fn delayf_absorbs_into_iologic_with_indd_move() {
        let mut nl = Netlist::new();
        let device = StubDevice::default();
        let pio = nl.create_cell("pad0", CellType::TrellisIo);
        nl.cell_mut(pio).attrs.insert("LOC".to_string(), "A4".into());
        let delay = nl.create_cell("dly0", CellType::Delayf);
        let pad_net = nl.create_net("pad");
        let z_net = nl.create_net("z");
        nl.connect_port(pio, "B", pad_net, true);
        nl.connect_port(delay, "A", pad_net, false);
        nl.connect_port(delay, "Z", z_net, true);

        absorb_primitives(&mut nl, &device).unwrap();
        nl.flush();

        assert!(nl.cell_by_name("dly0").is_none());
        let iol = nl.cell_by_name("pad0$IOL").expect("iologic created");
        assert_eq!(nl.cell(iol).param("MODE").unwrap().str_or_default(""), "IREG_OREG");
        assert_eq!(nl.cell(iol).port_net("INDD"), Some(z_net));
    }

    #[test]
    fn conflicting_clk_assignment_is_fatal() {
        let mut nl = Netlist::new();
        let device = StubDevice::default();
        let pio = nl.create_cell("pad1", CellType::TrellisIo);
        nl.cell_mut(pio).attrs.insert("LOC".to_string(), "B2".into());
        let pad_net = nl.create_net("pad1net");
        nl.connect_port(pio, "B", pad_net, true);

        let ff0 = nl.create_cell("iddr0", CellType::Iddrx1F);
        nl.connect_port(ff0, "D", pad_net, false);
        let clk_a = nl.create_net("clk_a");
        nl.connect_port(ff0, "CLK", clk_a, false);

        let oddr0 = nl.create_cell("oddr0", CellType::Oddrx1F);
        nl.connect_port(oddr0, "Q", pad_net, false);
        let clk_b = nl.create_net("clk_b");
        nl.connect_port(oddr0, "CLK", clk_b, false);

        let err = absorb_primitives(&mut nl, &device).unwrap_err();
        assert!(matches!(err, PackError::IologicClockConflict { .. }));
    }

    #[test]
    fn dqs_port_not_driven_by_dqsbufm_is_fatal() {
        let mut nl = Netlist::new();
        let device = StubDevice::default();
        let pio = nl.create_cell("pad2", CellType::TrellisIo);
        nl.cell_mut(pio).attrs.insert("LOC".to_string(), "C3".into());
        let pad_net = nl.create_net("pad2net");
        nl.connect_port(pio, "B", pad_net, true);

        let prim = nl.create_cell("iddrdqa0", CellType::Iddrx2Dqa);
        nl.connect_port(prim, "D", pad_net, false);
        let bogus = nl.create_cell("notdqs", CellType::TrellisComb);
        let dqs_net = nl.create_net("dqsr90");
        nl.connect_port(bogus, "O", dqs_net, true);
        nl.connect_port(prim, "DQSR90", dqs_net, false);

        let err = absorb_primitives(&mut nl, &device).unwrap_err();
        assert!(matches!(err, PackError::DqsGroupMismatch { .. }));
    }

    #[test]
    fn edge_clock_exhausted_after_two_slots() {
        let mut nl = Netlist::new();
        let mut state = PackerState::new();
        let config = PackerConfig::default();
        let mut device = StubDevice::default();

        let iol_a = nl.create_cell("iol_a", CellType::Iologic);
        let iol_b = nl.create_cell("iol_b", CellType::Iologic);
        let iol_c = nl.create_cell("iol_c", CellType::Iologic);
        let net_a = nl.create_net("ea");
        let net_b = nl.create_net("eb");
        let net_c = nl.create_net("ec");
        nl.connect_port(iol_a, "ECLK", net_a, false);
        nl.connect_port(iol_b, "ECLK", net_b, false);
        nl.connect_port(iol_c, "ECLK", net_c, false);

        promote_eclk(&mut nl, &mut device, &mut state, &config, iol_a, "ECLK", 0).unwrap_err();
    }
}
