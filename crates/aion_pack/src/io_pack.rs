//! I/O packing (§2 stage 2): absorb abstract `$nextpnr_ibuf`/`$nextpnr_obuf`/
//! `$nextpnr_iobuf` cells into a `TRELLIS_IO` cell and resolve its `LOC`
//! attribute to a bound `BEL`.

use crate::error::PackError;
use aion_arch::Ecp5Device;
use aion_netlist::{CellId, CellType, Netlist};

/// Absorbs every abstract IO-buffer cell into a `TRELLIS_IO` cell.
///
/// The netlist model exposes a single external pad port (`B`) on
/// `TRELLIS_IO`, the common case exercised elsewhere in this crate; a true
/// tri-state buffer's separate input/output data paths are folded onto
/// that same pad net rather than modeled as distinct internal ports.
pub fn run(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let bufs: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| matches!(nl.cell(id).cell_type, CellType::NextpnrIbuf | CellType::NextpnrObuf | CellType::NextpnrIobuf))
        .collect();

    for buf in bufs {
        let cell_type = nl.cell(buf).cell_type;
        let pad_port = if cell_type == CellType::NextpnrObuf { "I" } else { "O" };
        let Some(net) = nl.cell(buf).port_net(pad_port) else {
            return Err(PackError::MalformedInput {
                cell: nl.cell(buf).name.clone(),
                reason: format!("port {pad_port} must be connected"),
            });
        };

        let trio = nl.create_cell(format!("{}$tr_io", nl.cell(buf).name.clone()), CellType::TrellisIo);
        let attrs: Vec<(String, aion_netlist::Property)> = nl.cell(buf).attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (k, v) in attrs {
            nl.cell_mut(trio).attrs.insert(k, v);
        }

        let drives_pad = cell_type != CellType::NextpnrObuf;
        nl.disconnect_port(buf, pad_port, net);
        nl.connect_port(trio, "B", net, drives_pad);
        nl.erase_cell(buf);

        if let Some(loc) = nl.cell(trio).attrs.get("LOC").cloned() {
            let pin = loc.str_or_default("").to_string();
            let bel = device.package_pin_bel(&pin).ok_or_else(|| PackError::UnknownBel {
                cell: nl.cell(trio).name.clone(),
                site: pin.clone(),
            })?;
            nl.cell_mut(trio).attrs.insert("BEL".to_string(), format!("{bel:?}").into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::{BelId, BelPin, BelType, DeviceKind, IoBank, PipId, WireId};

    #[derive(Debug, Default)]
    struct StubDevice;
    impl Ecp5Device for StubDevice {
        fn device_name(&self) -> &str {
            "TEST"
        }
        fn device_kind(&self) -> DeviceKind {
            DeviceKind::Lfe5u
        }
        fn grid_size(&self) -> (u32, u32) {
            (10, 10)
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
        fn package_pin_bel(&self, pin: &str) -> Option<BelId> {
            if pin == "A4" {
                Some(BelId::from_raw(7))
            } else {
                None
            }
        }
        fn pio_bel_bank(&self, _bel: BelId) -> Option<u32> {
            None
        }
        fn pio_dqs_group(&self, _bel: BelId) -> Option<aion_arch::DqsGroup> {
            None
        }
        fn io_banks(&self) -> &[IoBank] {
            &[]
        }
    }

    #[test]
    fn ibuf_absorbs_into_trellis_io_and_resolves_bel() {
        let mut nl = Netlist::new();
        let device = StubDevice;
        let ibuf = nl.create_cell("in0", CellType::NextpnrIbuf);
        nl.cell_mut(ibuf).attrs.insert("LOC".to_string(), "A4".into());
        let pad = nl.create_net("pad");
        nl.connect_port(ibuf, "O", pad, true);

        run(&mut nl, &device).unwrap();
        nl.flush();

        assert!(nl.cell_by_name("in0").is_none());
        let trio = nl.cell_by_name("in0$tr_io").expect("trellis io created");
        assert_eq!(nl.cell(trio).port_net("B"), Some(pad));
        assert!(nl.cell(trio).attrs.contains_key("BEL"));
    }

    #[test]
    fn unconstrained_pin_is_fatal() {
        let mut nl = Netlist::new();
        let device = StubDevice;
        let ibuf = nl.create_cell("in1", CellType::NextpnrIbuf);
        nl.cell_mut(ibuf).attrs.insert("LOC".to_string(), "Z99".into());
        let pad = nl.create_net("pad1");
        nl.connect_port(ibuf, "O", pad, true);

        let err = run(&mut nl, &device).unwrap_err();
        assert!(matches!(err, PackError::UnknownBel { .. }));
    }
}
