//! Misc primitive binding (§2 stage 9): `USRMCLK` port renaming and
//! `GSR`/`SGSR` bel binding.

use crate::error::PackError;
use aion_arch::{BelType, Ecp5Device};
use aion_netlist::{CellType, Netlist};

const USRMCLK_RENAMES: &[(&str, &str)] = &[("USRMCLKI", "PADDO"), ("USRMCLKTS", "PADDT"), ("USRMCLKO", "PADDI")];

/// Renames `USRMCLK` ports to their `TRELLIS_IO`-compatible pad names and
/// binds any `GSR` cell to the device's single `GSR` bel.
pub fn run(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let mclks: Vec<_> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Usrmclk).collect();
    for cell in mclks {
        for (from, to) in USRMCLK_RENAMES {
            if let Some(net) = nl.cell(cell).port_net(from) {
                let is_output = *from == "USRMCLKO";
                nl.disconnect_port(cell, from, net);
                nl.connect_port(cell, to, net, is_output);
            }
        }
        nl.cell_mut(cell).cell_type = CellType::TrellisIo;
        nl.cell_mut(cell).attrs.insert("BEL".to_string(), "USRMCLK".into());
    }

    let gsr_bel = device.bels().into_iter().find(|&b| device.bel_type(b) == BelType::Gsr);
    let gsrs: Vec<_> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Gsr).collect();
    for cell in gsrs {
        let bel = gsr_bel.ok_or_else(|| PackError::HelperPlacementFailed {
            cell: nl.cell(cell).name.clone(),
            cell_type: "GSR".to_string(),
        })?;
        nl.cell_mut(cell).attrs.insert("BEL".to_string(), format!("{bel:?}").into());
        let sync = nl.cell(cell).params.get("SYNCMODE").map(|p| p.str_or_default("ASYNC").to_string()).unwrap_or_else(|| "ASYNC".to_string());
        nl.cell_mut(cell).attrs.insert("MODE".to_string(), sync.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::{BelId, BelPin, DeviceKind, DqsGroup, IoBank, PipId, WireId};

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
            vec![BelId::from_raw(5)]
        }
        fn bel_type(&self, _bel: BelId) -> BelType {
            BelType::Gsr
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
            None
        }
        fn pio_bel_bank(&self, _bel: BelId) -> Option<u32> {
            None
        }
        fn pio_dqs_group(&self, _bel: BelId) -> Option<DqsGroup> {
            None
        }
        fn io_banks(&self) -> &[IoBank] {
            &[]
        }
    }

    #[test]
    fn usrmclk_ports_are_renamed_to_pad_names() {
        let mut nl = Netlist::new();
        let device = StubDevice;
        let cell = nl.create_cell("mclk0", CellType::Usrmclk);
        let net = nl.create_net("mclko");
        nl.connect_port(cell, "USRMCLKO", net, false);

        run(&mut nl, &device).unwrap();

        assert_eq!(nl.cell(cell).port_net("PADDI"), Some(net));
        assert!(nl.cell(cell).port_net("USRMCLKO").is_none());
    }

    #[test]
    fn gsr_binds_to_the_single_gsr_bel() {
        let mut nl = Netlist::new();
        let device = StubDevice;
        let cell = nl.create_cell("gsr0", CellType::Gsr);

        run(&mut nl, &device).unwrap();

        assert_eq!(nl.cell(cell).attrs.get("BEL").unwrap().str_or_default(""), "BelId(5)");
        assert_eq!(nl.cell(cell).attrs.get("MODE").unwrap().str_or_default(""), "ASYNC");
    }
}
