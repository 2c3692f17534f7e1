//! DQS-buffer placement (§2 stage 3): bind each `DQSBUFM` cell to the bel
//! adjacent to its driving PIO and tag its special output nets as global.

use crate::error::PackError;
use aion_arch::{BelType, Ecp5Device};
use aion_netlist::{CellType, Netlist, Property};

const GLOBAL_PORTS: [&str; 9] = [
    "DQSR90", "RDPNTR0", "RDPNTR1", "RDPNTR2", "WRPNTR0", "WRPNTR1", "WRPNTR2", "DQSW270", "DQSW",
];

/// Binds every live `DQSBUFM` cell and marks its special ports global.
pub fn run(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let bufs: Vec<_> = nl.live_cells().into_iter().filter(|&id| nl.cell(id).cell_type == CellType::Dqsbufm).collect();

    for buf in bufs {
        let name = nl.cell(buf).name.clone();
        let net = nl.cell(buf).port_net("DQSI").ok_or_else(|| PackError::MissingRequiredPort {
            cell: name.clone(),
            cell_type: "DQSBUFM".to_string(),
            port: "DQSI".to_string(),
        })?;
        let driver = nl.net(net).driver.clone().ok_or_else(|| PackError::MalformedInput {
            cell: name.clone(),
            reason: "DQSI input must be connected only to a top-level input".to_string(),
        })?;
        if nl.cell(driver.cell).cell_type != CellType::TrellisIo || nl.net(net).users.len() > 1 {
            return Err(PackError::MalformedInput {
                cell: name.clone(),
                reason: "DQSI input must be connected only to a top-level input".to_string(),
            });
        }
        let pio = driver.cell;
        let bel_name = nl
            .cell(pio)
            .attrs
            .get("BEL")
            .ok_or_else(|| PackError::UnknownBel {
                cell: name.clone(),
                site: "<unconstrained PIO>".to_string(),
            })?
            .str_or_default("")
            .to_string();
        let pio_bel = device.bel_by_name(&bel_name).ok_or_else(|| PackError::UnknownBel {
            cell: name.clone(),
            site: bel_name.clone(),
        })?;
        let (x, y, z) = device.bel_location(pio_bel);
        if z != 0 {
            return Err(PackError::UnknownBel {
                cell: name.clone(),
                site: format!("{bel_name} (expected a DQS 'A' pin)"),
            });
        }
        let dqsbuf_bel = device.bel_by_location(x, y, 8).ok_or_else(|| PackError::UnknownBel {
            cell: name.clone(),
            site: format!("X{x}/Y{y}/DQSBUFM"),
        })?;
        if device.bel_type(dqsbuf_bel) != BelType::Dqsbufm {
            return Err(PackError::UnknownBel {
                cell: name.clone(),
                site: format!("X{x}/Y{y}/DQSBUFM"),
            });
        }
        nl.cell_mut(buf).attrs.insert("BEL".to_string(), format!("{dqsbuf_bel:?}").into());

        let group = device.pio_dqs_group(pio_bel).ok_or_else(|| PackError::UnknownBel {
            cell: name.clone(),
            site: bel_name.clone(),
        })?;
        nl.cell_mut(buf).attrs.insert("DQS_GROUP_RIGHT".to_string(), Property::from_int(group.is_right as u64, 1));
        nl.cell_mut(buf).attrs.insert("DQS_GROUP_INDEX".to_string(), Property::from_int(group.group_index as u64, 8));

        for port in GLOBAL_PORTS {
            if let Some(pn) = nl.cell(buf).port_net(port) {
                nl.net_mut(pn).attrs.insert("ECP5_IS_GLOBAL".to_string(), Property::from_int(1, 1));
            }
        }
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
            Vec::new()
        }
        fn bel_type(&self, bel: BelId) -> BelType {
            if bel.as_raw() == 8 {
                BelType::Dqsbufm
            } else {
                BelType::Pio
            }
        }
        fn bel_location(&self, bel: BelId) -> (u32, u32, u32) {
            if bel.as_raw() == 1 {
                (3, 4, 0)
            } else {
                (0, 0, 0)
            }
        }
        fn bel_by_name(&self, name: &str) -> Option<BelId> {
            if name == "pio_bel" {
                Some(BelId::from_raw(1))
            } else {
                None
            }
        }
        fn bel_by_location(&self, x: u32, y: u32, z: u32) -> Option<BelId> {
            if (x, y, z) == (3, 4, 8) {
                Some(BelId::from_raw(8))
            } else {
                None
            }
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
            Some(2)
        }
        fn pio_dqs_group(&self, _bel: BelId) -> Option<DqsGroup> {
            Some(DqsGroup { is_right: true, group_index: 1 })
        }
        fn io_banks(&self) -> &[IoBank] {
            &[]
        }
    }

    #[test]
    fn dqsbufm_binds_to_adjacent_site_and_tags_group() {
        let mut nl = Netlist::new();
        let device = StubDevice;
        let pio = nl.create_cell("pio0", CellType::TrellisIo);
        nl.cell_mut(pio).attrs.insert("BEL".to_string(), "pio_bel".into());
        let dqsi_net = nl.create_net("dqsi");
        nl.connect_port(pio, "B", dqsi_net, true);
        let buf = nl.create_cell("dqs0", CellType::Dqsbufm);
        nl.connect_port(buf, "DQSI", dqsi_net, false);
        let dqsw_net = nl.create_net("dqsw");
        nl.connect_port(buf, "DQSW", dqsw_net, true);

        run(&mut nl, &device).unwrap();

        assert!(nl.cell(buf).attrs.contains_key("BEL"));
        assert_eq!(nl.cell(buf).attrs.get("DQS_GROUP_INDEX").unwrap().int_or_default(0), 1);
        assert_eq!(nl.net(dqsw_net).attrs.get("ECP5_IS_GLOBAL").unwrap().int_or_default(0), 1);
    }
}
