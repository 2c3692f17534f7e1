//! PLL preplacement (§2 stage 4): assign `EHXPLLL` bels, preferring
//! proximity to a fixed-bel clock source.

use crate::error::PackError;
use aion_arch::{BelId, BelType, Ecp5Device};
use aion_netlist::{CellId, CellType, Netlist};

/// Assigns a `BEL` to every unconstrained `EHXPLLL` cell.
pub fn run(nl: &mut Netlist, device: &dyn Ecp5Device) -> Result<(), PackError> {
    let mut available: Vec<BelId> = device.bels().into_iter().filter(|&b| device.bel_type(b) == BelType::Pll && device.check_bel_avail(b)).collect();

    for cell in nl.live_cells() {
        if nl.cell(cell).cell_type != CellType::Ehxplll {
            continue;
        }
        if let Some(attr) = nl.cell(cell).attrs.get("BEL") {
            if let Some(bel) = device.bel_by_name(attr.str_or_default("")) {
                available.retain(|&b| b != bel);
            }
        }
    }

    let plls: Vec<CellId> = nl
        .live_cells()
        .into_iter()
        .filter(|&id| nl.cell(id).cell_type == CellType::Ehxplll && !nl.cell(id).attrs.contains_key("BEL"))
        .collect();

    let mut with_source = Vec::new();
    let mut without_source = Vec::new();
    for pll in plls {
        let driver_bel = nl
            .cell(pll)
            .port_net("CLKI")
            .and_then(|net| nl.net(net).driver.clone())
            .and_then(|d| nl.cell(d.cell).attrs.get("BEL").map(|p| p.str_or_default("").to_string()));
        match driver_bel {
            Some(name) => with_source.push((pll, name)),
            None => without_source.push(pll),
        }
    }

    for (pll, src_bel_name) in with_source {
        let src_bel = device.bel_by_name(&src_bel_name).ok_or_else(|| PackError::UnknownBel {
            cell: nl.cell(pll).name.clone(),
            site: src_bel_name.clone(),
        })?;
        let (sx, sy, _) = device.bel_location(src_bel);
        let chosen = available.iter().copied().min_by_key(|&b| {
            let (x, y, _) = device.bel_location(b);
            (x as i64 - sx as i64).unsigned_abs() + (y as i64 - sy as i64).unsigned_abs()
        });
        let Some(chosen) = chosen else {
            return Err(PackError::HelperPlacementFailed {
                cell: nl.cell(pll).name.clone(),
                cell_type: "EHXPLLL".to_string(),
            });
        };
        available.retain(|&b| b != chosen);
        nl.cell_mut(pll).attrs.insert("BEL".to_string(), format!("{chosen:?}").into());
    }

    for pll in without_source {
        let Some(chosen) = available.first().copied() else {
            return Err(PackError::HelperPlacementFailed {
                cell: nl.cell(pll).name.clone(),
                cell_type: "EHXPLLL".to_string(),
            });
        };
        available.retain(|&b| b != chosen);
        nl.cell_mut(pll).attrs.insert("BEL".to_string(), format!("{chosen:?}").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::{BelPin, DeviceKind, DqsGroup, IoBank, PipId, WireId};

    #[derive(Debug, Default)]
    struct StubDevice {
        plls: Vec<BelId>,
    }
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
            self.plls.clone()
        }
        fn bel_type(&self, _bel: BelId) -> BelType {
            BelType::Pll
        }
        fn bel_location(&self, bel: BelId) -> (u32, u32, u32) {
            (bel.as_raw(), 0, 0)
        }
        fn bel_by_name(&self, name: &str) -> Option<BelId> {
            if let Some(rest) = name.strip_prefix("pll") {
                rest.parse().ok().map(BelId::from_raw)
            } else if name == "src" {
                Some(BelId::from_raw(100))
            } else {
                None
            }
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
    fn pll_with_fixed_source_picks_the_closest_bel() {
        let mut nl = Netlist::new();
        let device = StubDevice {
            plls: vec![BelId::from_raw(10), BelId::from_raw(99)],
        };
        let src = nl.create_cell("io_driver", CellType::TrellisIo);
        nl.cell_mut(src).attrs.insert("BEL".to_string(), "src".into());
        let pll = nl.create_cell("pll0", CellType::Ehxplll);
        let clki = nl.create_net("clki");
        nl.connect_port(src, "B", clki, true);
        nl.connect_port(pll, "CLKI", clki, false);

        run(&mut nl, &device).unwrap();

        assert_eq!(nl.cell(pll).attrs.get("BEL").unwrap().str_or_default(""), "BelId(99)");
    }

    #[test]
    fn pll_without_available_bel_is_fatal() {
        let mut nl = Netlist::new();
        let device = StubDevice { plls: Vec::new() };
        nl.create_cell("pll0", CellType::Ehxplll);

        let err = run(&mut nl, &device).unwrap_err();
        assert!(matches!(err, PackError::HelperPlacementFailed { .. }));
    }
}
