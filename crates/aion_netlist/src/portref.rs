//! A single cell-port connection endpoint on a net.

use crate::ids::CellId;
use serde::{Deserialize, Serialize};

/// One endpoint of a net: a specific port on a specific cell.
///
/// For bussed ports (rare in this post-tech-map netlist — e.g. a `DP16KD`'s
/// `DO` bus before bit-blasting) `bus_index` disambiguates which bit of the
/// port this connection is; `None` for scalar ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// The cell owning this port.
    pub cell: CellId,
    /// The port name on that cell.
    pub port: String,
    /// Bit index within a bussed port, if any.
    pub bus_index: Option<u32>,
}

impl PortRef {
    /// Creates a scalar port reference.
    pub fn new(cell: CellId, port: impl Into<String>) -> Self {
        Self {
            cell,
            port: port.into(),
            bus_index: None,
        }
    }

    /// Creates a port reference into one bit of a bussed port.
    pub fn bussed(cell: CellId, port: impl Into<String>, bus_index: u32) -> Self {
        Self {
            cell,
            port: port.into(),
            bus_index: Some(bus_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_no_bus_index() {
        let pr = PortRef::new(CellId::from_raw(0), "CLK");
        assert_eq!(pr.bus_index, None);
    }

    #[test]
    fn bussed_carries_index() {
        let pr = PortRef::bussed(CellId::from_raw(0), "DO", 3);
        assert_eq!(pr.bus_index, Some(3));
    }

    #[test]
    fn equality_ignores_nothing() {
        let a = PortRef::new(CellId::from_raw(1), "A0");
        let b = PortRef::new(CellId::from_raw(1), "A0");
        let c = PortRef::new(CellId::from_raw(1), "B0");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
