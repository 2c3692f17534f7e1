//! Port direction and declared cell ports.

use serde::{Deserialize, Serialize};

/// The direction of a cell port relative to the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Signal flows into the cell.
    Input,
    /// Signal flows out of the cell.
    Output,
    /// Bidirectional (only `TRELLIS_IO`'s `B` pin uses this).
    InOut,
}

/// A declared port on a cell: a name and a direction.
///
/// Ports are distinct from [`crate::portref::PortRef`]s: a port is part of a
/// cell's static interface (what pins a `CCU2C` has), while a `PortRef` is a
/// specific connection of one net endpoint to one of those pins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// The port name, e.g. `"A0"`, `"CLK"`, `"FCO"`.
    pub name: String,
    /// The port's direction.
    pub direction: PortDirection,
}
