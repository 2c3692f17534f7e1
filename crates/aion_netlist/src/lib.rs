//! The mutable post-tech-map netlist the ECP5 packer transforms.
//!
//! Cells instantiate a closed set of ECP5 hard primitives ([`CellType`]);
//! nets connect one driver port to any number of sink ports ([`PortRef`]).
//! The [`Netlist`] container supports staged creation/removal of cells
//! within a pipeline stage via `new_cells_this_stage`/`erase_cell`/`flush`,
//! so that a stage can see exactly what it has added without disturbing
//! the stable iteration order earlier stages relied on.
//!
//! # Usage
//!
//! ```
//! use aion_netlist::{CellType, Netlist};
//!
//! let mut nl = Netlist::new();
//! let lut = nl.create_cell("lut_0", CellType::Lut4);
//! let net = nl.create_net("q");
//! nl.connect_port(lut, "Z", net, true);
//! assert_eq!(nl.live_cell_count(), 1);
//! ```

#![warn(missing_docs)]

pub mod cell;
pub mod ids;
pub mod net;
pub mod netlist;
pub mod port;
pub mod portref;
pub mod property;

pub use cell::{Cell, CellType, ClusterInfo};
pub use ids::{CellId, NetId};
pub use net::{ClockConstraint, Net};
pub use netlist::Netlist;
pub use port::{Port, PortDirection};
pub use portref::PortRef;
pub use property::Property;
