//! The mutable packed netlist container.
//!
//! Cells and nets are stored in append-only `Vec`s indexed by
//! [`CellId`]/[`NetId`]; nothing is ever physically removed mid-pass.
//! Instead, newly-created cells are staged in `new_cells` and cells that a
//! stage has replaced are staged in `packed_cells` (dead); [`Netlist::flush`]
//! folds both staging sets into the live view once a stage completes. This
//! mirrors `aion_synth::Netlist`'s `remove_cell`/`is_dead` bookkeeping,
//! generalized with an explicit staging queue for cells created mid-stage
//! (a post-tech-map packer, unlike a single-stage synthesis lowering, runs
//! many stages in sequence and needs a clear "this stage's new cells" scope).

use crate::cell::{Cell, CellType};
use crate::ids::{CellId, NetId};
use crate::net::Net;
use crate::portref::PortRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The mutable netlist a packer pass transforms in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netlist {
    /// All cells ever allocated (including dead ones).
    cells: Vec<Cell>,
    /// All nets ever allocated.
    nets: Vec<Net>,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    cell_by_name: HashMap<String, CellId>,
    /// Auxiliary index: net name to ID (rebuilt on deserialization).
    #[serde(skip)]
    net_by_name: HashMap<String, NetId>,
    /// Cells created during the current stage, not yet part of the stable
    /// "live" iteration order used by earlier stages.
    #[serde(skip)]
    new_cells: Vec<CellId>,
    /// Cells superseded during the current stage; excluded from live
    /// iteration and dropped entirely on `flush`.
    #[serde(skip)]
    packed_cells: HashSet<CellId>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            nets: Vec::new(),
            cell_by_name: HashMap::new(),
            net_by_name: HashMap::new(),
            new_cells: Vec::new(),
            packed_cells: HashSet::new(),
        }
    }

    /// Rebuilds the name indices, e.g. after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        for cell in &self.cells {
            self.cell_by_name.insert(cell.name.clone(), cell.id);
        }
        self.net_by_name.clear();
        for net in &self.nets {
            self.net_by_name.insert(net.name.clone(), net.id);
        }
    }

    /// Creates a new cell and returns its ID. The cell is live immediately
    /// but also recorded in `new_cells` for this stage's bookkeeping.
    pub fn create_cell(&mut self, name: impl Into<String>, cell_type: CellType) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        let name = name.into();
        self.cell_by_name.insert(name.clone(), id);
        self.cells.push(Cell::new(id, name, cell_type));
        self.new_cells.push(id);
        id
    }

    /// Creates a new, driverless net and returns its ID.
    pub fn create_net(&mut self, name: impl Into<String>) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        let name = name.into();
        self.net_by_name.insert(name.clone(), id);
        self.nets.push(Net::new(id, name));
        id
    }

    /// Returns the cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.as_raw() as usize]
    }

    /// Returns the net with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the net with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn net_mut(&mut self, id: NetId) -> &mut Net {
        &mut self.nets[id.as_raw() as usize]
    }

    /// Looks up a cell by name.
    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    /// Looks up a net by name.
    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    /// Connects a cell's port to a net, replacing any prior connection on
    /// that port and registering the cell as a user (or driver, if `is_driver`)
    /// of the net.
    pub fn connect_port(&mut self, cell: CellId, port: &str, net: NetId, is_driver: bool) {
        if let Some(prev) = self.cell(cell).port_net(port) {
            self.disconnect_port(cell, port, prev);
        }
        self.cell_mut(cell)
            .connections
            .insert(port.to_string(), net);
        let port_ref = PortRef::new(cell, port.to_string());
        let n = self.net_mut(net);
        if is_driver {
            n.driver = Some(port_ref);
        } else {
            n.users.push(port_ref);
        }
    }

    /// Disconnects a cell's port from the given net, removing it from the
    /// net's driver slot or users list as appropriate.
    pub fn disconnect_port(&mut self, cell: CellId, port: &str, net: NetId) {
        self.cell_mut(cell).connections.remove(port);
        let n = self.net_mut(net);
        if n.driver.as_ref().is_some_and(|d| d.cell == cell && d.port == port) {
            n.driver = None;
        }
        n.users.retain(|u| !(u.cell == cell && u.port == port));
    }

    /// Moves a cell's connection on `port` from `from_net` to `to_net`,
    /// preserving whether it was acting as driver or user.
    pub fn move_port_to(&mut self, cell: CellId, port: &str, from_net: NetId, to_net: NetId) {
        let was_driver = self
            .net(from_net)
            .driver
            .as_ref()
            .is_some_and(|d| d.cell == cell && d.port == port);
        self.disconnect_port(cell, port, from_net);
        self.connect_port(cell, port, to_net, was_driver);
    }

    /// Renames a port on a cell, carrying its connection across (used when
    /// re-purposing a `Lut4`'s input pins during mux-expansion rewiring).
    pub fn rename_port(&mut self, cell: CellId, old_name: &str, new_name: &str) {
        if let Some(net) = self.cell(cell).port_net(old_name) {
            let was_driver = self
                .net(net)
                .driver
                .as_ref()
                .is_some_and(|d| d.cell == cell && d.port == old_name);
            self.disconnect_port(cell, old_name, net);
            self.connect_port(cell, new_name, net, was_driver);
        }
    }

    /// Stages a cell for removal. It is excluded from `live_cells` and
    /// `new_cells` bookkeeping immediately, but its storage slot is only
    /// dropped from iteration entirely on `flush`.
    pub fn erase_cell(&mut self, id: CellId) {
        self.packed_cells.insert(id);
        self.cell_by_name.remove(&self.cell(id).name.clone());
    }

    /// Returns `true` if the cell has been staged for removal.
    pub fn is_packed(&self, id: CellId) -> bool {
        self.packed_cells.contains(&id)
    }

    /// Returns all live (non-erased) cell IDs, in allocation order.
    pub fn live_cells(&self) -> Vec<CellId> {
        (0..self.cells.len() as u32)
            .map(CellId::from_raw)
            .filter(|id| !self.is_packed(*id))
            .collect()
    }

    /// Returns all net IDs.
    pub fn nets(&self) -> Vec<NetId> {
        (0..self.nets.len() as u32).map(NetId::from_raw).collect()
    }

    /// Returns the cell IDs created since the last `flush`.
    pub fn new_cells_this_stage(&self) -> &[CellId] {
        &self.new_cells
    }

    /// Clears the per-stage `new_cells` and `packed_cells` staging sets,
    /// marking the end of a pipeline stage. Erased cells remain in storage
    /// (so existing `CellId`s stay valid) but are permanently excluded from
    /// `live_cells` from this point on.
    pub fn flush(&mut self) {
        self.new_cells.clear();
    }

    /// Returns the number of live cells.
    pub fn live_cell_count(&self) -> usize {
        self.cells.len() - self.packed_cells.len()
    }

    /// Returns the total number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_cell_and_net() {
        let mut nl = Netlist::new();
        let cell = nl.create_cell("lut_0", CellType::Lut4);
        let net = nl.create_net("n1");
        assert_eq!(nl.cell(cell).cell_type, CellType::Lut4);
        assert!(nl.net(net).is_unused());
    }

    #[test]
    fn connect_port_sets_driver_and_user() {
        let mut nl = Netlist::new();
        let lut = nl.create_cell("lut_0", CellType::Lut4);
        let ff = nl.create_cell("ff_0", CellType::TrellisFf);
        let net = nl.create_net("q");
        nl.connect_port(lut, "Z", net, true);
        nl.connect_port(ff, "DI", net, false);
        assert_eq!(nl.net(net).driver.as_ref().unwrap().cell, lut);
        assert_eq!(nl.net(net).users.len(), 1);
        assert_eq!(nl.cell(lut).port_net("Z"), Some(net));
    }

    #[test]
    fn reconnecting_a_port_drops_old_connection() {
        let mut nl = Netlist::new();
        let ff = nl.create_cell("ff_0", CellType::TrellisFf);
        let a = nl.create_net("a");
        let b = nl.create_net("b");
        nl.connect_port(ff, "DI", a, false);
        nl.connect_port(ff, "DI", b, false);
        assert!(nl.net(a).users.is_empty());
        assert_eq!(nl.net(b).users.len(), 1);
    }

    #[test]
    fn move_port_to_preserves_driver_role() {
        let mut nl = Netlist::new();
        let lut = nl.create_cell("lut_0", CellType::Lut4);
        let a = nl.create_net("a");
        let b = nl.create_net("b");
        nl.connect_port(lut, "Z", a, true);
        nl.move_port_to(lut, "Z", a, b);
        assert!(nl.net(a).driver.is_none());
        assert_eq!(nl.net(b).driver.as_ref().unwrap().cell, lut);
    }

    #[test]
    fn rename_port_carries_connection() {
        let mut nl = Netlist::new();
        let lut = nl.create_cell("lut_0", CellType::Lut4);
        let net = nl.create_net("a0");
        nl.connect_port(lut, "A0", net, false);
        nl.rename_port(lut, "A0", "A1");
        assert_eq!(nl.cell(lut).port_net("A0"), None);
        assert_eq!(nl.cell(lut).port_net("A1"), Some(net));
        assert_eq!(nl.net(net).users[0].port, "A1");
    }

    #[test]
    fn erase_cell_removes_from_live_view() {
        let mut nl = Netlist::new();
        let lut = nl.create_cell("lut_0", CellType::Lut4);
        assert_eq!(nl.live_cells(), vec![lut]);
        nl.erase_cell(lut);
        assert!(nl.live_cells().is_empty());
        assert!(nl.is_packed(lut));
        assert!(nl.cell_by_name("lut_0").is_none());
    }

    #[test]
    fn flush_clears_new_cells_but_keeps_packed() {
        let mut nl = Netlist::new();
        let lut = nl.create_cell("lut_0", CellType::Lut4);
        assert_eq!(nl.new_cells_this_stage(), &[lut]);
        nl.erase_cell(lut);
        nl.flush();
        assert!(nl.new_cells_this_stage().is_empty());
        assert!(nl.is_packed(lut));
    }

    #[test]
    fn live_cell_count_excludes_packed() {
        let mut nl = Netlist::new();
        let a = nl.create_cell("a", CellType::Lut4);
        let _b = nl.create_cell("b", CellType::Lut4);
        nl.erase_cell(a);
        assert_eq!(nl.live_cell_count(), 1);
    }
}
