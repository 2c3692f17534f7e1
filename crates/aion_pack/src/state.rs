//! Packer-owned scratch state, lifetime equal to one pack invocation.
//!
//! Bundled into one struct rather than exposed as module-level state, per
//! §9's explicit guidance ("Bundle them into the packer object; do not
//! expose as module-level state").

use aion_netlist::{CellId, NetId};
use std::collections::HashMap;

/// Which of a `TRELLIS_SLICE`'s four logical sub-slots are occupied.
#[derive(Debug, Clone, Default)]
pub struct SliceUsage {
    /// Cell occupying the `LUT0` slot.
    pub lut0: Option<CellId>,
    /// Cell occupying the `LUT1` slot.
    pub lut1: Option<CellId>,
    /// Cell occupying the `FF0` slot.
    pub ff0: Option<CellId>,
    /// Cell occupying the `FF1` slot.
    pub ff1: Option<CellId>,
    /// Cell whose output is tapped at `MUX5` (LUT5 construction).
    pub mux5: Option<CellId>,
    /// Cell whose output is tapped at `MUXX` (LUT6/7 construction).
    pub muxx: Option<CellId>,
    /// Cell occupying the `RAMW` write-port slot (DPRAM cluster).
    pub ramw: Option<CellId>,
    /// Cell occupying a `DPRAM0`/`DPRAM1` slot.
    pub dpram: Option<CellId>,
}

impl SliceUsage {
    /// Returns `true` if both LUT slots are filled.
    pub fn luts_full(&self) -> bool {
        self.lut0.is_some() && self.lut1.is_some()
    }

    /// Returns `true` if both FF slots are filled.
    pub fn ffs_full(&self) -> bool {
        self.ff0.is_some() && self.ff1.is_some()
    }

    /// Returns the number of free FF slots (0, 1, or 2).
    pub fn free_ff_slots(&self) -> u32 {
        [&self.ff0, &self.ff1].iter().filter(|s| s.is_none()).count() as u32
    }
}

/// A per-`(bank, slot)` edge-clock promotion record (§3's `EdgeClockInfo`).
#[derive(Debug, Clone)]
pub struct EdgeClockInfo {
    /// The original, unbuffered source net.
    pub source_net: NetId,
    /// The buffered net created by the promoted `TRELLIS_ECLKBUF`.
    pub buffered_net: NetId,
    /// The synthesized `TRELLIS_ECLKBUF` cell.
    pub eclkbuf_cell: CellId,
}

/// The packer's scratch state for a single pack invocation.
#[derive(Debug, Default)]
pub struct PackerState {
    /// LUT (or mux-tree output) cell -> the single FF it exclusively drives.
    pub lutff_pairs: HashMap<CellId, CellId>,
    /// FF cell -> the LUT (or mux-tree output) cell that exclusively drives it.
    pub fflut_pairs: HashMap<CellId, CellId>,
    /// LUT cell -> its paired partner LUT, from the LUT-LUT pairing heuristic.
    pub lut_pairs: HashMap<CellId, CellId>,
    /// `TRELLIS_SLICE` cell -> which of its four sub-slots are filled.
    pub slice_usage: HashMap<CellId, SliceUsage>,
    /// `(bank, slot)` -> the edge-clock promotion bound to that slot.
    pub edge_clocks: HashMap<(u32, u8), EdgeClockInfo>,
}

impl PackerState {
    /// Creates empty scratch state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of `TRELLIS_SLICE` cells created so far.
    pub fn slice_count(&self) -> usize {
        self.slice_usage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_usage_tracks_full_luts() {
        let mut usage = SliceUsage::default();
        assert!(!usage.luts_full());
        usage.lut0 = Some(CellId::from_raw(0));
        usage.lut1 = Some(CellId::from_raw(1));
        assert!(usage.luts_full());
    }

    #[test]
    fn free_ff_slots_counts_down() {
        let mut usage = SliceUsage::default();
        assert_eq!(usage.free_ff_slots(), 2);
        usage.ff0 = Some(CellId::from_raw(0));
        assert_eq!(usage.free_ff_slots(), 1);
        usage.ff1 = Some(CellId::from_raw(1));
        assert_eq!(usage.free_ff_slots(), 0);
    }

    #[test]
    fn new_state_is_empty() {
        let state = PackerState::new();
        assert_eq!(state.slice_count(), 0);
        assert!(state.lut_pairs.is_empty());
    }
}
