//! Shared data types for the ECP5 device architecture model.
//!
//! Defines the bel/wire/pip shapes the packer consumes (spec §6's
//! "Device-database surface") and the handful of device-wide facts
//! (grid size, device kind, I/O banks, DQS groups) the packer's IOLOGIC
//! and PLL stages need.

use crate::ids::{BelId, PipId, WireId};
use serde::{Deserialize, Serialize};

/// The functional kind of a BEL in the device grid.
///
/// A closed, ~20-variant set matching the primitives the packer knows how
/// to target — chosen as an enum (rather than an interned type string, as
/// the original nextpnr source uses) for exhaustive compile-time coverage
/// of the fixed ECP5 primitive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BelType {
    /// `TRELLIS_SLICE` — 2 LUT4s + 2 FFs + carry/mux fabric.
    Slice,
    /// `TRELLIS_IO` — a physical I/O pad and its buffer controls.
    Pio,
    /// `IOLOGIC` — per-pin DDR/delay/gearbox site (non-edge rows).
    Iologic,
    /// `SIOLOGIC` — the simplified IOLOGIC variant used on top/bottom rows.
    Siologic,
    /// `DP16KD` — block RAM site.
    Bram,
    /// `MULT18X18D` site.
    DspMult,
    /// `ALU54B` site.
    DspAlu,
    /// `EHXPLLL` — PLL site.
    Pll,
    /// DCU (high-speed SERDES) hard-macro site.
    Dcu,
    /// `EXTREFB` site, paired with a DCU.
    Extref,
    /// `PCSCLKDIV` site, paired with a DCU.
    Pcsclkdiv,
    /// `DQSBUFM` strobe-buffer site, adjacent to a PIO group.
    Dqsbufm,
    /// `TRELLIS_ECLKBUF` edge-clock buffer site.
    Eclkbuf,
    /// `ECLKBRIDGECS` site.
    Eclkbridgecs,
    /// `ECLKSYNCB` site.
    Eclksyncb,
    /// `CLKDIVF` site.
    Clkdivf,
    /// `DDRDLLA`/`DDRDLL` site.
    Ddrdll,
    /// `GSR` global set/reset site.
    Gsr,
    /// `USRMCLK` configuration-clock site.
    Usrmclk,
    /// `OSCG` internal oscillator site.
    Osc,
}

/// A basic element of logic (BEL): a single placeable site in the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bel {
    /// The unique ID of this BEL.
    pub id: BelId,
    /// Fully-qualified bel name, e.g. `"X3/Y4/SLICE_A"`.
    pub name: String,
    /// The functional type of this BEL.
    pub bel_type: BelType,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Z position within the tile (e.g. 0..3 for the four SLICEs of a tile).
    pub z: u32,
}

/// A pin on a BEL, as exposed by `get_bel_pins`/`get_bel_pin_wire`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BelPin {
    /// Pin name, e.g. `"A0"`, `"Q1"`, `"ECLK"`.
    pub name: String,
    /// Direction of this pin relative to the bel.
    pub direction: PinDirection,
    /// The wire this pin connects to.
    pub wire: WireId,
}

/// Direction of a bel pin or netlist port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Data flows into the bel/cell.
    Input,
    /// Data flows out of the bel/cell.
    Output,
    /// Bidirectional (e.g. a PIO pad pin).
    InOut,
}

/// A routing wire segment in the device interconnect fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    /// The unique ID of this wire.
    pub id: WireId,
    /// Fully-qualified wire name, e.g. `"X3/Y4/G_BANK3ECLK0"`.
    pub name: String,
}

/// A programmable interconnect point (PIP) connecting two wires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pip {
    /// The unique ID of this PIP.
    pub id: PipId,
    /// The wire this PIP can connect from.
    pub src: WireId,
    /// The wire this PIP can connect to.
    pub dst: WireId,
}

/// The ECP5 sub-family, distinguishing feature sets (SERDES, 5G transceivers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Plain LFE5U-* parts: no SERDES.
    Lfe5u,
    /// LFE5UM-* parts: includes DCU (SERDES) hard macros.
    Lfe5um,
    /// LFE5UM5G-* parts: includes 5G-capable DCU hard macros.
    Lfe5um5g,
}

/// An I/O bank: the unit edge-clock slots and DQS groups are scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoBank {
    /// The bank number (device-specific, typically 0..8).
    pub index: u32,
    /// All PIO bels in this bank.
    pub pios: Vec<BelId>,
    /// Which side of the device this bank's PIOs are on.
    pub side: BankSide,
}

/// The physical edge of the device an I/O bank's PIOs sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankSide {
    /// Top row.
    Top,
    /// Bottom row.
    Bottom,
    /// Left column.
    Left,
    /// Right column.
    Right,
}

/// A strobe (DQS) group: PIOs sharing a `DQSBUFM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqsGroup {
    /// `true` if this group is on the right half of the device (x > width/2).
    pub is_right: bool,
    /// Index of the group within its half.
    pub group_index: u32,
}
