//! Fatal packer errors.
//!
//! One variant per §7 Fatal trigger. Distinct from `aion_common::AionResult`
//! (reserved for internal compiler bugs): a fatal packing error is an
//! ordinary, expected outcome of bad input and carries structured context
//! (bel/port/bank names) for the diagnostic message. The pipeline stops at
//! the first `Err` and returns it with no partial rollback.

use thiserror::Error;

/// A fatal condition that aborts the packing pass.
#[derive(Debug, Error)]
pub enum PackError {
    /// A primitive is missing a port the packer requires to absorb it.
    #[error("cell {cell} of type {cell_type} is missing required port {port}")]
    MissingRequiredPort {
        /// Offending cell name.
        cell: String,
        /// Offending cell's primitive type name.
        cell_type: String,
        /// The missing port name.
        port: String,
    },

    /// Two clock/reset assignments to the same IOLOGIC cell disagree.
    #[error("IOLOGIC cell {cell}: conflicting {signal} assignment ({existing} vs {new})")]
    IologicClockConflict {
        /// The IOLOGIC cell name.
        cell: String,
        /// Which signal role conflicted (`"CLK"`, `"ECLK"`, `"LSR"`).
        signal: String,
        /// The existing net/constant description.
        existing: String,
        /// The newly-requested net/constant description.
        new: String,
    },

    /// `ALU54B`/`MULT18X18D` wiring does not satisfy the DSP shape rules.
    #[error("DSP wiring violation between {alu} and {mult}: {reason}")]
    AluWiringViolation {
        /// The `ALU54B` cell name.
        alu: String,
        /// The `MULT18X18D` cell name.
        mult: String,
        /// Description of the violated rule.
        reason: String,
    },

    /// Every edge-clock slot in the bank is already in use by another net.
    #[error("edge clocks exhausted in bank {bank}: no free slot for net {net}")]
    EdgeClockExhausted {
        /// The I/O bank number.
        bank: u32,
        /// The net that needed a slot.
        net: String,
    },

    /// The carry chain's feed-out path could not be found during legalization.
    #[error("carry feed-out path not found for chain starting at {chain_root}")]
    CarryFeedOutNotFound {
        /// Name of the cell starting the affected chain.
        chain_root: String,
    },

    /// A `LOC`/`BEL` attribute names a bel or package pin that does not exist.
    #[error("LOC/BEL attribute on cell {cell} names unknown site {site}")]
    UnknownBel {
        /// Offending cell name.
        cell: String,
        /// The unresolved site or pin name.
        site: String,
    },

    /// A cell's parameter shape does not match what this packer expects
    /// (e.g. a legacy-format net list with the wrong `INIT` width).
    #[error("cell {cell}: malformed input ({reason})")]
    MalformedInput {
        /// Offending cell name.
        cell: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// A moved port's driver is not the `DQSBUFM` of the matching DQS group.
    #[error("cell {cell}: DQS group mismatch on port {port}")]
    DqsGroupMismatch {
        /// Offending cell name.
        cell: String,
        /// The port whose driver failed the DQS-group check.
        port: String,
    },

    /// A `DDRDLLA`'s `DDRDEL` consumers span both halves of the device.
    #[error("DDRDLLA cell {cell}: DDRDEL consumers span both device halves")]
    DdrSplitAcrossHalves {
        /// Offending `DDRDLLA` cell name.
        cell: String,
    },

    /// An `ECLKSYNCB`/`CLKDIVF` helper cell could not be bound to a legal bel.
    #[error("failed to place helper cell {cell} of type {cell_type}")]
    HelperPlacementFailed {
        /// Offending cell name.
        cell: String,
        /// The helper cell's primitive type name.
        cell_type: String,
    },
}
