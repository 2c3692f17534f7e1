//! Nets: a driver plus zero or more sinks.

use crate::ids::NetId;
use crate::portref::PortRef;
use crate::property::Property;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A clock-domain constraint attached to a net, propagated by the
/// clock-constraint fixed-point pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockConstraint {
    /// Target period in picoseconds.
    pub period_ps: u64,
    /// `true` if this constraint was derived (not directly user-specified).
    pub derived: bool,
}

/// A net in the packed netlist: one driver, any number of sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Human-readable net name.
    pub name: String,
    /// The driving port, if any (`None` only transiently while building).
    pub driver: Option<PortRef>,
    /// Sink ports fed by this net.
    pub users: Vec<PortRef>,
    /// Clock-domain constraint, if this net carries a clock.
    pub clock: Option<ClockConstraint>,
    /// Net-level attributes (`KEEP`, `GLOBAL`, ...).
    pub attrs: HashMap<String, Property>,
}

impl Net {
    /// Creates a new, driverless net.
    pub fn new(id: NetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            driver: None,
            users: Vec::new(),
            clock: None,
            attrs: HashMap::new(),
        }
    }

    /// Returns `true` if this net has no driver and no users.
    pub fn is_unused(&self) -> bool {
        self.driver.is_none() && self.users.is_empty()
    }

    /// Returns the number of sink connections on this net.
    pub fn fanout(&self) -> usize {
        self.users.len()
    }
}
