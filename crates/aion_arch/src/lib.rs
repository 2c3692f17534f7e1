//! ECP5 device architecture model for the Aion packer.
//!
//! Provides the [`Ecp5Device`] trait abstracting the bel/wire/pip database a
//! packer pass queries, and [`Ecp5Chip`], a procedurally-generated concrete
//! device model standing in for a real Trellis database load.
//!
//! # Usage
//!
//! ```
//! use aion_arch::load_device;
//!
//! let (chip, exact) = load_device("LFE5U-45F", "CABGA381").unwrap();
//! assert!(exact);
//! assert_eq!(chip.device_name(), "LFE5U-45F");
//! ```

#![warn(missing_docs)]

pub mod device;
pub mod ids;
pub mod types;

pub use device::{load_device, Ecp5Chip, Ecp5Device};
pub use ids::{BelId, PipId, WireId};
pub use types::{
    BankSide, Bel, BelPin, BelType, DeviceKind, DqsGroup, IoBank, Pip, PinDirection, Wire,
};
