//! Cell parameter values.
//!
//! Mirrors the tagged string/sized-integer union nextpnr cells use for
//! their `params`/`attrs` maps (`IdString` -> `Property`): every ECP5
//! primitive parameter (`LUT4` `INIT`, `CCU2C` `INJECT1_0`, `DELAYF`
//! `DEL_MODE`, ...) is either a bare string or a fixed-width bitvector
//! string like `"0b0101"`.

use aion_common::LogicVec;
use serde::{Deserialize, Serialize};

/// A single cell parameter or attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    /// A plain string value, e.g. `"SCLK_ALIGNED"`.
    Str(String),
    /// A sized bitvector value, e.g. a LUT `INIT` mask.
    Bits(LogicVec),
}

impl Property {
    /// Creates a string property.
    pub fn from_str(s: impl Into<String>) -> Self {
        Property::Str(s.into())
    }

    /// Creates a bitvector property from an integer and an explicit width.
    pub fn from_int(value: u64, width: u32) -> Self {
        let mut vec = LogicVec::all_zero(width);
        for i in 0..width {
            let bit = (value >> i) & 1;
            vec.set(
                i,
                if bit == 1 {
                    aion_common::Logic::One
                } else {
                    aion_common::Logic::Zero
                },
            );
        }
        Property::Bits(vec)
    }

    /// Returns this property's string value, or `default` if it is a
    /// bitvector (or simply returns the string as-is).
    pub fn str_or_default<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Property::Str(s) => s,
            Property::Bits(_) => default,
        }
    }

    /// Returns this property's integer value, or `default` if it is not a
    /// representable bitvector.
    pub fn int_or_default(&self, default: u64) -> u64 {
        match self {
            Property::Bits(bits) => {
                let mut value = 0u64;
                for i in 0..bits.width().min(64) {
                    if bits.get(i) == aion_common::Logic::One {
                        value |= 1 << i;
                    }
                }
                value
            }
            Property::Str(s) => s.parse::<u64>().unwrap_or(default),
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::from_str(s)
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        Property::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips() {
        let p = Property::from_str("SCLK_ALIGNED");
        assert_eq!(p.str_or_default(""), "SCLK_ALIGNED");
    }

    #[test]
    fn int_round_trips_through_bits() {
        let p = Property::from_int(0b1010, 4);
        assert_eq!(p.int_or_default(0), 0b1010);
    }

    #[test]
    fn str_or_default_falls_back_for_bits() {
        let p = Property::from_int(3, 2);
        assert_eq!(p.str_or_default("fallback"), "fallback");
    }

    #[test]
    fn int_or_default_falls_back_for_non_numeric_str() {
        let p = Property::from_str("not_a_number");
        assert_eq!(p.int_or_default(7), 7);
    }

    #[test]
    fn numeric_str_parses_as_int() {
        let p = Property::from_str("42");
        assert_eq!(p.int_or_default(0), 42);
    }
}
