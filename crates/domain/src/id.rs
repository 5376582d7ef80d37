//! Typed identifier newtypes backed by the integers the device network hands out.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident($inner:ty)) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Access the raw identifier.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        /// Accepts decimal (`42`) and hexadecimal (`0x2a`) notation.
        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => <$inner>::from_str_radix(hex, 16).map(Self),
                    None => s.parse().map(Self),
                }
            }
        }
    };
}

define_id!(
    /// Identifier of a single value exposed by a node (a sensor channel, a switch, …).
    ValueId(u64)
);

define_id!(
    /// Identifier of a node on the device network.
    NodeId(u8)
);

impl ValueId {
    /// Reinterpret the identifier as the signed 64-bit integer `SQLite` stores.
    ///
    /// The bit pattern is preserved, so [`ValueId::from_sql`] restores the
    /// original value even above `i64::MAX`.
    #[must_use]
    pub const fn to_sql(self) -> i64 {
        self.0.cast_signed()
    }

    /// Inverse of [`ValueId::to_sql`].
    #[must_use]
    pub const fn from_sql(raw: i64) -> Self {
        Self(raw.cast_unsigned())
    }
}
