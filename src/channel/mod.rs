//! Named, typed value cells shared between the decode path and all
//! cycle consumers.

use std::fmt;
use std::hash::Hash;

/// Double-buffered channel storage.
pub mod store;

pub use store::ChannelStore;

/// Physical unit tag attached to a channel declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Dimensionless (enums, flags, raw states).
    None,
    /// Active power in watts.
    Watt,
    /// Apparent power in volt-amperes.
    VoltAmpere,
    /// Reactive power in volt-amperes reactive.
    VoltAmpereReactive,
    /// State of charge or capacity point in percent.
    Percent,
    /// Cumulative energy in watt-hours.
    WattHours,
}

/// A value held by one channel cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer or enumerated quantity.
    Int(i64),
    /// Fixed-width text (serial numbers and the like).
    Text(String),
}

impl Value {
    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Int(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A compile-time-checked channel identifier.
///
/// Each driver declares its channels as an enum implementing this trait,
/// eliminating runtime lookup-by-name as a failure class.
pub trait ChannelKey: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Every declared channel, in declaration order.
    const ALL: &'static [Self];

    /// Physical unit of this channel.
    fn unit(self) -> Unit;
}
