//! Field-bus access: transport contract, word codec, and register maps.

/// Pure word-level encode/decode functions.
pub mod codec;
/// Register bindings, read/write groups, and map validation.
pub mod regmap;
/// The bus transport contract and an in-memory register bank.
pub mod transport;

pub use codec::RegisterKind;
pub use regmap::{Priority, ReadGroup, RegisterBinding, RegisterMap, WriteGroup};
pub use transport::{BusError, MemoryBus, RegisterBus};
