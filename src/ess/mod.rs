//! The energy-storage devices driven by the polling cycle.

/// DC charger aggregation and energy totals.
pub mod charger;
/// Power constraints published to the host.
pub mod constraint;
/// Cycle stages and the keep-alive timer.
pub mod cycle;
/// The hybrid inverter device.
pub mod device;
/// Energy integration from sampled power.
pub mod energy;
/// Channel definitions and register tables.
pub mod registers;

pub use charger::DcCharger;
pub use constraint::{Constraint, ConstraintSink, Phase, PowerKind, Relationship, StaticLimits};
pub use cycle::{CycleStage, KeepAlive, KEEP_ALIVE_INTERVAL};
pub use device::HybridEss;
pub use energy::{EnergyAccumulator, EnergyPair};
pub use registers::{ChargerChannel, EssChannel};
