//! Register-driven telemetry and control for a hybrid storage inverter
//! on a polled field bus.
//!
//! The host drives the cycle: poll read groups into the channel store's
//! next buffer, commit the process image, run the stage handlers, then
//! flush pending write commands back to the device.

pub mod bus;
pub mod channel;
pub mod config;
pub mod ess;
pub mod fault;
pub mod timedata;

pub use bus::{MemoryBus, Priority, RegisterBus};
pub use config::{ChargerConfig, ConfigError, EssConfig, InverterConfig};
pub use ess::{CycleStage, DcCharger, HybridEss};
pub use fault::Fault;
