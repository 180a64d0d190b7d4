//! Shared test fixtures for integration tests.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use hybrid_ess::ess::{Constraint, ConstraintSink};
use hybrid_ess::{Fault, MemoryBus};

/// An in-memory register bank preloaded with plausible inverter
/// telemetry: grid on, serial "DY0012345X", run state 2, SoC 88 %,
/// 500 W discharge, 600 VA apparent.
pub fn inverter_bus() -> MemoryBus {
    let mut bus = MemoryBus::new();
    bus.set(1, 1);
    bus.load(3, &[0x4459, 0x3030, 0x3132, 0x3334, 0x3558]);
    bus.set(500, 2);
    bus.set(588, 88);
    bus.set(590, 500);
    bus.set(620, 600);
    bus
}

/// An in-memory register bank preloaded with charger telemetry: four
/// strings at 100/200/300/400 W and a generator reading of 40000, which
/// wrap-corrects to -25536 W.
pub fn charger_bus() -> MemoryBus {
    let mut bus = MemoryBus::new();
    bus.set(619, 1000);
    bus.set(667, 40_000);
    bus.load(672, &[100, 200, 300, 400]);
    bus
}

/// A constraint sink recording everything applied to it.
#[derive(Default)]
pub struct RecordingSink(pub Vec<Constraint>);

impl ConstraintSink for RecordingSink {
    fn apply_constraint(&mut self, constraint: Constraint) -> Result<(), Fault> {
        self.0.push(constraint);
        Ok(())
    }
}
