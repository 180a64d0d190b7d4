//! Power constraints published to the host's power solver.

use tracing::warn;

use crate::fault::Fault;

/// Phase a constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    All,
    L1,
    L2,
    L3,
}

/// Which power quantity a constraint bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerKind {
    Active,
    Reactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Equals,
    GreaterOrEquals,
    LessOrEquals,
}

/// One bound on a device's power, attributed to an actor for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub actor: String,
    pub phase: Phase,
    pub kind: PowerKind,
    pub relationship: Relationship,
    pub value: i64,
}

impl Constraint {
    pub fn new(
        actor: impl Into<String>,
        phase: Phase,
        kind: PowerKind,
        relationship: Relationship,
        value: i64,
    ) -> Self {
        Self {
            actor: actor.into(),
            phase,
            kind,
            relationship,
            value,
        }
    }
}

/// Receiver of published constraints, typically the host's solver.
pub trait ConstraintSink {
    /// Applies one constraint.
    ///
    /// # Errors
    ///
    /// Returns a fault if the constraint conflicts with ones already
    /// applied.
    fn apply_constraint(&mut self, constraint: Constraint) -> Result<(), Fault>;
}

/// Fixed hardware envelope of the inverter, published once at startup.
#[derive(Debug, Clone, Copy)]
pub struct StaticLimits {
    pub min_active_w: i64,
    pub max_active_w: i64,
    pub min_reactive_var: i64,
    pub max_reactive_var: i64,
}

impl StaticLimits {
    /// The four all-phase bounds describing the envelope.
    pub fn constraints(&self, actor: &str) -> Vec<Constraint> {
        vec![
            Constraint::new(
                actor,
                Phase::All,
                PowerKind::Active,
                Relationship::GreaterOrEquals,
                self.min_active_w,
            ),
            Constraint::new(
                actor,
                Phase::All,
                PowerKind::Active,
                Relationship::LessOrEquals,
                self.max_active_w,
            ),
            Constraint::new(
                actor,
                Phase::All,
                PowerKind::Reactive,
                Relationship::GreaterOrEquals,
                self.min_reactive_var,
            ),
            Constraint::new(
                actor,
                Phase::All,
                PowerKind::Reactive,
                Relationship::LessOrEquals,
                self.max_reactive_var,
            ),
        ]
    }
}

/// Publishes a symmetric active-power clamp of `magnitude` watts,
/// used when the device reports an over-temperature derate.
///
/// A rejected constraint is logged and dropped; it is re-published on
/// the next cycle anyway, so there is no retry here.
pub fn publish_derate(sink: &mut dyn ConstraintSink, actor: &str, magnitude_w: i64) {
    let bounds = [
        Constraint::new(
            actor,
            Phase::All,
            PowerKind::Active,
            Relationship::GreaterOrEquals,
            -magnitude_w,
        ),
        Constraint::new(
            actor,
            Phase::All,
            PowerKind::Active,
            Relationship::LessOrEquals,
            magnitude_w,
        ),
    ];
    for constraint in bounds {
        if let Err(e) = sink.apply_constraint(constraint) {
            warn!(actor, error = %e, "derate constraint rejected");
        }
    }
}
