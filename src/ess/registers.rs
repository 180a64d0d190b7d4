//! Channel definitions and register tables for the hybrid inverter and
//! its DC charger.

use crate::bus::codec::RegisterKind;
use crate::bus::regmap::{Priority, ReadGroup, RegisterBinding, RegisterMap, WriteGroup};
use crate::channel::{ChannelKey, Unit};
use crate::fault::Fault;

/// Work-state value commanded over the keep-alive register.
pub const WORK_STATE_START: i64 = 1;

/// Channels of the hybrid inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EssChannel {
    // Telemetry read from the device.
    GridMode,
    SerialNumber,
    InverterRunState,
    Soc,
    ActivePower,
    ApparentPower,
    // Commands written to the device.
    SetActivePower,
    SetReactivePower,
    SetWorkState,
    SetGridChargingStartCapacityPoint,
    SetTimeOfUseSelling,
    // Host-facing values maintained locally.
    AllowedChargePower,
    AllowedDischargePower,
    MaxApparentPower,
    Capacity,
    OvertemperatureDerate,
    ActiveChargeEnergy,
    ActiveDischargeEnergy,
    DcChargeEnergy,
    DcDischargeEnergy,
}

impl ChannelKey for EssChannel {
    const ALL: &'static [Self] = &[
        Self::GridMode,
        Self::SerialNumber,
        Self::InverterRunState,
        Self::Soc,
        Self::ActivePower,
        Self::ApparentPower,
        Self::SetActivePower,
        Self::SetReactivePower,
        Self::SetWorkState,
        Self::SetGridChargingStartCapacityPoint,
        Self::SetTimeOfUseSelling,
        Self::AllowedChargePower,
        Self::AllowedDischargePower,
        Self::MaxApparentPower,
        Self::Capacity,
        Self::OvertemperatureDerate,
        Self::ActiveChargeEnergy,
        Self::ActiveDischargeEnergy,
        Self::DcChargeEnergy,
        Self::DcDischargeEnergy,
    ];

    fn unit(self) -> Unit {
        match self {
            Self::GridMode
            | Self::SerialNumber
            | Self::InverterRunState
            | Self::SetWorkState
            | Self::SetTimeOfUseSelling => Unit::None,
            Self::Soc | Self::SetGridChargingStartCapacityPoint => Unit::Percent,
            Self::ActivePower
            | Self::SetActivePower
            | Self::AllowedChargePower
            | Self::AllowedDischargePower
            | Self::OvertemperatureDerate => Unit::Watt,
            Self::ApparentPower | Self::MaxApparentPower => Unit::VoltAmpere,
            Self::SetReactivePower => Unit::VoltAmpereReactive,
            Self::Capacity
            | Self::ActiveChargeEnergy
            | Self::ActiveDischargeEnergy
            | Self::DcChargeEnergy
            | Self::DcDischargeEnergy => Unit::WattHours,
        }
    }
}

/// Channels writable through [`crate::channel::ChannelStore::command`].
pub const ESS_WRITABLE: &[EssChannel] = &[
    EssChannel::SetActivePower,
    EssChannel::SetReactivePower,
    EssChannel::SetWorkState,
    EssChannel::SetGridChargingStartCapacityPoint,
    EssChannel::SetTimeOfUseSelling,
];

/// The inverter's register table.
///
/// The active-power and state-of-charge groups are high priority and
/// polled every cycle; identity and status groups are low priority.
pub fn inverter_map() -> Result<RegisterMap<EssChannel>, Fault> {
    let read_groups = vec![
        ReadGroup {
            start: 1,
            priority: Priority::Low,
            bindings: vec![
                RegisterBinding::new(EssChannel::GridMode, 1, RegisterKind::U16),
                RegisterBinding::padding(2, 1),
                RegisterBinding::new(EssChannel::SerialNumber, 3, RegisterKind::Text(5)),
            ],
        },
        ReadGroup {
            start: 500,
            priority: Priority::Low,
            bindings: vec![RegisterBinding::new(
                EssChannel::InverterRunState,
                500,
                RegisterKind::U16,
            )],
        },
        ReadGroup {
            start: 588,
            priority: Priority::High,
            bindings: vec![RegisterBinding::new(EssChannel::Soc, 588, RegisterKind::U16)],
        },
        ReadGroup {
            start: 590,
            priority: Priority::High,
            bindings: vec![RegisterBinding::new(
                EssChannel::ActivePower,
                590,
                RegisterKind::S16,
            )],
        },
        ReadGroup {
            start: 620,
            priority: Priority::Low,
            bindings: vec![RegisterBinding::new(
                EssChannel::ApparentPower,
                620,
                RegisterKind::U16,
            )],
        },
    ];

    let write_groups = vec![
        WriteGroup {
            start: 77,
            bindings: vec![
                RegisterBinding::new(EssChannel::SetActivePower, 77, RegisterKind::S16),
                RegisterBinding::new(EssChannel::SetReactivePower, 78, RegisterKind::S16),
            ],
        },
        WriteGroup {
            start: 80,
            bindings: vec![RegisterBinding::new(
                EssChannel::SetWorkState,
                80,
                RegisterKind::U16,
            )],
        },
        WriteGroup {
            start: 127,
            bindings: vec![RegisterBinding::new(
                EssChannel::SetGridChargingStartCapacityPoint,
                127,
                RegisterKind::S16,
            )],
        },
        WriteGroup {
            start: 146,
            bindings: vec![RegisterBinding::new(
                EssChannel::SetTimeOfUseSelling,
                146,
                RegisterKind::U16,
            )],
        },
    ];

    RegisterMap::new(read_groups, write_groups)
}

/// Channels of the DC charger attached to the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargerChannel {
    ActivePower,
    StringPower1,
    StringPower2,
    StringPower3,
    StringPower4,
    GeneratorPower,
    // Host-facing aggregates.
    ActualPower,
    ActualEnergy,
    MaxActualPower,
}

impl ChannelKey for ChargerChannel {
    const ALL: &'static [Self] = &[
        Self::ActivePower,
        Self::StringPower1,
        Self::StringPower2,
        Self::StringPower3,
        Self::StringPower4,
        Self::GeneratorPower,
        Self::ActualPower,
        Self::ActualEnergy,
        Self::MaxActualPower,
    ];

    fn unit(self) -> Unit {
        match self {
            Self::ActualEnergy => Unit::WattHours,
            _ => Unit::Watt,
        }
    }
}

/// The charger's register table. The charger is read-only on the wire.
pub fn charger_map() -> Result<RegisterMap<ChargerChannel>, Fault> {
    let read_groups = vec![
        ReadGroup {
            start: 619,
            priority: Priority::High,
            bindings: vec![RegisterBinding::new(
                ChargerChannel::ActivePower,
                619,
                RegisterKind::S16,
            )],
        },
        ReadGroup {
            start: 667,
            priority: Priority::Low,
            bindings: vec![RegisterBinding::new(
                ChargerChannel::GeneratorPower,
                667,
                RegisterKind::U16,
            )],
        },
        ReadGroup {
            start: 672,
            priority: Priority::Low,
            bindings: vec![
                RegisterBinding::new(ChargerChannel::StringPower1, 672, RegisterKind::U16),
                RegisterBinding::new(ChargerChannel::StringPower2, 673, RegisterKind::U16),
                RegisterBinding::new(ChargerChannel::StringPower3, 674, RegisterKind::U16),
                RegisterBinding::new(ChargerChannel::StringPower4, 675, RegisterKind::U16),
            ],
        },
    ];

    RegisterMap::new(read_groups, vec![])
}
