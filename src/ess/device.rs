//! The hybrid inverter: telemetry, energy totals, keep-alive, and
//! power commands.

use std::time::Instant;

use tracing::{debug, warn};

use crate::bus::regmap::{self, Priority, RegisterMap};
use crate::bus::transport::RegisterBus;
use crate::channel::{ChannelStore, Value};
use crate::config::InverterConfig;
use crate::ess::constraint::{self, ConstraintSink, StaticLimits};
use crate::ess::cycle::{CycleStage, KeepAlive};
use crate::ess::energy::EnergyPair;
use crate::ess::registers::{self, EssChannel, ESS_WRITABLE, WORK_STATE_START};
use crate::fault::Fault;
use crate::timedata::EnergyArchive;

/// Smallest active-power step the hardware resolves, in watts.
pub const POWER_PRECISION_W: i64 = 100;

/// A polled hybrid inverter with battery storage.
pub struct HybridEss {
    config: InverterConfig,
    map: RegisterMap<EssChannel>,
    store: ChannelStore<EssChannel>,
    ac_energy: EnergyPair,
    dc_energy: EnergyPair,
    keep_alive: KeepAlive,
    archive: Option<Box<dyn EnergyArchive>>,
}

impl HybridEss {
    /// Builds the device, validating its configuration and seeding the
    /// host-facing channels with the configured ratings.
    ///
    /// # Errors
    ///
    /// Returns a configuration fault listing every invalid field.
    pub fn new(config: InverterConfig) -> Result<Self, Fault> {
        let errors = config.validate();
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Fault::config(joined));
        }

        let map = registers::inverter_map()?;
        let mut store = ChannelStore::new(ESS_WRITABLE.iter().copied());
        store.set_next(
            EssChannel::AllowedChargePower,
            Value::Int(config.allowed_charge_power_w),
        );
        store.set_next(
            EssChannel::AllowedDischargePower,
            Value::Int(config.allowed_discharge_power_w),
        );
        store.set_next(
            EssChannel::MaxApparentPower,
            Value::Int(config.max_apparent_power_va as i64),
        );
        store.set_next(EssChannel::Capacity, Value::Int(config.capacity_wh as i64));
        store.commit();

        Ok(Self {
            config,
            map,
            store,
            ac_energy: EnergyPair::new(),
            dc_energy: EnergyPair::new(),
            keep_alive: KeepAlive::new(),
            archive: None,
        })
    }

    /// Routes cumulative energy totals to an archive.
    pub fn set_archive(&mut self, archive: Box<dyn EnergyArchive>) {
        self.archive = Some(archive);
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// False while the device is configured for monitoring only.
    pub fn is_managed(&self) -> bool {
        !self.config.read_only_mode
    }

    /// Granularity of accepted power setpoints, in watts.
    pub fn power_precision(&self) -> i64 {
        POWER_PRECISION_W
    }

    /// The fixed hardware envelope to publish once at startup.
    pub fn static_limits(&self) -> StaticLimits {
        StaticLimits {
            min_active_w: self.config.min_active_power_w,
            max_active_w: self.config.max_active_power_w,
            min_reactive_var: self.config.min_reactive_power_var,
            max_reactive_var: self.config.max_reactive_power_var,
        }
    }

    pub fn store(&self) -> &ChannelStore<EssChannel> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChannelStore<EssChannel> {
        &mut self.store
    }

    /// Polls all read groups of the given priority into the next
    /// buffer. Returns the number of faulted groups; faulted groups
    /// keep their previously committed values.
    pub fn refresh(&mut self, bus: &mut dyn RegisterBus, priority: Priority) -> usize {
        if !self.config.enabled {
            return 0;
        }
        regmap::poll_priority(bus, &self.map, priority, &mut self.store)
    }

    /// Writes every register group with a pending command. Returns the
    /// number of groups written.
    pub fn flush_writes(&mut self, bus: &mut dyn RegisterBus) -> usize {
        if !self.config.enabled {
            return 0;
        }
        regmap::flush_pending(bus, &self.map, &mut self.store)
    }

    /// Makes the next buffer the committed process image.
    pub fn commit(&mut self) {
        self.store.commit();
    }

    /// Runs the device's work for one cycle stage at time `now`.
    pub fn handle_stage(
        &mut self,
        stage: CycleStage,
        now: Instant,
        sink: &mut dyn ConstraintSink,
    ) {
        if !self.config.enabled {
            return;
        }
        match stage {
            CycleStage::BeforeProcessImage => {}
            CycleStage::AfterProcessImage => {
                self.publish_derate(sink);
                self.calculate_energy(now);
            }
            CycleStage::BeforeControllers => {
                self.define_work_state(now);
            }
        }
    }

    /// Translates a requested power setpoint into the sell-mode command.
    ///
    /// The device steers its own power from the sell schedule; the
    /// driver only gates it. Charging disables time-of-use selling so
    /// the grid cannot preempt the commanded charge; an idle setpoint
    /// restores the device's own sell schedule; a discharge request
    /// queues nothing.
    ///
    /// # Errors
    ///
    /// Returns a validation fault if the sell-mode channel rejects the
    /// command.
    pub fn apply_power(&mut self, active_w: i64, _reactive_var: i64) -> Result<(), Fault> {
        if self.config.read_only_mode {
            return Ok(());
        }
        if active_w < 0 {
            self.store.command(EssChannel::SetTimeOfUseSelling, 0)?;
        } else if active_w == 0 {
            self.store.command(EssChannel::SetTimeOfUseSelling, 255)?;
        }
        Ok(())
    }

    /// One-line operator summary of the committed process image.
    pub fn debug_summary(&self) -> String {
        let fmt = |v: Option<i64>| match v {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        format!(
            "SoC:{} %|L:{} W|Allowed:{};{} W",
            fmt(self.store.current_int(EssChannel::Soc)),
            fmt(self.store.current_int(EssChannel::ActivePower)),
            fmt(self.store.current_int(EssChannel::AllowedChargePower)),
            fmt(self.store.current_int(EssChannel::AllowedDischargePower)),
        )
    }

    fn publish_derate(&mut self, sink: &mut dyn ConstraintSink) {
        let magnitude = self.config.overtemperature_derate_w;
        if magnitude == 0 {
            return;
        }
        let flagged = self
            .store
            .current_int(EssChannel::OvertemperatureDerate)
            .is_some_and(|v| v != 0);
        if flagged {
            debug!(id = %self.config.id, magnitude, "over-temperature derate active");
            constraint::publish_derate(sink, &self.config.id, magnitude);
        }
    }

    fn calculate_energy(&mut self, now: Instant) {
        let power = self.store.current_int(EssChannel::ActivePower);
        self.ac_energy.update(power, now);
        // The device exposes no usable DC-side power reading, so the DC
        // totals integrate the AC sample as an approximation.
        self.dc_energy.update(power, now);

        let totals = [
            (EssChannel::ActiveChargeEnergy, self.ac_energy.charge.watt_hours()),
            (
                EssChannel::ActiveDischargeEnergy,
                self.ac_energy.discharge.watt_hours(),
            ),
            (EssChannel::DcChargeEnergy, self.dc_energy.charge.watt_hours()),
            (
                EssChannel::DcDischargeEnergy,
                self.dc_energy.discharge.watt_hours(),
            ),
        ];
        for (channel, wh) in totals {
            self.store.set_next(channel, Value::Int(wh as i64));
            if let Some(archive) = self.archive.as_mut() {
                archive.record(&format!("{channel:?}"), wh);
            }
        }
    }

    /// Reissues the work-state command whenever the keep-alive interval
    /// has elapsed. The device falls back to standby if the command
    /// stops arriving.
    fn define_work_state(&mut self, now: Instant) {
        if !self.keep_alive.due(now) {
            return;
        }
        match self.store.command(EssChannel::SetWorkState, WORK_STATE_START) {
            Ok(()) => self.keep_alive.mark_issued(now),
            Err(e) => warn!(id = %self.config.id, error = %e, "work-state command rejected"),
        }
    }
}
