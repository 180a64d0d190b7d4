//! The DC charger attached to the hybrid inverter: string aggregation
//! and produced-energy totals.

use std::time::Instant;

use crate::bus::codec;
use crate::bus::regmap::{self, Priority, RegisterMap};
use crate::bus::transport::RegisterBus;
use crate::channel::{ChannelStore, Value};
use crate::config::ChargerConfig;
use crate::ess::cycle::CycleStage;
use crate::ess::energy::EnergyAccumulator;
use crate::ess::registers::{self, ChargerChannel};
use crate::fault::Fault;
use crate::timedata::EnergyArchive;

/// Sub-channels whose updates recompute the aggregate actual power.
const AGGREGATE_INPUTS: [ChargerChannel; 5] = [
    ChargerChannel::StringPower1,
    ChargerChannel::StringPower2,
    ChargerChannel::StringPower3,
    ChargerChannel::StringPower4,
    ChargerChannel::GeneratorPower,
];

/// A read-only DC charger polled alongside the inverter.
pub struct DcCharger {
    config: ChargerConfig,
    map: RegisterMap<ChargerChannel>,
    store: ChannelStore<ChargerChannel>,
    energy: EnergyAccumulator,
    archive: Option<Box<dyn EnergyArchive>>,
}

impl DcCharger {
    /// Builds the charger and registers the aggregation observer: any
    /// string or generator update recomputes `ActualPower` as the sum
    /// of the four strings plus the wrap-corrected generator reading,
    /// with absent inputs counting as zero.
    ///
    /// # Errors
    ///
    /// Returns a configuration fault listing every invalid field.
    pub fn new(config: ChargerConfig) -> Result<Self, Fault> {
        let errors = config.validate();
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Fault::config(joined));
        }

        let map = registers::charger_map()?;
        let mut store = ChannelStore::new(std::iter::empty());
        store.set_next(
            ChargerChannel::MaxActualPower,
            Value::Int(config.max_actual_power_w as i64),
        );
        store.commit();

        store.observe(AGGREGATE_INPUTS, |store| {
            let strings = [
                ChargerChannel::StringPower1,
                ChargerChannel::StringPower2,
                ChargerChannel::StringPower3,
                ChargerChannel::StringPower4,
            ];
            let mut total: i64 = strings.iter().filter_map(|&k| store.next_int(k)).sum();
            total += codec::overflow_corrected(
                store.next_int(ChargerChannel::GeneratorPower).unwrap_or(0),
            );
            store.set_next(ChargerChannel::ActualPower, Value::Int(total));
        });

        Ok(Self {
            config,
            map,
            store,
            energy: EnergyAccumulator::new(),
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

    pub fn store(&self) -> &ChannelStore<ChargerChannel> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChannelStore<ChargerChannel> {
        &mut self.store
    }

    /// Polls all read groups of the given priority. Returns the number
    /// of faulted groups.
    pub fn refresh(&mut self, bus: &mut dyn RegisterBus, priority: Priority) -> usize {
        if !self.config.enabled {
            return 0;
        }
        regmap::poll_priority(bus, &self.map, priority, &mut self.store)
    }

    /// Makes the next buffer the committed process image.
    pub fn commit(&mut self) {
        self.store.commit();
    }

    /// Runs the charger's work for one cycle stage at time `now`.
    pub fn handle_stage(&mut self, stage: CycleStage, now: Instant) {
        if !self.config.enabled {
            return;
        }
        if stage == CycleStage::BeforeProcessImage {
            self.normalize_and_integrate(now);
        }
    }

    /// One-line operator summary of the committed process image.
    pub fn debug_summary(&self) -> String {
        match self.store.current_int(ChargerChannel::ActualPower) {
            Some(v) => format!("P:{v} W"),
            None => "P:- W".to_string(),
        }
    }

    /// The committed aggregate never shows absent once telemetry has
    /// started: a cycle without any sub-channel update publishes zero
    /// instead. The energy total only sees present aggregates; the
    /// published zero stands in for the host, not the integrator.
    fn normalize_and_integrate(&mut self, now: Instant) {
        let actual = self.store.next_int(ChargerChannel::ActualPower);
        if actual.is_none() {
            self.store.set_next(ChargerChannel::ActualPower, Value::Int(0));
        }
        // Export never runs backwards; a negative aggregate integrates
        // as zero production.
        self.energy.update(actual.map(|p| p.max(0)), now);
        let wh = self.energy.watt_hours();
        self.store
            .set_next(ChargerChannel::ActualEnergy, Value::Int(wh as i64));
        if let Some(archive) = self.archive.as_mut() {
            archive.record("ActualEnergy", wh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn charger() -> DcCharger {
        DcCharger::new(ChargerConfig::default()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = ChargerConfig {
            max_actual_power_w: 0,
            ..ChargerConfig::default()
        };
        assert!(matches!(DcCharger::new(config), Err(Fault::Config(_))));
    }

    #[test]
    fn aggregate_recomputes_on_every_input_update() {
        let mut chg = charger();
        chg.store_mut()
            .set_next(ChargerChannel::StringPower1, Value::Int(100));
        assert_eq!(chg.store().next_int(ChargerChannel::ActualPower), Some(100));

        chg.store_mut()
            .set_next(ChargerChannel::StringPower2, Value::Int(200));
        chg.store_mut()
            .set_next(ChargerChannel::StringPower3, Value::Int(300));
        chg.store_mut()
            .set_next(ChargerChannel::StringPower4, Value::Int(400));
        assert_eq!(chg.store().next_int(ChargerChannel::ActualPower), Some(1000));
    }

    #[test]
    fn generator_reading_is_wrap_corrected() {
        let mut chg = charger();
        chg.store_mut()
            .set_next(ChargerChannel::StringPower1, Value::Int(100));
        chg.store_mut()
            .set_next(ChargerChannel::StringPower2, Value::Int(200));
        chg.store_mut()
            .set_next(ChargerChannel::StringPower3, Value::Int(300));
        chg.store_mut()
            .set_next(ChargerChannel::StringPower4, Value::Int(400));
        // 40000 on the wire decodes to 40000 - 65536 = -25536.
        chg.store_mut()
            .set_next(ChargerChannel::GeneratorPower, Value::Int(40_000));
        assert_eq!(
            chg.store().next_int(ChargerChannel::ActualPower),
            Some(-24_536)
        );
    }

    #[test]
    fn silent_cycle_publishes_zero_power() {
        let t0 = Instant::now();
        let mut chg = charger();

        chg.store_mut()
            .set_next(ChargerChannel::StringPower1, Value::Int(3600));
        chg.handle_stage(CycleStage::BeforeProcessImage, t0);
        chg.handle_stage(CycleStage::BeforeProcessImage, t0 + Duration::from_secs(3600));
        chg.commit();
        assert_eq!(chg.store().current_int(ChargerChannel::ActualEnergy), Some(3600));

        // A charger restart clears the next buffer in a fresh instance;
        // model the absent aggregate directly.
        let mut fresh = charger();
        fresh.handle_stage(CycleStage::BeforeProcessImage, t0);
        fresh.commit();
        assert_eq!(fresh.store().current_int(ChargerChannel::ActualPower), Some(0));
        assert_eq!(fresh.store().current_int(ChargerChannel::ActualEnergy), Some(0));
    }

    #[test]
    fn negative_aggregate_integrates_as_zero() {
        let t0 = Instant::now();
        let mut chg = charger();
        chg.store_mut()
            .set_next(ChargerChannel::GeneratorPower, Value::Int(40_000));
        chg.handle_stage(CycleStage::BeforeProcessImage, t0);
        chg.handle_stage(CycleStage::BeforeProcessImage, t0 + Duration::from_secs(600));
        assert_eq!(chg.store().next_int(ChargerChannel::ActualEnergy), Some(0));
    }

    #[test]
    fn max_actual_power_comes_from_config() {
        let chg = charger();
        assert_eq!(
            chg.store().current_int(ChargerChannel::MaxActualPower),
            Some(12_000)
        );
    }
}
