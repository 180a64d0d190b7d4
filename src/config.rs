//! TOML-based device configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level device configuration parsed from TOML.
///
/// All fields have defaults matching the stock hardware. Load from TOML
/// with [`EssConfig::from_toml_file`] or use [`EssConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EssConfig {
    /// Hybrid inverter parameters.
    pub inverter: InverterConfig,
    /// DC charger parameters.
    pub charger: ChargerConfig,
}

/// Hybrid inverter parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InverterConfig {
    /// Component identifier used in logs and constraints.
    pub id: String,
    /// Whether the inverter participates in the cycle at all.
    pub enabled: bool,
    /// Monitor only: telemetry is read but no commands are written.
    pub read_only_mode: bool,
    /// Usable battery capacity (Wh, must be > 0).
    pub capacity_wh: u64,
    /// Apparent-power rating (VA, must be > 0).
    pub max_apparent_power_va: u64,
    /// Maximum charging power (W, negative by sign convention).
    pub allowed_charge_power_w: i64,
    /// Maximum discharging power (W, positive).
    pub allowed_discharge_power_w: i64,
    /// Lower active-power bound published at startup (W).
    pub min_active_power_w: i64,
    /// Upper active-power bound published at startup (W).
    pub max_active_power_w: i64,
    /// Lower reactive-power bound published at startup (var).
    pub min_reactive_power_var: i64,
    /// Upper reactive-power bound published at startup (var).
    pub max_reactive_power_var: i64,
    /// Symmetric active-power clamp applied while the device reports an
    /// over-temperature condition (W, 0 disables the clamp).
    pub overtemperature_derate_w: i64,
}

impl Default for InverterConfig {
    fn default() -> Self {
        Self {
            id: "ess0".to_string(),
            enabled: true,
            read_only_mode: false,
            capacity_wh: 28_000,
            max_apparent_power_va: 40_000,
            allowed_charge_power_w: -12_000,
            allowed_discharge_power_w: 12_000,
            min_active_power_w: -10_000,
            max_active_power_w: 10_000,
            min_reactive_power_var: -10_000,
            max_reactive_power_var: 10_000,
            overtemperature_derate_w: 0,
        }
    }
}

/// DC charger parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargerConfig {
    /// Component identifier used in logs.
    pub id: String,
    /// Whether the charger participates in the cycle.
    pub enabled: bool,
    /// Rated DC input power (W, must be > 0).
    pub max_actual_power_w: u64,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            id: "charger0".to_string(),
            enabled: true,
            max_actual_power_w: 12_000,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"inverter.capacity_wh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} - {}", self.field, self.message)
    }
}

impl EssConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains
    /// unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.inverter.validate();
        errors.extend(self.charger.validate());
        errors
    }
}

impl InverterConfig {
    /// Validates the inverter section.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let inv = self;

        if inv.id.is_empty() {
            errors.push(ConfigError {
                field: "inverter.id".into(),
                message: "must not be empty".into(),
            });
        }
        if inv.capacity_wh == 0 {
            errors.push(ConfigError {
                field: "inverter.capacity_wh".into(),
                message: "must be > 0".into(),
            });
        }
        if inv.max_apparent_power_va == 0 {
            errors.push(ConfigError {
                field: "inverter.max_apparent_power_va".into(),
                message: "must be > 0".into(),
            });
        }
        if inv.allowed_charge_power_w > 0 {
            errors.push(ConfigError {
                field: "inverter.allowed_charge_power_w".into(),
                message: "must be <= 0 (charging is negative)".into(),
            });
        }
        if inv.allowed_discharge_power_w < 0 {
            errors.push(ConfigError {
                field: "inverter.allowed_discharge_power_w".into(),
                message: "must be >= 0".into(),
            });
        }
        if inv.min_active_power_w > inv.max_active_power_w {
            errors.push(ConfigError {
                field: "inverter.min_active_power_w".into(),
                message: "must be <= inverter.max_active_power_w".into(),
            });
        }
        if inv.min_reactive_power_var > inv.max_reactive_power_var {
            errors.push(ConfigError {
                field: "inverter.min_reactive_power_var".into(),
                message: "must be <= inverter.max_reactive_power_var".into(),
            });
        }
        if inv.overtemperature_derate_w < 0 {
            errors.push(ConfigError {
                field: "inverter.overtemperature_derate_w".into(),
                message: "must be >= 0".into(),
            });
        }

        errors
    }
}

impl ChargerConfig {
    /// Validates the charger section.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let chg = self;

        if chg.id.is_empty() {
            errors.push(ConfigError {
                field: "charger.id".into(),
                message: "must not be empty".into(),
            });
        }
        if chg.max_actual_power_w == 0 {
            errors.push(ConfigError {
                field: "charger.max_actual_power_w".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EssConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[inverter]
id = "ess1"
read_only_mode = true
capacity_wh = 14000
max_apparent_power_va = 20000

[charger]
id = "charger1"
max_actual_power_w = 6000
"#;
        let cfg = EssConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| &*c.inverter.id), Some("ess1"));
        assert_eq!(cfg.as_ref().map(|c| c.inverter.read_only_mode), Some(true));
        assert_eq!(cfg.as_ref().map(|c| c.charger.max_actual_power_w), Some(6000));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[inverter]
capacity_wh = 14000
"#;
        let cfg = EssConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.inverter.capacity_wh), Some(14_000));
        // everything else kept default
        assert_eq!(cfg.as_ref().map(|c| c.inverter.max_apparent_power_va), Some(40_000));
        assert_eq!(cfg.as_ref().map(|c| &*c.charger.id), Some("charger0"));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[inverter]
bogus_field = true
"#;
        let result = EssConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_zero_capacity() {
        let mut cfg = EssConfig::default();
        cfg.inverter.capacity_wh = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "inverter.capacity_wh"));
    }

    #[test]
    fn validation_catches_positive_charge_limit() {
        let mut cfg = EssConfig::default();
        cfg.inverter.allowed_charge_power_w = 5000;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "inverter.allowed_charge_power_w"));
    }

    #[test]
    fn validation_catches_inverted_active_bounds() {
        let mut cfg = EssConfig::default();
        cfg.inverter.min_active_power_w = 500;
        cfg.inverter.max_active_power_w = -500;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "inverter.min_active_power_w"));
    }

    #[test]
    fn validation_catches_negative_derate() {
        let mut cfg = EssConfig::default();
        cfg.inverter.overtemperature_derate_w = -1;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "inverter.overtemperature_derate_w")
        );
    }
}
