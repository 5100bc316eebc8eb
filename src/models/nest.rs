//! Models for the Nest developer API (`devices`, `structures`).
//!
//! Scope: types only, no client code.
//!
//! Notes
//! - Identifiers are required; every other field is optional because the API
//!   omits fields a device does not support.
//! - Fields not modeled here are kept verbatim in `extra`.
//! - Timestamps use `chrono` (`DateTime<Utc>`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereId(pub String);

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        DeviceId(value.to_string())
    }
}

// =====================
// Enums
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HvacMode {
    Heat,
    Cool,
    HeatCool,
    Eco,
    Off,
}

impl HvacMode {
    /// Heat + Cool keeps independent high and low targets.
    pub fn is_dual_setpoint(self) -> bool {
        matches!(self, HvacMode::HeatCool)
    }
}

impl core::fmt::Display for HvacMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat-cool",
            HvacMode::Eco => "eco",
            HvacMode::Off => "off",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryHealth {
    Ok,
    Replace,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Ok,
    Warning,
    Emergency,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiColorState {
    Gray,
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Away {
    Home,
    Away,
    AutoAway,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureScale {
    C,
    F,
}

impl TemperatureScale {
    /// Suffix used in `target_temperature_*` field names.
    pub fn suffix(self) -> &'static str {
        match self {
            TemperatureScale::C => "c",
            TemperatureScale::F => "f",
        }
    }
}

// =====================
// Devices
// =====================

/// Response of `GET devices.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    #[serde(default)]
    pub thermostats: BTreeMap<String, Thermostat>,
    #[serde(default)]
    pub smoke_co_alarms: BTreeMap<String, SmokeCoAlarm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thermostat {
    pub device_id: DeviceId,
    pub hvac_mode: HvacMode,
    #[serde(default)]
    pub is_using_emergency_heat: bool,

    pub name: Option<String>,
    pub name_long: Option<String>,
    pub locale: Option<String>,
    pub software_version: Option<String>,
    pub structure_id: Option<StructureId>,
    pub where_id: Option<WhereId>,
    pub is_online: Option<bool>,
    pub last_connection: Option<DateTime<Utc>>,

    pub can_cool: Option<bool>,
    pub can_heat: Option<bool>,
    pub has_fan: Option<bool>,
    pub has_leaf: Option<bool>,
    pub fan_timer_active: Option<bool>,
    pub temperature_scale: Option<TemperatureScale>,

    pub target_temperature_c: Option<f64>,
    pub target_temperature_f: Option<f64>,
    pub target_temperature_high_c: Option<f64>,
    pub target_temperature_high_f: Option<f64>,
    pub target_temperature_low_c: Option<f64>,
    pub target_temperature_low_f: Option<f64>,
    pub away_temperature_high_c: Option<f64>,
    pub away_temperature_high_f: Option<f64>,
    pub away_temperature_low_c: Option<f64>,
    pub away_temperature_low_f: Option<f64>,
    pub ambient_temperature_c: Option<f64>,
    pub ambient_temperature_f: Option<f64>,
    pub humidity: Option<f64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokeCoAlarm {
    pub device_id: DeviceId,

    pub name: Option<String>,
    pub name_long: Option<String>,
    pub locale: Option<String>,
    pub software_version: Option<String>,
    pub structure_id: Option<StructureId>,
    pub where_id: Option<WhereId>,
    pub is_online: Option<bool>,
    pub last_connection: Option<DateTime<Utc>>,

    pub battery_health: Option<BatteryHealth>,
    pub co_alarm_state: Option<AlarmState>,
    pub smoke_alarm_state: Option<AlarmState>,
    pub ui_color_state: Option<UiColorState>,
    pub is_manual_test_active: Option<bool>,
    pub last_manual_test_time: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =====================
// Structures
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub structure_id: StructureId,
    pub name: Option<String>,
    pub away: Option<Away>,
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub time_zone: Option<String>,
    #[serde(default)]
    pub thermostats: Vec<DeviceId>,
    #[serde(default)]
    pub smoke_co_alarms: Vec<DeviceId>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture present")
    }

    #[test]
    fn parses_devices_fixture() {
        let devices: Devices = serde_json::from_str(&load_fixture("devices.json")).expect("parse devices");

        let living = devices.thermostats.get("peyiJNo0IldT2YlIVtYaGQ").expect("thermostat present");
        assert_eq!(living.device_id, DeviceId::from("peyiJNo0IldT2YlIVtYaGQ"));
        assert_eq!(living.hvac_mode, HvacMode::HeatCool);
        assert!(!living.is_using_emergency_heat);
        assert_eq!(living.target_temperature_high_c, Some(24.0));
        assert_eq!(living.temperature_scale, Some(TemperatureScale::C));
        // unmodeled fields survive in the passthrough map
        assert_eq!(living.extra.get("hvac_state"), Some(&Value::from("heating")));

        let alarm = devices.smoke_co_alarms.get("RTMTKxsQTCxzVcsySOHPxKoF4OyCifrs").expect("alarm present");
        assert_eq!(alarm.battery_health, Some(BatteryHealth::Ok));
        assert_eq!(alarm.co_alarm_state, Some(AlarmState::Ok));
        assert_eq!(alarm.ui_color_state, Some(UiColorState::Green));
    }

    #[test]
    fn missing_device_collections_default_to_empty() {
        let devices: Devices = serde_json::from_str("{}").expect("parse empty");
        assert!(devices.thermostats.is_empty());
        assert!(devices.smoke_co_alarms.is_empty());
    }

    #[test]
    fn parses_structures_fixture() {
        let structures: BTreeMap<String, Structure> =
            serde_json::from_str(&load_fixture("structures.json")).expect("parse structures");
        let home = structures.values().next().expect("one structure");
        assert_eq!(home.away, Some(Away::AutoAway));
        assert_eq!(home.thermostats, vec![DeviceId::from("peyiJNo0IldT2YlIVtYaGQ")]);
    }

    #[test]
    fn hvac_mode_wire_names() {
        let mode: HvacMode = serde_json::from_str("\"heat-cool\"").expect("parse mode");
        assert_eq!(mode, HvacMode::HeatCool);
        assert!(mode.is_dual_setpoint());
        assert!(!HvacMode::Heat.is_dual_setpoint());
        assert_eq!(HvacMode::HeatCool.to_string(), "heat-cool");
    }
}
