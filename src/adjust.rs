//! Client-side checks for target temperature writes.
//!
//! The rules run against the thermostat state fetched in the same call, never
//! a cached copy, so a mode change between calls is always seen.

use crate::models::nest::{HvacMode, TemperatureScale, Thermostat};
use serde_json::{Map, Number, Value};

/// Which target of a Heat + Cool thermostat to move.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Setpoint {
    High,
    Low,
}

impl Setpoint {
    fn prefix(self) -> &'static str {
        match self {
            Setpoint::High => "high_",
            Setpoint::Low => "low_",
        }
    }
}

impl core::fmt::Display for Setpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Setpoint::High => f.write_str("high"),
            Setpoint::Low => f.write_str("low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureAdjustment {
    pub degrees: f64,
    pub scale: TemperatureScale,
    /// Only meaningful in Heat + Cool mode.
    pub setpoint: Option<Setpoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmergencyHeat,
    SetpointRequired { mode: HvacMode },
    SetpointNotAllowed { mode: HvacMode, setpoint: Setpoint },
    NonFiniteDegrees,
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Rejection::EmergencyHeat => {
                write!(f, "can't adjust target temperature while using emergency heat")
            }
            Rejection::SetpointRequired { mode } => write!(
                f,
                "can't adjust target temperature while in {} mode without choosing the high or low setpoint",
                mode
            ),
            Rejection::SetpointNotAllowed { mode, setpoint } => write!(
                f,
                "can't adjust the {} setpoint while in {} mode; omit the setpoint instead",
                setpoint, mode
            ),
            Rejection::NonFiniteDegrees => write!(f, "target temperature must be a finite number"),
        }
    }
}

impl std::error::Error for Rejection {}

impl TemperatureAdjustment {
    pub fn new(degrees: f64, scale: TemperatureScale, setpoint: Option<Setpoint>) -> Self {
        TemperatureAdjustment {
            degrees,
            scale,
            setpoint,
        }
    }

    /// Argument check that needs no device state.
    pub fn check_degrees(&self) -> Result<(), Rejection> {
        if self.degrees.is_finite() {
            Ok(())
        } else {
            Err(Rejection::NonFiniteDegrees)
        }
    }

    /// First matching rule wins: emergency heat, then setpoint/mode agreement.
    pub fn validate(&self, thermostat: &Thermostat) -> Result<(), Rejection> {
        let mode = thermostat.hvac_mode;
        if thermostat.is_using_emergency_heat {
            return Err(Rejection::EmergencyHeat);
        }
        match (mode.is_dual_setpoint(), self.setpoint) {
            (true, None) => Err(Rejection::SetpointRequired { mode }),
            (false, Some(setpoint)) => Err(Rejection::SetpointNotAllowed { mode, setpoint }),
            _ => Ok(()),
        }
    }

    /// `target_temperature_[high_|low_]{c|f}`
    pub fn field_name(&self) -> String {
        let prefix = self.setpoint.map(Setpoint::prefix).unwrap_or("");
        format!("target_temperature_{}{}", prefix, self.scale.suffix())
    }

    /// Single-key write body. Whole degrees are sent as JSON integers.
    pub fn body(&self) -> Result<Value, Rejection> {
        self.check_degrees()?;
        let number = if self.degrees.fract() == 0.0 && self.degrees.abs() < i64::MAX as f64 {
            Number::from(self.degrees as i64)
        } else {
            Number::from_f64(self.degrees).ok_or(Rejection::NonFiniteDegrees)?
        };
        let mut body = Map::new();
        body.insert(self.field_name(), Value::Number(number));
        Ok(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thermostat(mode: HvacMode, emergency: bool) -> Thermostat {
        let mut t: Thermostat = serde_json::from_value(json!({
            "device_id": "peyiJNo0IldT2YlIVtYaGQ",
            "hvac_mode": "off",
        }))
        .expect("minimal thermostat");
        t.hvac_mode = mode;
        t.is_using_emergency_heat = emergency;
        t
    }

    #[test]
    fn emergency_heat_wins_over_everything() {
        for mode in [HvacMode::Heat, HvacMode::Cool, HvacMode::HeatCool, HvacMode::Off] {
            for setpoint in [None, Some(Setpoint::High), Some(Setpoint::Low)] {
                let adj = TemperatureAdjustment::new(20.0, TemperatureScale::C, setpoint);
                assert_eq!(adj.validate(&thermostat(mode, true)), Err(Rejection::EmergencyHeat));
            }
        }
    }

    #[test]
    fn heat_cool_requires_setpoint() {
        let adj = TemperatureAdjustment::new(21.0, TemperatureScale::C, None);
        assert_eq!(
            adj.validate(&thermostat(HvacMode::HeatCool, false)),
            Err(Rejection::SetpointRequired {
                mode: HvacMode::HeatCool
            })
        );
    }

    #[test]
    fn single_setpoint_modes_reject_high_low() {
        let adj = TemperatureAdjustment::new(21.0, TemperatureScale::C, Some(Setpoint::High));
        assert_eq!(
            adj.validate(&thermostat(HvacMode::Heat, false)),
            Err(Rejection::SetpointNotAllowed {
                mode: HvacMode::Heat,
                setpoint: Setpoint::High
            })
        );
        let adj = TemperatureAdjustment::new(21.0, TemperatureScale::C, Some(Setpoint::Low));
        assert!(adj.validate(&thermostat(HvacMode::Eco, false)).is_err());
    }

    #[test]
    fn accepted_combinations() {
        let cool = TemperatureAdjustment::new(72.0, TemperatureScale::F, None);
        assert_eq!(cool.validate(&thermostat(HvacMode::Cool, false)), Ok(()));
        let high = TemperatureAdjustment::new(21.0, TemperatureScale::C, Some(Setpoint::High));
        assert_eq!(high.validate(&thermostat(HvacMode::HeatCool, false)), Ok(()));
    }

    #[test]
    fn field_names() {
        let cases = [
            (None, TemperatureScale::F, "target_temperature_f"),
            (None, TemperatureScale::C, "target_temperature_c"),
            (Some(Setpoint::High), TemperatureScale::C, "target_temperature_high_c"),
            (Some(Setpoint::Low), TemperatureScale::F, "target_temperature_low_f"),
        ];
        for (setpoint, scale, expected) in cases {
            assert_eq!(TemperatureAdjustment::new(0.0, scale, setpoint).field_name(), expected);
        }
    }

    #[test]
    fn body_encodes_whole_degrees_as_integers() {
        let body = TemperatureAdjustment::new(72.0, TemperatureScale::F, None).body().unwrap();
        assert_eq!(body.to_string(), r#"{"target_temperature_f":72}"#);

        let body = TemperatureAdjustment::new(21.5, TemperatureScale::C, Some(Setpoint::Low))
            .body()
            .unwrap();
        assert_eq!(body, json!({"target_temperature_low_c": 21.5}));
    }

    #[test]
    fn non_finite_degrees_are_rejected() {
        let adj = TemperatureAdjustment::new(f64::NAN, TemperatureScale::C, None);
        assert_eq!(adj.check_degrees(), Err(Rejection::NonFiniteDegrees));
        assert_eq!(adj.body(), Err(Rejection::NonFiniteDegrees));
    }
}
