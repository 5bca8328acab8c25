//! Turns a raw [`SensorReading`] into display strings.

use crate::sensor_types::{RawNumber, SensorPath, SensorReading};
use crate::table_types::DisplayRow;

/// Placeholder for any numeric field that cannot be shown.
pub const UNAVAILABLE: &str = "N/A";

/// Health classification, in decreasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotAvailable,
    Fail,
    Fatal,
    Critical,
    Warning,
    Ok,
}

impl Status {
    pub fn of(reading: &SensorReading) -> Self {
        if reading.available == Some(false) {
            Status::NotAvailable
        } else if reading.functional == Some(false) {
            Status::Fail
        } else if reading.fatal_alarm_high {
            Status::Fatal
        } else if reading.critical_alarm_low || reading.critical_alarm_high {
            Status::Critical
        } else if reading.warning_alarm_low || reading.warning_alarm_high {
            Status::Warning
        } else {
            Status::Ok
        }
    }

    /// False when the sensor itself reports it cannot produce a value.
    /// Alarm states still carry a meaningful reading.
    pub fn has_value(self) -> bool {
        !matches!(self, Status::NotAvailable | Status::Fail)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::NotAvailable => "N/A",
            Status::Fail => "FAIL",
            Status::Fatal => "Fatal",
            Status::Critical => "Critical",
            Status::Warning => "Warning",
            Status::Ok => "OK",
        }
    }
}

/// Physical value of a raw number: floats are taken as is, integers are
/// multiplied by `10^scale`.
pub fn scaled(raw: RawNumber, scale: i64) -> f64 {
    match raw {
        RawNumber::Float(v) => v,
        RawNumber::Integer(mantissa) => {
            let exponent = scale.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            mantissa as f64 * 10f64.powi(exponent)
        }
    }
}

/// Three decimals below 1000, a rounded integer from there on.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        UNAVAILABLE.to_string()
    } else if value.abs() < 1000.0 {
        let text = format!("{value:.3}");
        // Tiny negatives round to zero; print it unsigned.
        if text == "-0.000" {
            "0.000".to_string()
        } else {
            text
        }
    } else {
        format!("{:.0}", value.round())
    }
}

pub fn format_field(raw: Option<RawNumber>, scale: i64) -> String {
    match raw {
        Some(raw) => format_number(scaled(raw, scale)),
        None => UNAVAILABLE.to_string(),
    }
}

/// The `Value` column, suppressed when the sensor is unavailable or failed.
pub fn format_value(reading: &SensorReading) -> String {
    if Status::of(reading).has_value() {
        format_field(reading.value, reading.scale)
    } else {
        UNAVAILABLE.to_string()
    }
}

const UNIT_NAMES: &[(&str, &str)] = &[
    ("Volts", "V"),
    ("DegreesC", "\u{00B0}C"),
    ("Amperes", "A"),
    ("RPMS", "RPM"),
    ("Watts", "W"),
    ("Joules", "J"),
    ("Meters", "m"),
    ("Percent", "%"),
    ("CFM", "CFM"),
    ("Pascals", "Pa"),
];

/// Short unit name for a namespaced unit such as
/// `xyz.openbmc_project.Sensor.Value.Unit.Volts`.
pub fn unit_shorthand(unit: Option<&str>) -> String {
    let Some(unit) = unit else {
        return String::new();
    };
    let token = unit.rsplit('.').next().unwrap_or(unit);
    UNIT_NAMES
        .iter()
        .find(|(name, _)| *name == token)
        .map_or(token, |&(_, short)| short)
        .to_string()
}

pub fn normalize(path: &SensorPath, reading: &SensorReading) -> DisplayRow {
    let scale = reading.scale;
    DisplayRow {
        path: path.clone(),
        name: path.instance().to_string(),
        status: Status::of(reading).label().to_string(),
        value: format_value(reading),
        unit: unit_shorthand(reading.unit.as_deref()),
        critical_low: format_field(reading.critical_low, scale),
        warning_low: format_field(reading.warning_low, scale),
        warning_high: format_field(reading.warning_high, scale),
        critical_high: format_field(reading.critical_high, scale),
        fatal_high: format_field(reading.fatal_high, scale),
    }
}
