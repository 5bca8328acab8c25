use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

use crate::path_order::compare_paths;

/// One raw property as delivered by the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// A numeric sensor field: either a mantissa to be scaled or a ready value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawNumber {
    Integer(i64),
    Float(f64),
}

/// Typed view of one sensor's property map. Built per fetch and dropped
/// after rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    pub value: Option<RawNumber>,
    pub scale: i64,
    pub unit: Option<String>,
    pub critical_low: Option<RawNumber>,
    pub critical_high: Option<RawNumber>,
    pub warning_low: Option<RawNumber>,
    pub warning_high: Option<RawNumber>,
    pub fatal_high: Option<RawNumber>,
    pub warning_alarm_low: bool,
    pub warning_alarm_high: bool,
    pub critical_alarm_low: bool,
    pub critical_alarm_high: bool,
    pub fatal_alarm_high: bool,
    pub functional: Option<bool>,
    pub available: Option<bool>,
}

impl SensorReading {
    /// Picks the known keys out of a property map. A key carrying an
    /// unexpected type is treated as absent.
    pub fn from_properties(props: &HashMap<String, PropertyValue>) -> Self {
        let number = |key: &str| match props.get(key) {
            Some(PropertyValue::Integer(v)) => Some(RawNumber::Integer(*v)),
            Some(PropertyValue::Float(v)) => Some(RawNumber::Float(*v)),
            Some(other) => {
                log::debug!("ignoring non-numeric {key}: {other:?}");
                None
            }
            None => None,
        };
        let flag = |key: &str| match props.get(key) {
            Some(PropertyValue::Bool(v)) => Some(*v),
            _ => None,
        };

        Self {
            value: number("Value"),
            scale: match props.get("Scale") {
                Some(PropertyValue::Integer(v)) => *v,
                _ => 0,
            },
            unit: match props.get("Unit") {
                Some(PropertyValue::Text(v)) => Some(v.clone()),
                _ => None,
            },
            critical_low: number("CriticalLow"),
            critical_high: number("CriticalHigh"),
            warning_low: number("WarningLow"),
            warning_high: number("WarningHigh"),
            fatal_high: number("FatalHigh"),
            warning_alarm_low: flag("WarningAlarmLow").unwrap_or(false),
            warning_alarm_high: flag("WarningAlarmHigh").unwrap_or(false),
            critical_alarm_low: flag("CriticalAlarmLow").unwrap_or(false),
            critical_alarm_high: flag("CriticalAlarmHigh").unwrap_or(false),
            fatal_alarm_high: flag("FatalAlarmHigh").unwrap_or(false),
            functional: flag("Functional"),
            available: flag("Available"),
        }
    }
}

/// Slash-delimited object path of a sensor, e.g.
/// `/xyz/openbmc_project/sensors/temperature/cpu0`.
///
/// Ordered with [`compare_paths`]; paths the comparator considers equal
/// (`fan07` and `fan7`) fall back to byte order so distinct paths never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SensorPath(String);

impl SensorPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn instance(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Segment between the last two slashes.
    pub fn category(&self) -> &str {
        let mut segments = self.0.rsplit('/');
        segments.next();
        segments.next().unwrap_or("")
    }
}

impl Ord for SensorPath {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_paths(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SensorPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for SensorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sensor path together with one bus name that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEndpoint {
    pub path: SensorPath,
    pub provider: String,
}

/// Discovery result: every sensor path with the providers exposing it,
/// iterated in natural path order.
pub type SensorMap = BTreeMap<SensorPath, Vec<String>>;

/// Flattens a discovery result into endpoints, one per (path, provider).
pub fn endpoints(sensors: &SensorMap) -> impl Iterator<Item = SensorEndpoint> + '_ {
    sensors.iter().flat_map(|(path, providers)| {
        providers.iter().map(move |provider| SensorEndpoint {
            path: path.clone(),
            provider: provider.clone(),
        })
    })
}
