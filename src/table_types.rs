use tabled::Tabled;

use crate::sensor_types::SensorPath;

/// One rendered sensor line. Column titles come from the `Tabled` derive.
#[derive(Tabled, Debug, Clone, PartialEq)]
pub struct DisplayRow {
    #[tabled(skip)]
    pub path: SensorPath,
    #[tabled(rename = "Sensor")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
    #[tabled(rename = "LoCrit")]
    pub critical_low: String,
    #[tabled(rename = "LoWarn")]
    pub warning_low: String,
    #[tabled(rename = "HiWarn")]
    pub warning_high: String,
    #[tabled(rename = "HiCrit")]
    pub critical_high: String,
    #[tabled(rename = "Fatal")]
    pub fatal_high: String,
}
