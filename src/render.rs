use std::io::{self, Write};

use tabled::builder::Builder;
use tabled::settings::object::{Columns, Segment};
use tabled::settings::{Alignment, Modify, Padding, Style, Width};
use tabled::Tabled;

use crate::bus::SensorBus;
use crate::error::Result;
use crate::normalize::normalize;
use crate::sensor_types::{endpoints, SensorMap};
use crate::table_types::DisplayRow;

pub const NAME_WIDTH: usize = 16;
pub const STATUS_WIDTH: usize = 8;
pub const NUMBER_WIDTH: usize = 8;
pub const UNIT_WIDTH: usize = 4;

// Same order as the fields of `DisplayRow`.
const WIDTHS: [usize; DisplayRow::LENGTH] = [
    NAME_WIDTH,
    STATUS_WIDTH,
    NUMBER_WIDTH,
    UNIT_WIDTH,
    NUMBER_WIDTH,
    NUMBER_WIDTH,
    NUMBER_WIDTH,
    NUMBER_WIDTH,
    NUMBER_WIDTH,
];
const VALUE_COLUMN: usize = 2;
const FIRST_THRESHOLD_COLUMN: usize = 4;

/// Writes sensor rows grouped by category. A new group starts with a
/// banner and the column header whenever the category changes.
pub struct TableRenderer<W: Write> {
    out: W,
    color: bool,
    last_category: Option<String>,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color, last_category: None }
    }

    pub fn render(&mut self, row: &DisplayRow) -> io::Result<()> {
        let category = row.path.category();
        if self.last_category.as_deref() != Some(category) {
            self.start_group(category)?;
            self.last_category = Some(category.to_string());
        }

        let line = format_line(row.fields());
        self.out.write_all(line.as_bytes())?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn start_group(&mut self, category: &str) -> io::Result<()> {
        let mut block = String::new();
        if self.last_category.is_some() {
            block.push('\n');
        }
        if self.color {
            block.push_str(&format!("\x1b[1m{category}\x1b[0m\n"));
        } else {
            block.push_str(&format!("{category}\n"));
        }
        block.push_str(&format_line(DisplayRow::headers()));
        block.push('\n');
        self.out.write_all(block.as_bytes())
    }
}

/// Lays out one line as a single-row blank-bordered table: columns are
/// truncated and then fixed to `WIDTHS`, numbers right-aligned.
fn format_line<I>(cells: I) -> String
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut builder = Builder::default();
    builder.push_record(cells);
    let mut table = builder.build();
    table
        .with(Style::blank())
        .with(Modify::new(Segment::all()).with(Padding::zero()));
    for (column, width) in WIDTHS.into_iter().enumerate() {
        table.with(Modify::new(Columns::single(column)).with(Width::truncate(width)));
    }
    table
        .with(Modify::new(Columns::single(VALUE_COLUMN)).with(Alignment::right()))
        .with(Modify::new(Columns::new(FIRST_THRESHOLD_COLUMN..)).with(Alignment::right()))
        .with(Width::list(WIDTHS));

    let mut line = table.to_string().trim().to_string();
    line.push('\n');
    line
}

/// Fetches and prints every discovered sensor in path order. The first
/// failing fetch aborts the listing.
pub fn list_sensors<B, W>(bus: &B, sensors: &SensorMap, renderer: &mut TableRenderer<W>) -> Result<()>
where
    B: SensorBus + ?Sized,
    W: Write,
{
    for endpoint in endpoints(sensors) {
        let reading = bus.fetch(&endpoint)?;
        renderer.render(&normalize(&endpoint.path, &reading))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockSensorBus;
    use crate::error::Error;
    use crate::sensor_types::{RawNumber, SensorPath, SensorReading};

    fn row(path: &str, value: &str) -> DisplayRow {
        let reading = SensorReading {
            value: Some(RawNumber::Float(value.parse().unwrap())),
            unit: Some("xyz.openbmc_project.Sensor.Value.Unit.DegreesC".into()),
            ..Default::default()
        };
        normalize(&SensorPath::new(path), &reading)
    }

    fn rendered(rows: &[DisplayRow]) -> String {
        let mut renderer = TableRenderer::new(Vec::new(), false);
        for r in rows {
            renderer.render(r).unwrap();
        }
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn banner_on_every_category_change() {
        let out = rendered(&[
            row("/s/temperature/t1", "20"),
            row("/s/temperature/t2", "21"),
            row("/s/fan_tach/f1", "3000"),
        ]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "temperature");
        assert!(lines[1].starts_with("Sensor"));
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("t1 "));
        assert!(lines[4].starts_with("t2 "));
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "fan_tach");
        assert!(lines[7].starts_with("Sensor"));
        assert_eq!(lines[8], "");
        assert!(lines[9].starts_with("f1 "));
        assert_eq!(lines.len(), 10);

        assert_eq!(out.matches("Sensor").count(), 2);
        assert!(!out.starts_with('\n'));
    }

    #[test]
    fn columns_line_up() {
        let out = rendered(&[row("/s/temperature/t1", "20"), row("/s/temperature/t2", "1500")]);
        let lines: Vec<&str> = out.lines().collect();
        let value_end = NAME_WIDTH + 1 + STATUS_WIDTH + 1 + NUMBER_WIDTH;

        let t1: Vec<char> = lines[3].chars().collect();
        let t2: Vec<char> = lines[4].chars().collect();
        let value = |line: &[char]| line[value_end - NUMBER_WIDTH..value_end].iter().collect::<String>();
        assert_eq!(value(&t1), "  20.000");
        assert_eq!(value(&t2), "    1500");
        assert_eq!(t1.len(), t2.len());
        assert_eq!(t1[value_end + 1..value_end + 3].iter().collect::<String>(), "\u{00B0}C");
    }

    #[test]
    fn header_has_fixed_column_widths() {
        let header = format_line(DisplayRow::headers());
        let expected = [
            "Sensor          ",
            "Status  ",
            "   Value",
            "Unit",
            "  LoCrit",
            "  LoWarn",
            "  HiWarn",
            "  HiCrit",
            "   Fatal",
        ]
        .join(" ");
        assert_eq!(header, format!("{expected}\n"));
    }

    #[test]
    fn overlong_number_is_cut_to_column_width() {
        let line = format_line(["n", "OK", "123456789012", "V", "1", "2", "3", "4", "5"]);
        assert!(line.starts_with(&format!("n{} OK       12345678 V   ", " ".repeat(NAME_WIDTH - 1))));
        assert!(line.ends_with("       5\n"));
    }

    #[test]
    fn long_names_are_truncated() {
        let out = rendered(&[row("/s/temperature/a_really_long_sensor_name", "1")]);
        let line = out.lines().nth(3).unwrap();
        assert!(line.starts_with("a_really_long_se OK"));
    }

    #[test]
    fn colored_banner_is_bold() {
        let mut renderer = TableRenderer::new(Vec::new(), true);
        renderer.render(&row("/s/power/p0", "100")).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[1mpower\x1b[0m\n"));
    }

    #[test]
    fn listing_fetches_in_path_order() {
        let mut sensors = SensorMap::new();
        sensors.insert(SensorPath::new("/s/fan_tach/fan10"), vec!["svc".into()]);
        sensors.insert(SensorPath::new("/s/fan_tach/fan2"), vec!["svc".into()]);

        let mut bus = MockSensorBus::new();
        let mut seq = mockall::Sequence::new();
        for name in ["fan2", "fan10"] {
            bus.expect_fetch()
                .withf(move |e| e.path.instance() == name)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| {
                    Ok(SensorReading { value: Some(RawNumber::Integer(4000)), ..Default::default() })
                });
        }

        let mut renderer = TableRenderer::new(Vec::new(), false);
        list_sensors(&bus, &sensors, &mut renderer).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        let rows: Vec<&str> = out.lines().skip(3).collect();
        assert!(rows[0].starts_with("fan2 "));
        assert!(rows[1].starts_with("fan10 "));
    }

    #[test]
    fn listing_stops_at_first_failed_fetch() {
        let mut sensors = SensorMap::new();
        sensors.insert(SensorPath::new("/s/voltage/v1"), vec!["svc".into()]);
        sensors.insert(SensorPath::new("/s/voltage/v2"), vec!["svc".into()]);
        sensors.insert(SensorPath::new("/s/voltage/v3"), vec!["svc".into()]);

        let mut bus = MockSensorBus::new();
        bus.expect_fetch()
            .withf(|e| e.path.instance() == "v1")
            .times(1)
            .returning(|_| Ok(SensorReading::default()));
        bus.expect_fetch()
            .withf(|e| e.path.instance() == "v2")
            .times(1)
            .returning(|_| Err(Error::Transport("Get properties for v2 failed".into())));
        bus.expect_fetch().withf(|e| e.path.instance() == "v3").times(0);

        let mut renderer = TableRenderer::new(Vec::new(), false);
        let err = list_sensors(&bus, &sensors, &mut renderer).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("v1 "));
        assert!(!out.contains("v2 "));
    }
}
