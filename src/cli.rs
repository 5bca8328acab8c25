use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bmc-sensors", version, about = "Shows sensors published on the BMC's D-Bus")]
#[command(long_about = "Shows all sensors of the specified type.
If the type is not specified shows all found sensors.")]
#[command(after_help = "EXAMPLES:
    bmc-sensors                           List every sensor
    bmc-sensors temperature               List temperature sensors only
    bmc-sensors -w cpu0,fan2 -i 5         Print cpu0 and fan2 every 5 seconds
    bmc-sensors -H root@bmc fan_tach      Read fan sensors of a remote BMC over ssh")]
pub struct Cli {
    /// Sensor type (category) to show, e.g. temperature or fan_tach
    #[arg(value_name = "SENSOR_TYPE", value_parser = parse_sensor_type)]
    pub sensor_type: Option<String>,

    /// Poll the named sensors and print one line per interval
    #[arg(short, long, value_name = "NAME[,NAME...]", value_delimiter = ',', num_args = 1)]
    pub watch: Vec<String>,

    /// Seconds between two polls in watch mode
    #[arg(short, long, value_name = "SECONDS", default_value_t = 1,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Operate on a remote host (over ssh)
    #[arg(short = 'H', long, value_name = "[USER@]HOST", env = "BMC_SENSORS_HOST")]
    pub host: Option<String>,

    /// busctl executable used to talk to D-Bus
    #[arg(long, value_name = "PATH", env = "BMC_SENSORS_BUSCTL", default_value = "busctl")]
    pub busctl: String,

    /// Never emphasize category banners with terminal escapes
    #[arg(long)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_sensor_type(s: &str) -> Result<String, String> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(s.to_string())
    } else {
        Err("Invalid sensor type is specified!".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("bmc-sensors").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.sensor_type, None);
        assert!(cli.watch.is_empty());
        assert_eq!(cli.interval, 1);
        assert!(!cli.no_color);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn sensor_type_is_validated() {
        assert_eq!(parse(&["fan_tach"]).unwrap().sensor_type.as_deref(), Some("fan_tach"));
        assert!(parse(&["temp/../x"]).is_err());
        assert!(parse(&["temp-1"]).is_err());
    }

    #[test]
    fn watch_list_keeps_order() {
        let cli = parse(&["--watch", "t2,f1,cpu0", "-i", "5"]).unwrap();
        assert_eq!(cli.watch, vec!["t2", "f1", "cpu0"]);
        assert_eq!(cli.interval, 5);
    }

    #[test]
    fn interval_must_be_positive() {
        assert!(parse(&["-w", "f1", "-i", "0"]).is_err());
        assert!(parse(&["-w", "f1", "-i", "-3"]).is_err());
        assert!(parse(&["-w", "f1", "-i", "soon"]).is_err());
    }

    #[test]
    fn largest_interval_is_accepted() {
        let cli = parse(&["-w", "f1", "-i", "18446744073709551615"]).unwrap();
        assert_eq!(cli.interval, u64::MAX);
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
    }
}
