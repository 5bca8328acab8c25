use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use log::{debug, info};
use parking_lot::{Condvar, Mutex};

use crate::bus::SensorBus;
use crate::error::{Error, Result};
use crate::normalize::format_value;
use crate::sensor_types::{endpoints, SensorEndpoint, SensorMap};

/// Shared flag that ends a polling loop, including one asleep between ticks.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (stopped, cvar) = &*self.inner;
        *stopped.lock() = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Blocks for `timeout` or until stopped. Returns true if stopped.
    /// A timeout too large to represent as a deadline waits for `stop` alone.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let (stopped, cvar) = &*self.inner;
        let mut stopped = stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if cvar.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                None => cvar.wait(&mut stopped),
            }
        }
        *stopped
    }
}

/// Sensors picked by name for periodic sampling, in the order they were asked for.
#[derive(Debug)]
pub struct WatchSession {
    endpoints: Vec<SensorEndpoint>,
    interval: Duration,
}

impl WatchSession {
    /// Matches each name against the last segment of the discovered paths.
    /// A name may match several endpoints; all are kept in path order.
    pub fn resolve(names: &[String], sensors: &SensorMap, interval: Duration) -> Result<Self> {
        let mut resolved = Vec::new();
        for name in names {
            let before = resolved.len();
            resolved.extend(endpoints(sensors).filter(|e| e.path.instance() == name.as_str()));
            if resolved.len() == before {
                return Err(Error::UnresolvedSensor(name.clone()));
            }
        }
        debug!("watch session: {:?}", resolved);
        Ok(Self { endpoints: resolved, interval })
    }

    pub fn endpoints(&self) -> &[SensorEndpoint] {
        &self.endpoints
    }

    /// Prints one tab-separated line of values per tick until `stop` fires
    /// or a fetch fails.
    pub fn run<B, W>(&self, bus: &B, out: &mut W, stop: &StopSignal) -> Result<()>
    where
        B: SensorBus + ?Sized,
        W: Write,
    {
        info!("Watching {} sensors every {:?}", self.endpoints().len(), self.interval);
        while !stop.is_stopped() {
            let mut line = humantime::format_rfc3339_seconds(SystemTime::now()).to_string();
            for endpoint in &self.endpoints {
                let reading = bus.fetch(endpoint)?;
                line.push('\t');
                line.push_str(&format_value(&reading));
            }
            line.push('\n');
            out.write_all(line.as_bytes())?;
            out.flush()?;

            if stop.wait(self.interval) {
                break;
            }
        }
        info!("Watch stopped");
        Ok(())
    }
}

/// Resolves `names` and polls them. Nothing is fetched if a name is unknown.
pub fn watch<B, W>(
    bus: &B,
    names: &[String],
    interval: Duration,
    sensors: &SensorMap,
    out: &mut W,
    stop: &StopSignal,
) -> Result<()>
where
    B: SensorBus + ?Sized,
    W: Write,
{
    WatchSession::resolve(names, sensors, interval)?.run(bus, out, stop)
}
