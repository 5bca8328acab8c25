use std::collections::HashMap;
use std::io;
use std::process::Command;

use log::{debug, info, trace};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::sensor_types::{PropertyValue, SensorEndpoint, SensorMap, SensorPath, SensorReading};

pub const MAPPER_BUS: &str = "xyz.openbmc_project.ObjectMapper";
pub const MAPPER_PATH: &str = "/xyz/openbmc_project/object_mapper";
pub const MAPPER_IFACE: &str = "xyz.openbmc_project.ObjectMapper";
pub const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
pub const SENSORS_PATH: &str = "/xyz/openbmc_project/sensors";
pub const SENSOR_VALUE_IFACE: &str = "xyz.openbmc_project.Sensor.Value";

// Replies the mapper gives for a subtree that does not exist.
const NOT_FOUND_MARKERS: &[&str] = &[
    "ResourceNotFound",
    "resource is not found",
    "FileNotFound",
    "path or object not found",
];

/// Access to the sensor objects on the bus.
#[cfg_attr(test, mockall::automock)]
pub trait SensorBus {
    /// All objects below `root` that implement `interface`.
    fn discover(&self, root: &str, interface: &str) -> Result<SensorMap>;

    /// Every property of one sensor object, across all of its interfaces.
    fn fetch(&self, endpoint: &SensorEndpoint) -> Result<SensorReading>;
}

/// [`SensorBus`] backed by the `busctl` tool, locally or on a remote host
/// reached over ssh.
pub struct Busctl {
    program: String,
    host: Option<String>,
}

enum CallError {
    Spawn(io::Error),
    Failed(String),
    Malformed(String),
}

impl Busctl {
    pub fn new(program: impl Into<String>, host: Option<String>) -> Self {
        Self { program: program.into(), host }
    }

    fn call(&self, service: &str, path: &str, iface: &str, method: &str, args: &[&str]) -> std::result::Result<Value, CallError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--json=short");
        if let Some(host) = &self.host {
            cmd.arg("-H").arg(host);
        }
        cmd.args(["call", service, path, iface, method]).args(args);
        debug!("{:?}", cmd);

        let output = cmd.output().map_err(CallError::Spawn)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CallError::Failed(stderr));
        }

        let reply: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| CallError::Malformed(e.to_string()))?;
        match reply.get("data").and_then(Value::as_array).and_then(|d| d.first()) {
            Some(data) => Ok(data.clone()),
            None => Err(CallError::Malformed(format!("unexpected reply: {reply}"))),
        }
    }

    fn transport_error(&self, what: &str, err: CallError) -> Error {
        match err {
            CallError::Spawn(e) => Error::Transport(format!("Can't run {}: {e}", self.program)),
            CallError::Failed(msg) => Error::Transport(format!("{what} failed: {msg}")),
            CallError::Malformed(msg) => Error::Transport(format!("{what}: malformed reply: {msg}")),
        }
    }
}

impl SensorBus for Busctl {
    fn discover(&self, root: &str, interface: &str) -> Result<SensorMap> {
        let reply = self.call(MAPPER_BUS, MAPPER_PATH, MAPPER_IFACE, "GetSubTree", &["sias", root, "0", "1", interface]);
        let data = match reply {
            Ok(data) => data,
            Err(CallError::Failed(msg)) if NOT_FOUND_MARKERS.iter().any(|m| msg.contains(m)) => {
                debug!("GetSubTree({root}): {msg}");
                return Err(Error::DiscoveryEmpty(root.to_string()));
            }
            Err(e) => return Err(self.transport_error("Call GetSubTree()", e)),
        };

        let sensors = parse_subtree(&data)?;
        if sensors.is_empty() {
            return Err(Error::DiscoveryEmpty(root.to_string()));
        }
        info!("Discovered {} sensors under {}", sensors.len(), root);
        Ok(sensors)
    }

    fn fetch(&self, endpoint: &SensorEndpoint) -> Result<SensorReading> {
        let path = endpoint.path.as_str();
        let data = self
            .call(&endpoint.provider, path, PROPERTIES_IFACE, "GetAll", &["s", ""])
            .map_err(|e| self.transport_error(&format!("Get properties for {path}"), e))?;
        Ok(SensorReading::from_properties(&parse_properties(&data)?))
    }
}

/// Parses a `GetSubTree` reply, `a{sa{sas}}`: path -> service -> interfaces.
pub fn parse_subtree(data: &Value) -> Result<SensorMap> {
    let objects = data
        .as_object()
        .ok_or_else(|| Error::Transport(format!("GetSubTree: expected a dictionary, got {data}")))?;

    let mut sensors = SensorMap::new();
    for (path, services) in objects {
        let services = services
            .as_object()
            .ok_or_else(|| Error::Transport(format!("GetSubTree: bad entry for {path}")))?;
        sensors.insert(SensorPath::new(path.as_str()), services.keys().cloned().collect());
    }
    Ok(sensors)
}

/// Parses a `GetAll` reply, `a{sv}`, keeping the variant types we understand.
pub fn parse_properties(data: &Value) -> Result<HashMap<String, PropertyValue>> {
    let entries = data
        .as_object()
        .ok_or_else(|| Error::Transport(format!("GetAll: expected a dictionary, got {data}")))?;

    let mut props = HashMap::with_capacity(entries.len());
    for (name, variant) in entries {
        match parse_variant(variant) {
            Some(value) => {
                props.insert(name.clone(), value);
            }
            None => trace!("skipping property {name}: {variant}"),
        }
    }
    Ok(props)
}

fn parse_variant(variant: &Value) -> Option<PropertyValue> {
    let signature = variant.get("type")?.as_str()?;
    let data = variant.get("data")?;
    match signature {
        "y" | "n" | "q" | "i" | "u" | "x" => data.as_i64().map(PropertyValue::Integer),
        "t" => data.as_u64().map(|v| PropertyValue::Integer(v.min(i64::MAX as u64) as i64)),
        "d" => data.as_f64().map(PropertyValue::Float),
        "b" => data.as_bool().map(PropertyValue::Bool),
        "s" | "o" | "g" => data.as_str().map(|s| PropertyValue::Text(s.to_string())),
        _ => None,
    }
}
