use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use crate::error::MapError;
use crate::layer::LatLng;

/// One entry of the device list.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSummary {
    /// Kept as raw JSON; validated only when the popup is opened.
    #[serde(default)]
    pub id: Value,
    /// Rendered as-is in the marker title. `None` means the field was absent,
    /// which is distinct from an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    pub latitude: f64,
    pub longitude: f64,
}

impl DeviceSummary {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn title(&self) -> String {
        format!("Device: {}", js_string(self.name.as_ref()))
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A numeric device identifier, as accepted by the detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceId(Number);

impl TryFrom<&Value> for DeviceId {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, MapError> {
        match value {
            Value::Number(n) => Ok(Self(n.clone())),
            other => Err(MapError::InvalidDeviceId(to_js_string(other))),
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&js_number(&self.0))
    }
}

/// Detail record returned by the device-info endpoint, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DeviceDetail(Map<String, Value>);

impl DeviceDetail {
    pub fn from_json(body: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for DeviceDetail {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Json(Value),
    /// `latitude`/`longitude` folded into one pair. Either side may be absent.
    Location {
        latitude: Option<Value>,
        longitude: Option<Value>,
    },
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Json(value) => f.write_str(&to_js_string(value)),
            PropertyValue::Location {
                latitude,
                longitude,
            } => write!(
                f,
                "({}, {})",
                js_string(latitude.as_ref()),
                js_string(longitude.as_ref())
            ),
        }
    }
}

/// A device detail reshaped for display: `latitude` and `longitude` are
/// replaced by a single `location` property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayRecord {
    properties: Vec<(String, PropertyValue)>,
}

impl DisplayRecord {
    /// An existing `location` key keeps its position; otherwise the pair is
    /// appended after every other property.
    pub fn from_detail(detail: DeviceDetail) -> Self {
        let mut latitude = None;
        let mut longitude = None;
        let mut location_slot = None;
        let mut properties = Vec::with_capacity(detail.len());

        for (key, value) in detail.0 {
            match key.as_str() {
                "latitude" => latitude = Some(value),
                "longitude" => longitude = Some(value),
                "location" => {
                    location_slot = Some(properties.len());
                    properties.push((key, PropertyValue::Json(value)));
                }
                _ => properties.push((key, PropertyValue::Json(value))),
            }
        }

        let location = PropertyValue::Location {
            latitude,
            longitude,
        };
        match location_slot {
            Some(slot) => properties[slot].1 = location,
            None => properties.push(("location".to_string(), location)),
        }

        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Stringified value of `key`, or `undefined` when absent.
    pub fn display(&self, key: &str) -> String {
        self.get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "undefined".to_string())
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Stringify a JSON value the way a script engine's template literal would.
pub fn js_string(value: Option<&Value>) -> String {
    match value {
        Some(value) => to_js_string(value),
        None => "undefined".to_string(),
    }
}

fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number(n),
        Value::String(s) => s.clone(),
        // Array.prototype.join renders null holes as empty strings
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn js_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() < 1e-6 || f.abs() >= 1e21 => js_exponent(f),
        Some(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// `1e-7`, `1.5e+22`: shortest mantissa, exponent always signed.
fn js_exponent(f: f64) -> String {
    let formatted = format!("{f:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}
