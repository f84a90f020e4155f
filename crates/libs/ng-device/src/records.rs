//! Typed records extracted from Junos structured query documents.
//!
//! Junos renders `| display json` output as nested objects where every leaf
//! is wrapped in a one element array: `"host-name": [{"data": "r1"}]`.
//! The lookups here search the whole document for a key, the same way an
//! XPath `.//name` query would on the XML rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query returning the software information.
pub const SHOW_VERSION: &str = "show version";
/// Query returning the active chassis alarms.
pub const SHOW_CHASSIS_ALARMS: &str = "show chassis alarms";
/// Query returning the routing engine status, including load averages.
pub const SHOW_ROUTE_ENGINE: &str = "show chassis routing-engine";

/// Collect every value stored under `key`, depth first, in document order.
pub fn find_all<'a>(doc: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(doc, key, &mut found);
    found
}

fn collect<'a>(doc: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match doc {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                }
                collect(v, key, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, key, found);
            }
        }
        _ => {}
    }
}

/// First value stored under `key`, if any.
pub fn find_first<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    match doc {
        Value::Object(map) => {
            if let Some(v) = map.get(key) {
                return Some(v);
            }
            map.values().find_map(|v| find_first(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_first(v, key)),
        _ => None,
    }
}

/// Text content of a leaf, unwrapping the `[{"data": ...}]` envelope.
pub fn text(leaf: &Value) -> Option<String> {
    match leaf {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(text),
        Value::Object(map) => map.get("data").and_then(text),
        _ => None,
    }
}

fn first_text(doc: &Value, key: &str) -> Option<String> {
    find_first(doc, key).and_then(text)
}

/// Device identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFacts {
    pub hostname: Option<String>,
    pub version: Option<String>,
}

impl DeviceFacts {
    pub fn from_document(doc: &Value) -> Self {
        Self {
            hostname: first_text(doc, "host-name"),
            version: first_text(doc, "junos-version").or_else(|| {
                // Older releases only report the package list
                find_all(doc, "package-information")
                    .into_iter()
                    .find_map(|pkg| first_text(pkg, "comment"))
            }),
        }
    }
}

/// One active chassis alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisAlarm {
    /// `Major`, `Minor`, ... when reported.
    pub class: Option<String>,
    pub description: String,
}

/// Active chassis alarms, possibly none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisAlarms(pub Vec<ChassisAlarm>);

impl ChassisAlarms {
    pub fn from_document(doc: &Value) -> Self {
        let details = find_all(doc, "alarm-detail");
        let alarms = if details.is_empty() {
            find_all(doc, "alarm-description")
                .into_iter()
                .filter_map(text)
                .map(|description| ChassisAlarm {
                    class: None,
                    description,
                })
                .collect()
        } else {
            details
                .into_iter()
                .flat_map(|detail| match detail {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                })
                .filter_map(|detail| {
                    Some(ChassisAlarm {
                        class: first_text(detail, "alarm-class"),
                        description: first_text(detail, "alarm-description")?,
                    })
                })
                .collect()
        };
        Self(alarms)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChassisAlarm> {
        self.0.iter()
    }
}

/// Routing engine load averages, as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadAverages {
    pub one: Option<String>,
    pub five: Option<String>,
    pub fifteen: Option<String>,
}

impl LoadAverages {
    /// Load averages of the first routing engine in the document.
    pub fn from_document(doc: &Value) -> Self {
        let engine = find_first(doc, "route-engine").unwrap_or(doc);
        Self {
            one: first_text(engine, "load-average-one"),
            five: first_text(engine, "load-average-five"),
            fifteen: first_text(engine, "load-average-fifteen"),
        }
    }
}
