//! JSON layout (`vspec2json`): nested objects, children under `children`.
//!
//! ```json
//! { "Vehicle": { "type": "branch", "uuid": "...",
//!     "children": { "Speed": { "type": "sensor", "datatype": "float" } } } }
//! ```
use super::{KEY_CHILDREN, ROOT_KEY_VEHICLE, RawNodeRecord, VssDataKey};
use serde_json::{Map, Value};

/// Parse a whole document. `reserved` lists the metadata keys that must never
/// be read as child nodes.
pub fn parse_str(source: &str, reserved: &[VssDataKey]) -> Result<Vec<RawNodeRecord>, String> {
    let root = serde_json::from_str::<Value>(source).map_err(|e| format!("malformed JSON: {e}"))?;
    let vehicle = root
        .as_object()
        .and_then(|root| root.get(ROOT_KEY_VEHICLE))
        .ok_or_else(|| format!("missing root key '{ROOT_KEY_VEHICLE}'"))?;
    let vehicle = vehicle
        .as_object()
        .ok_or_else(|| format!("'{ROOT_KEY_VEHICLE}' is not an object"))?;
    parse_subtree(ROOT_KEY_VEHICLE.to_string(), vehicle, reserved)
}

fn parse_subtree(
    path: String,
    object: &Map<String, Value>,
    reserved: &[VssDataKey],
) -> Result<Vec<RawNodeRecord>, String> {
    let mut out = vec![parse_entry(path.clone(), object)?];

    let children = match object.get(KEY_CHILDREN) {
        None | Some(Value::Null) => return Ok(out),
        Some(Value::Object(children)) => children,
        Some(_) => return Err(format!("'{KEY_CHILDREN}' of '{path}' is not an object")),
    };
    for (key, child) in children {
        if is_reserved(key, reserved) {
            continue;
        }
        let child_path = format!("{path}.{key}");
        let child = child
            .as_object()
            .ok_or_else(|| format!("entry '{child_path}' is not an object"))?;
        out.extend(parse_subtree(child_path, child, reserved)?);
    }
    Ok(out)
}

fn parse_entry(path: String, object: &Map<String, Value>) -> Result<RawNodeRecord, String> {
    RawNodeRecord::from_attributes(path, |key| {
        object.get(key.key()).map(attribute_text).unwrap_or_default()
    })
}

fn is_reserved(key: &str, reserved: &[VssDataKey]) -> bool {
    key == KEY_CHILDREN || reserved.iter().any(|k| k.key() == key)
}

/// Attributes are kept string-encoded; numbers and booleans keep their JSON text.
fn attribute_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
