//! Flat YAML layout (`vspec2yaml`): one blank-line separated entry per node.
//!
//! ```yaml
//! Vehicle.ADAS.ABS:
//!   description: Antilock Braking System signals.
//!   type: branch
//!   uuid: 219270ef27c4531f874bbda63743b330
//! ```
use super::{RawNodeRecord, VssDataKey};

const LINE_DELIMITER: char = '\n';

pub fn parse_str(source: &str) -> Result<Vec<RawNodeRecord>, String> {
    split_entries(source)
        .into_iter()
        .map(|entry| parse_entry(&entry))
        .collect()
}

/// Group trimmed lines into entries. Any run of blank lines closes an entry;
/// the last entry needs no trailing blank line.
fn split_entries(source: &str) -> Vec<Vec<&str>> {
    let mut entries = Vec::new();
    let mut current = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if is_ignorable(line) {
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        entries.push(current);
    }
    entries
}

fn is_ignorable(line: &str) -> bool {
    line.starts_with('#') || line == "---"
}

fn parse_entry(lines: &[&str]) -> Result<RawNodeRecord, String> {
    let header = lines.first().copied().unwrap_or_default();
    let (path, _) = header
        .split_once(':')
        .ok_or_else(|| format!("expected '<path>:' entry header, found '{header}'"))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("entry header '{header}' has an empty path"));
    }

    // Leading delimiter so every attribute, the first one included, is matched
    // the same way and `type` never hits the tail of `datatype`.
    let mut body = String::new();
    for line in &lines[1..] {
        body.push(LINE_DELIMITER);
        body.push_str(line);
    }

    RawNodeRecord::from_attributes(path.to_string(), |key| fetch_value(key, &body))
}

fn fetch_value(key: VssDataKey, body: &str) -> String {
    let needle = format!("{LINE_DELIMITER}{}: ", key.key());
    let Some(start) = body.find(&needle) else {
        return String::new();
    };
    let rest = &body[start + needle.len()..];
    let value = rest.split(LINE_DELIMITER).next().unwrap_or_default();
    unquote(value.trim()).to_string()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
