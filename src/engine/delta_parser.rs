use serde_json::Value;
use thiserror::Error;

use crate::model::turn_delta::TurnDelta;

/// Decode the reconciliation payload into a `TurnDelta`.
///
/// The oracle's format is not guaranteed: fenced JSON, bare JSON, or ad hoc
/// `KEY: value` lines all occur. Wrapper tokens are stripped first, then the
/// adapters run in order. Missing fields are "no change", never a failure;
/// only a payload matching no encoding at all is an error.
pub fn parse_delta(raw: &str) -> Result<TurnDelta, DeltaParseError> {
    let cleaned = strip_wrappers(raw);
    if cleaned.is_empty() {
        return Err(DeltaParseError::Empty);
    }

    if let Some(delta) = parse_json_object(&cleaned) {
        return Ok(delta);
    }

    if let Some(delta) = parse_key_value_lines(&cleaned) {
        return Ok(delta);
    }

    Err(DeltaParseError::Unrecognizable)
}

#[derive(Debug, Error)]
pub enum DeltaParseError {
    #[error("delta payload is empty")]
    Empty,

    #[error("delta payload did not match any known encoding")]
    Unrecognizable,
}

/// Remove decorative code-fence tokens before structural parsing.
fn strip_wrappers(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Strict-shape JSON adapter. The outermost `{...}` block is parsed and
/// fields are extracted with tolerant numerics (ints, floats, or numeric
/// strings), since models are sloppy about number encoding.
fn parse_json_object(cleaned: &str) -> Option<TurnDelta> {
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&cleaned[start..=end]).ok()?;
    let object = value.as_object()?;

    let mut delta = TurnDelta::default();
    for (key, value) in object {
        match normalize_key(key).as_str() {
            "hp_change" | "hp" | "health" | "health_change" => {
                if let Some(n) = as_int(value) {
                    delta.hp_change = n;
                }
            }
            "bond_change" | "bond" => {
                if let Some(n) = as_int(value) {
                    delta.bond_change = n;
                }
            }
            "new_item" | "item" => {
                if let Some(item) = value.as_str() {
                    delta.new_item = Some(item.to_string());
                }
            }
            "image_prompt" | "image" => {
                if let Some(prompt) = value.as_str() {
                    delta.image_prompt = Some(prompt.to_string());
                }
            }
            "attribute_changes" | "attributes" | "stats" => {
                if let Some(changes) = value.as_object() {
                    for (name, shift) in changes {
                        if let Some(n) = as_int(shift) {
                            delta.attribute_changes.insert(normalize_key(name), n);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Some(delta)
}

/// Ad hoc `KEY: value` adapter. Recognized keys map onto the canonical
/// fields; any other key with an integer value is an attribute delta.
/// At least one usable line is required, so prose never parses as an
/// all-zero delta by accident.
fn parse_key_value_lines(cleaned: &str) -> Option<TurnDelta> {
    let mut delta = TurnDelta::default();
    let mut recognized = 0;

    for line in cleaned.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = normalize_key(key);
        let value = value.trim();

        match key.as_str() {
            "hp_change" | "hp" | "health" | "health_change" => {
                if let Some(n) = parse_int(value) {
                    delta.hp_change = n;
                    recognized += 1;
                }
            }
            "bond_change" | "bond" => {
                if let Some(n) = parse_int(value) {
                    delta.bond_change = n;
                    recognized += 1;
                }
            }
            "new_item" | "item" => {
                if !value.is_empty() {
                    delta.new_item = Some(value.to_string());
                    recognized += 1;
                }
            }
            "image_prompt" | "image" => {
                if !value.is_empty() {
                    delta.image_prompt = Some(value.to_string());
                    recognized += 1;
                }
            }
            other => {
                if !other.is_empty() {
                    if let Some(n) = parse_int(value) {
                        delta.attribute_changes.insert(other.to_string(), n);
                        recognized += 1;
                    }
                }
            }
        }
    }

    (recognized > 0).then_some(delta)
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '-' || c == '*')
        .trim()
        .to_ascii_lowercase()
}

fn as_int(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    if let Some(f) = value.as_f64() {
        return Some(f.trunc() as i32);
    }
    value.as_str().and_then(parse_int)
}

fn parse_int(value: &str) -> Option<i32> {
    value.trim().trim_start_matches('+').parse().ok()
}
