//! On-disk cassette layout and the recorded-outcome convention.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The recorded result of a fallible port call.
///
/// Serializes as `{"ok": value}` or `{"err": message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The call succeeded with this value.
    Ok(Value),
    /// The call failed with this message.
    Err(String),
}

impl Outcome {
    /// Captures `result`, keeping only the error's message.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when the ok value cannot be encoded.
    pub fn capture<T: Serialize, E: std::fmt::Display>(result: &Result<T, E>) -> serde_json::Result<Self> {
        match result {
            Ok(value) => serde_json::to_value(value).map(Self::Ok),
            Err(e) => Ok(Self::Err(e.to_string())),
        }
    }

    /// Reads an outcome back from a recorded output.
    ///
    /// Outputs recorded without the wrapper are taken as successes.
    #[must_use]
    pub fn from_output(output: Value) -> Self {
        match output {
            Value::Object(mut map) if map.len() == 1 && map.contains_key("err") => {
                let message = map.remove("err").unwrap_or(Value::Null);
                Self::Err(message.as_str().map_or_else(|| message.to_string(), String::from))
            }
            Value::Object(mut map) if map.len() == 1 && map.contains_key("ok") => {
                Self::Ok(map.remove("ok").unwrap_or(Value::Null))
            }
            other => Self::Ok(other),
        }
    }

    /// The recorded form of this outcome.
    #[must_use]
    pub fn into_output(self) -> Value {
        match self {
            Self::Ok(value) => serde_json::json!({ "ok": value }),
            Self::Err(message) => serde_json::json!({ "err": message }),
        }
    }
}

/// One call made through a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the cassette, assigned by the recorder.
    pub seq: u64,
    /// Port name (`llm`, `fs`, `git`, `entities` or `calls`).
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments, as JSON.
    pub input: Value,
    /// Return value, as JSON; fallible calls use [`Outcome`].
    pub output: Value,
}

/// A recorded session of one or more ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Commit of the analyzed project at recording time.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads and parses a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Writes the cassette as YAML, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(path, yaml)
    }

    /// Ports with at least one recorded interaction.
    #[must_use]
    pub fn ports(&self) -> BTreeSet<&str> {
        self.interactions.iter().map(|i| i.port.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity_lookup() -> Interaction {
        Interaction {
            seq: 0,
            port: "entities".into(),
            method: "entities".into(),
            input: json!({"path": "src/lib.rs"}),
            output: json!({"ok": [{"name": "run", "kind": "function",
                "start": {"line": 0, "character": 0}, "end": {"line": 3, "character": 1},
                "selection_start": {"line": 0, "character": 3}}]}),
        }
    }

    #[test]
    fn outcomes_use_lowercase_tags() {
        let ok: Result<Vec<&str>, String> = Ok(vec!["a.rs"]);
        let err: Result<u32, String> = Err("timed out".into());
        assert_eq!(Outcome::capture(&ok).unwrap().into_output(), json!({"ok": ["a.rs"]}));
        assert_eq!(serde_json::to_value(Outcome::capture(&err).unwrap()).unwrap(), json!({"err": "timed out"}));
    }

    #[test]
    fn bare_outputs_read_as_successes() {
        assert_eq!(Outcome::from_output(json!(true)), Outcome::Ok(json!(true)));
        assert_eq!(Outcome::from_output(json!({"err": "boom"})), Outcome::Err("boom".into()));
        assert_eq!(Outcome::from_output(json!({"ok": null})), Outcome::Ok(Value::Null));
        let two_keys = json!({"ok": 1, "err": "x"});
        assert_eq!(Outcome::from_output(two_keys.clone()), Outcome::Ok(two_keys));
    }

    #[test]
    fn write_then_read_keeps_nested_outputs() {
        let path = std::env::temp_dir().join("archscope_format_test/nested/one.cassette.yaml");
        let cassette = Cassette {
            name: "entities".into(),
            recorded_at: Utc::now(),
            commit: "abc123".into(),
            interactions: vec![entity_lookup()],
        };

        cassette.write(&path).unwrap();
        let back = Cassette::read(&path).unwrap();

        assert_eq!(back, cassette);
        assert_eq!(back.ports().into_iter().collect::<Vec<_>>(), vec!["entities"]);
        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("archscope_format_test"));
    }

    #[test]
    fn unparsable_files_are_reported() {
        let path = std::env::temp_dir().join("archscope_format_garbage.cassette.yaml");
        std::fs::write(&path, "interactions: [unterminated").unwrap();
        assert!(Cassette::read(&path).unwrap_err().contains("Failed to parse"));
        let _ = std::fs::remove_file(&path);
    }
}
