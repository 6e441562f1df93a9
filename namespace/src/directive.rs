use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default namespace key for published results.
pub const DEFAULT_RESULT_KEY: &str = "prev_calc_result";

/// A declarative change to the shared namespace.
///
/// Serializes to the engine's wire form, e.g. `{"_set": {"key": value}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Overwrite each key with its value.
    #[serde(rename = "_set")]
    Set(Map<String, Value>),
    /// Append each value to the list stored at its key.
    #[serde(rename = "_push")]
    Push(Map<String, Value>),
    /// Append every element of each (list) value to the list stored at its key.
    #[serde(rename = "_push_all")]
    PushAll(Map<String, Value>),
}

/// How published results are merged into the namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    #[default]
    #[serde(rename = "_set", alias = "replace")]
    Replace,
    #[serde(rename = "_push", alias = "append")]
    Append,
}

/// Build the directive that publishes `values` under `key`.
pub fn publish(values: Map<String, Value>, key: &str, mode: MergeMode) -> Directive {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_owned(), Value::Object(values));
    match mode {
        MergeMode::Replace => Directive::Set(map),
        MergeMode::Append => Directive::Push(map),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn energy() -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("energy".to_owned(), json!(-5.2));
        m
    }

    #[test]
    fn test_publish_wire_shapes() -> Result<()> {
        assert_eq!(
            json!({"_set": {"results": {"energy": -5.2}}}),
            serde_json::to_value(publish(energy(), "results", MergeMode::Replace))?
        );
        assert_eq!(
            json!({"_push": {"results": {"energy": -5.2}}}),
            serde_json::to_value(publish(energy(), "results", MergeMode::Append))?
        );
        Ok(())
    }

    #[test]
    fn test_merge_mode_names() -> Result<()> {
        assert_eq!(MergeMode::Replace, serde_json::from_value(json!("_set"))?);
        assert_eq!(MergeMode::Append, serde_json::from_value(json!("_push"))?);
        assert_eq!(MergeMode::Append, serde_json::from_value(json!("append"))?);
        assert!(serde_json::from_value::<MergeMode>(json!("_unset")).is_err());
        assert_eq!(MergeMode::Replace, MergeMode::default());
        Ok(())
    }
}
