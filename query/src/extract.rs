use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::{is_query, parse, Queryable};

/// Resolve one pass-spec value against `result`.
///
/// Strings starting with the query marker are evaluated as path queries;
/// mappings and lists are resolved element-wise, so the output mirrors the
/// shape of the spec. Anything else is passed through unchanged.
pub fn extract(spec: &Value, result: &dyn Queryable) -> Result<Value> {
    match spec {
        Value::String(text) if is_query(text) => {
            let query = parse(text)?;
            Ok(query.evaluate(result)?.to_value())
        }
        Value::Object(map) => Ok(Value::Object(extract_all(map, result)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| extract(item, result))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        literal => Ok(literal.clone()),
    }
}

/// Resolve every entry of a pass spec. Fails if any single entry fails.
pub fn extract_all(
    pass_spec: &Map<String, Value>,
    result: &dyn Queryable,
) -> Result<Map<String, Value>> {
    let mut out = Map::with_capacity(pass_spec.len());
    for (key, spec) in pass_spec {
        let value =
            extract(spec, result).with_context(|| format!("while extracting \"{key}\""))?;
        out.insert(key.clone(), value);
    }
    Ok(out)
}
