use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use query::Queryable;

use super::{read_source, ResultParser};
use crate::fs::Fs;

/// A JSON file, queried as-is.
pub struct JsonDocument;

impl ResultParser for JsonDocument {
    fn parse(
        &self,
        kwargs: &Map<String, Value>,
        dir: &Path,
        fs: &Fs,
    ) -> Result<Box<dyn Queryable>> {
        let (path, text) = read_source(kwargs, dir, fs)?;
        let doc: Value =
            serde_json::from_str(&text).with_context(|| format!("parsing {path:?} as JSON"))?;
        Ok(Box::new(doc))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_query_json_document() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("run.json"),
            r#"{"ionic_steps": [{"stress": [[0]]}, {"stress": [[1, 2, 3]]}]}"#,
        )?;
        let mut kwargs = Map::new();
        kwargs.insert("filename".to_owned(), json!("run.json"));
        let result = JsonDocument.parse(&kwargs, dir.path(), &Fs::new(dir.path()))?;
        let query = query::parse(">>ionic_steps.-1.stress")?;
        assert_eq!(json!([[1, 2, 3]]), query.evaluate(result.as_ref())?.to_value());
        Ok(())
    }

    #[test]
    fn test_invalid_json() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("run.json"), "{not json")?;
        let mut kwargs = Map::new();
        kwargs.insert("filename".to_owned(), json!("run.json"));
        assert!(JsonDocument.parse(&kwargs, dir.path(), &Fs::new(dir.path())).is_err());
        Ok(())
    }
}
