use std::path::Path;

use anyhow::Result;
use serde_json::{Map, Number, Value};

use query::Queryable;

use super::{read_source, str_arg, Error, ResultParser};
use crate::fs::Fs;

/// Interpret a bare text value as a JSON number or boolean where possible.
pub fn parse_scalar(text: &str) -> Value {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match text {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(text.to_owned()),
    }
}

fn is_skipped(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

/// `key = value` lines; blank lines and `#` comments are skipped.
pub struct KeyValueFile;

impl ResultParser for KeyValueFile {
    fn parse(
        &self,
        kwargs: &Map<String, Value>,
        dir: &Path,
        fs: &Fs,
    ) -> Result<Box<dyn Queryable>> {
        let separator = str_arg(kwargs, "separator")?.unwrap_or("=");
        if separator.is_empty() {
            return Err(Error::InvalidArg("separator", "non-empty").into());
        }
        let (path, text) = read_source(kwargs, dir, fs)?;

        let mut fields = Map::new();
        for (i, line) in text.lines().enumerate() {
            if is_skipped(line) {
                continue;
            }
            let Some((key, value)) = line.split_once(separator) else {
                return Err(Error::Malformed {
                    file: path.to_string_lossy().into_owned(),
                    line: i + 1,
                    msg: format!("expected \"key{separator}value\""),
                }
                .into());
            };
            fields.insert(key.trim().to_owned(), parse_scalar(value));
        }
        Ok(Box::new(Value::Object(fields)))
    }
}

/// A header line of column names followed by rows of values.
pub struct TableFile;

impl ResultParser for TableFile {
    fn parse(
        &self,
        kwargs: &Map<String, Value>,
        dir: &Path,
        fs: &Fs,
    ) -> Result<Box<dyn Queryable>> {
        let delimiter = str_arg(kwargs, "delimiter")?;
        let (path, text) = read_source(kwargs, dir, fs)?;
        let split = |line: &str| -> Vec<String> {
            match delimiter {
                Some(d) => line.split(d).map(|c| c.trim().to_owned()).collect(),
                None => line.split_whitespace().map(str::to_owned).collect(),
            }
        };

        let mut lines = text.lines().enumerate().filter(|(_, line)| !is_skipped(line));
        let columns = lines.next().map(|(_, header)| split(header)).unwrap_or_default();
        let mut table = Table::new(columns);
        for (i, line) in lines {
            let cells = split(line);
            if cells.len() != table.columns.len() {
                return Err(Error::Malformed {
                    file: path.to_string_lossy().into_owned(),
                    line: i + 1,
                    msg: format!("{} cells for {} columns", cells.len(), table.columns.len()),
                }
                .into());
            }
            table.push_row(cells.iter().map(|c| parse_scalar(c)).collect());
        }
        log::debug!("read {} rows from {path:?}", table.rows.len());
        Ok(Box::new(table))
    }
}

/// Tabular results, queryable by row (`rows.-1.energy`) or by column (`energy.-1`).
#[derive(Debug, Default)]
pub struct Table {
    pub columns: Vec<String>,
    /// One object per row, keyed by column name
    pub rows: Vec<Value>,
    /// Column-major copy of the cells
    by_column: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            by_column: vec![Vec::new(); columns.len()],
            columns,
            rows: Vec::new(),
        }
    }

    fn push_row(&mut self, cells: Vec<Value>) {
        let mut row = Map::with_capacity(cells.len());
        for ((name, cell), col) in self.columns.iter().zip(cells).zip(&mut self.by_column) {
            col.push(cell.clone());
            row.insert(name.clone(), cell);
        }
        self.rows.push(Value::Object(row));
    }
}

impl Queryable for Table {
    fn attr(&self, name: &str) -> Option<&dyn Queryable> {
        match name {
            "columns" => Some(&self.columns as &dyn Queryable),
            "rows" => Some(&self.rows as &dyn Queryable),
            _ => self
                .columns
                .iter()
                .position(|c| c == name)
                .map(|i| &self.by_column[i] as &dyn Queryable),
        }
    }

    fn has_attrs(&self) -> bool {
        true
    }

    fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(2);
        map.insert("columns".to_owned(), self.columns.to_value());
        map.insert("rows".to_owned(), self.rows.to_value());
        Value::Object(map)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn parse_file(
        parser: &dyn ResultParser,
        contents: &str,
        args: Value,
    ) -> Result<Box<dyn Queryable>> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("out.txt"), contents)?;
        let mut kwargs = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        kwargs.insert("filename".to_owned(), json!("out.txt"));
        parser.parse(&kwargs, dir.path(), &Fs::new(dir.path()))
    }

    fn get(result: &dyn Queryable, query: &str) -> Result<Value> {
        Ok(query::parse(query)?.evaluate(result)?.to_value())
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(json!(3), parse_scalar(" 3 "));
        assert_eq!(json!(-5.25), parse_scalar("-5.25"));
        assert_eq!(json!(true), parse_scalar("True"));
        assert_eq!(json!("Si2"), parse_scalar("Si2"));
        assert_eq!(json!("nan"), parse_scalar("nan"));
    }

    #[test]
    fn test_key_value_file() -> Result<()> {
        let text = "# summary\nenergy = -5.2\n\nconverged=true\nformula = Si2\n";
        let result = parse_file(&KeyValueFile, text, json!({}))?;
        assert_eq!(json!(-5.2), get(result.as_ref(), ">>energy")?);
        assert_eq!(json!(true), get(result.as_ref(), ">>converged")?);

        let custom = parse_file(&KeyValueFile, "nsteps: 12\n", json!({"separator": ":"}))?;
        assert_eq!(json!(12), get(custom.as_ref(), ">>nsteps")?);

        assert!(parse_file(&KeyValueFile, "energy -5.2\n", json!({})).is_err());
        Ok(())
    }

    #[test]
    fn test_table_file() -> Result<()> {
        let text = "step energy\n1 -4.0\n2 -4.5\n3 -4.75\n";
        let result = parse_file(&TableFile, text, json!({}))?;
        let result = result.as_ref();
        assert_eq!(json!(-4.75), get(result, ">>energy.-1")?);
        assert_eq!(json!(-4.5), get(result, ">>rows.1.energy")?);
        assert_eq!(json!(["step", "energy"]), get(result, ">>columns")?);
        assert!(get(result, ">>volume").is_err());
        Ok(())
    }

    #[test]
    fn test_table_file_delimiter_and_ragged_rows() -> Result<()> {
        let result = parse_file(&TableFile, "a, b\n1, x\n", json!({"delimiter": ","}))?;
        assert_eq!(json!([{"a": 1, "b": "x"}]), get(result.as_ref(), ">>rows")?);

        let err = parse_file(&TableFile, "a b\n1\n", json!({})).err().expect("ragged");
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Malformed { line: 2, .. })));
        Ok(())
    }
}
