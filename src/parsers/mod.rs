use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::{Map, Value};

use query::Queryable;

use crate::fs::Fs;

/// Whole-document JSON results
mod json;
pub use json::JsonDocument;

/// Line-oriented text results
mod text;
pub use text::{KeyValueFile, TableFile};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown parse class \"{0}\"; available: {1}")]
    UnknownParser(String, String),
    #[error("Missing parser argument \"{0}\"")]
    MissingArg(&'static str),
    #[error("Parser argument \"{0}\" must be {1}")]
    InvalidArg(&'static str, &'static str),
    #[error("Malformed line {line} in {file}: {msg}")]
    Malformed {
        file: String,
        line: usize,
        msg: String,
    },
}

/// Builds a queryable result object from files in a directory.
pub trait ResultParser: Sync {
    /// `dir` is where relative file names resolve.
    fn parse(
        &self,
        kwargs: &Map<String, Value>,
        dir: &Path,
        fs: &Fs,
    ) -> Result<Box<dyn Queryable>>;
}

static PARSERS: &[(&str, &dyn ResultParser)] = &[
    ("parsers.JsonDocument", &JsonDocument),
    ("parsers.KeyValueFile", &KeyValueFile),
    ("parsers.TableFile", &TableFile),
];

/// Find a parser by its registered name.
pub fn lookup(name: &str) -> Result<&'static dyn ResultParser, Error> {
    PARSERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, parser)| *parser)
        .ok_or_else(|| {
            let available: Vec<_> = names().collect();
            Error::UnknownParser(name.to_owned(), available.join(", "))
        })
}

fn names() -> impl Iterator<Item = &'static str> {
    PARSERS.iter().map(|(name, _)| *name)
}

fn str_arg<'k>(
    kwargs: &'k Map<String, Value>,
    key: &'static str,
) -> Result<Option<&'k str>, Error> {
    match kwargs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::InvalidArg(key, "a string")),
    }
}

/// Read the file named by the `filename` argument, or its gzipped sibling.
fn read_source(kwargs: &Map<String, Value>, dir: &Path, fs: &Fs) -> Result<(PathBuf, String)> {
    let filename = str_arg(kwargs, "filename")?.ok_or(Error::MissingArg("filename"))?;
    let path = fs.zpath(dir.join(filename));
    let text = fs.read_to_string(&path)?;
    Ok((path, text))
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn kwargs(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_lookup() -> Result<()> {
        assert!(lookup("parsers.JsonDocument").is_ok());
        let err = lookup("pymatgen.io.vasp.Vasprun").err().expect("unknown name");
        assert!(err.to_string().contains("parsers.TableFile"));
        Ok(())
    }

    #[test]
    fn test_reads_gzipped_sibling() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new(dir.path());
        fs.ensure_output_dir_exists(false)?;
        let root = fs.output_dir().to_path_buf();
        fs.write_file(root.join("out.json"), r#"{"energy": -1.5}"#)?;
        fs.gzip_file(root.join("out.json"))?;

        let parser = lookup("parsers.JsonDocument")?;
        let result = parser.parse(&kwargs(json!({"filename": "out.json"})), &root, &fs)?;
        assert_eq!(json!({"energy": -1.5}), result.to_value());
        Ok(())
    }

    #[test]
    fn test_filename_required() -> Result<()> {
        let dir = tempdir()?;
        let fs = Fs::new(dir.path());
        let parser = lookup("parsers.KeyValueFile")?;
        let err = parser.parse(&Map::new(), dir.path(), &fs).err().expect("no filename");
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingArg("filename"))));
        let err = parser
            .parse(&kwargs(json!({"filename": 3})), dir.path(), &fs)
            .err()
            .expect("bad filename");
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidArg("filename", _))));
        Ok(())
    }
}
