use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Directive, Error, LocationRecord, LocationRegistry, CALC_LOCS_KEY};

/// Namespace key holding the run environment table consulted by `env_chk`.
pub const ENV_KEY: &str = "_fw_env";

const KEY_DELIM: char = '.';

/// The run-scoped key/value store that tasks read from.
///
/// Tasks only ever see a shared reference; changes are expressed as
/// `Directive`s and applied here, one at a time, by whoever owns the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    data: Map<String, Value>,
}

impl From<Map<String, Value>> for Namespace {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl Namespace {
    /// Look up a (possibly dotted) key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split(KEY_DELIM);
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Location records pushed so far in this run.
    pub fn locations(&self) -> Result<LocationRegistry, Error> {
        let records: Vec<LocationRecord> = match self.data.get(CALC_LOCS_KEY) {
            None => return Ok(LocationRegistry::default()),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|_| Error::MalformedEntry(CALC_LOCS_KEY.to_owned()))?,
        };
        Ok(records
            .into_iter()
            .fold(LocationRegistry::default(), LocationRegistry::record))
    }

    /// Add an entry to the run environment table.
    pub fn set_env(&mut self, key: &str, value: Value) -> Result<(), Error> {
        let env = self
            .data
            .entry(ENV_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        env.as_object_mut()
            .ok_or_else(|| Error::NotAMapping(ENV_KEY.to_owned()))?
            .insert(key.to_owned(), value);
        Ok(())
    }

    /// Resolve `">>key<<"` references against the run environment.
    /// Other values are returned unchanged.
    pub fn env_chk(&self, value: &Value) -> Result<Value, Error> {
        let Some(key) = value.as_str().and_then(env_key) else {
            return Ok(value.clone());
        };
        self.data
            .get(ENV_KEY)
            .and_then(|env| env.get(key))
            .cloned()
            .ok_or_else(|| Error::EnvKeyNotFound(key.to_owned()))
    }

    /// Apply a single directive.
    pub fn apply(&mut self, directive: &Directive) -> Result<(), Error> {
        log::debug!("applying {directive:?}");
        match directive {
            Directive::Set(entries) => {
                for (key, value) in entries {
                    *self.slot(key)? = value.clone();
                }
            }
            Directive::Push(entries) => {
                for (key, value) in entries {
                    self.list(key)?.push(value.clone());
                }
            }
            Directive::PushAll(entries) => {
                for (key, value) in entries {
                    let items = value
                        .as_array()
                        .ok_or_else(|| Error::PushAllNotList(key.clone()))?;
                    self.list(key)?.extend(items.iter().cloned());
                }
            }
        }
        Ok(())
    }

    /// Apply directives in order, stopping at the first failure.
    pub fn apply_all<'d, I>(&mut self, directives: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'d Directive>,
    {
        for d in directives {
            self.apply(d)?;
        }
        Ok(())
    }

    /// Mutable slot at a dotted key, creating intermediate mappings (and a null leaf).
    fn slot(&mut self, key: &str) -> Result<&mut Value, Error> {
        let (parents, leaf) = match key.rsplit_once(KEY_DELIM) {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        let mut map = &mut self.data;
        if let Some(parents) = parents {
            for part in parents.split(KEY_DELIM) {
                map = map
                    .entry(part)
                    .or_insert_with(|| Value::Object(Map::new()))
                    .as_object_mut()
                    .ok_or_else(|| Error::NotAMapping(key.to_owned()))?;
            }
        }
        Ok(map.entry(leaf).or_insert(Value::Null))
    }

    /// List at a dotted key, created if missing.
    fn list(&mut self, key: &str) -> Result<&mut Vec<Value>, Error> {
        let slot = self.slot(key)?;
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut()
            .ok_or_else(|| Error::NotAList(key.to_owned()))
    }
}

/// `">>key<<"` -> `key`
fn env_key(text: &str) -> Option<&str> {
    text.strip_prefix(">>")?.strip_suffix("<<")
}
