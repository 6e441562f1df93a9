use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{Directive, Error};

/// Namespace key holding the location registry.
pub const CALC_LOCS_KEY: &str = "calc_locs";

/// Named pointer to a directory produced by an earlier task.
///
/// Serializes as `{"name": .., "filesystem": .. | null, "path": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub filesystem: Option<String>,
    pub path: String,
}

impl LocationRecord {
    pub fn new(
        name: impl Into<String>,
        filesystem: Option<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filesystem,
            path: path.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "filesystem": self.filesystem,
            "path": self.path,
        })
    }

    /// Directive that appends this record to the run's registry.
    pub fn directive(&self) -> Directive {
        let mut map = Map::with_capacity(1);
        map.insert(CALC_LOCS_KEY.to_owned(), Value::Array(vec![self.to_value()]));
        Directive::PushAll(map)
    }
}

/// Which record to pick out of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Most recent record with this name.
    Named(String),
    /// Most recent record overall.
    Latest,
}

/// Append-only list of location records; insertion order is recency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationRegistry {
    records: Vec<LocationRecord>,
}

impl LocationRegistry {
    /// Return the registry with `record` appended. Existing entries are untouched.
    pub fn record(mut self, record: LocationRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn resolve(&self, target: &Target) -> Result<&LocationRecord, Error> {
        match target {
            Target::Named(name) => self
                .records
                .iter()
                .rev()
                .find(|rec| &rec.name == name)
                .ok_or_else(|| Error::LocationNotFound(name.clone())),
            Target::Latest => self.records.last().ok_or(Error::EmptyRegistry),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
