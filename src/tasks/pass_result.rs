use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use namespace::{publish, MergeMode, DEFAULT_RESULT_KEY};

use super::{ScopedDir, TaskContext, TaskOutcome};
use crate::parsers;

/// Parse a finished calculation and publish selected values to the namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct PassResult {
    /// Output key -> path query, literal, or nested mapping of these
    pub pass_dict: Map<String, Value>,
    pub parse_class: String,
    #[serde(default)]
    pub parse_kwargs: Map<String, Value>,
    #[serde(default = "default_calc_dir")]
    pub calc_dir: String,
    #[serde(default)]
    pub mod_spec_cmd: MergeMode,
    #[serde(default = "default_result_key")]
    pub mod_spec_key: String,
}

fn default_calc_dir() -> String {
    ".".to_owned()
}

fn default_result_key() -> String {
    DEFAULT_RESULT_KEY.to_owned()
}

impl PassResult {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let parser = parsers::lookup(&self.parse_class)?;
        let result = {
            let dir = ScopedDir::enter(&mut ctx.cwd, Path::new(&self.calc_dir));
            parser
                .parse(&self.parse_kwargs, &dir, ctx.fs)
                .with_context(|| format!("while parsing results in {:?}", &*dir))?
        };
        let values = query::extract_all(&self.pass_dict, result.as_ref())?;
        log::info!("publishing {} values under \"{}\"", values.len(), self.mod_spec_key);
        Ok(TaskOutcome::directive(publish(
            values,
            &self.mod_spec_key,
            self.mod_spec_cmd,
        )))
    }
}
