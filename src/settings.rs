use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid env flag '{0}' (should be formatted 'KEY=VALUE')")]
    InvalidEnvFlag(String),
    #[error("workflow file {0:?} does not exist")]
    WorkflowNotFound(PathBuf),
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub workflow: PathBuf,
    pub output: PathBuf,
    pub jobs: Vec<String>,
    /// Entries for the namespace's env table
    pub env: Vec<(String, Value)>,
    pub verbose: u8,
}

/// `KEY=VALUE`, where VALUE is JSON if it parses as JSON and a plain string otherwise.
fn parse_env_flag(flag: &str) -> Result<(String, Value), Error> {
    let (key, value) = flag
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| Error::InvalidEnvFlag(flag.to_owned()))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let env = args
            .env
            .iter()
            .map(|flag| parse_env_flag(flag))
            .collect::<Result<Vec<_>, _>>()?;

        let workflow = PathBuf::from(&args.workflow);
        if !workflow.exists() {
            return Err(Error::WorkflowNotFound(workflow).into());
        }
        let workflow = workflow.canonicalize()?;

        Ok(Self {
            workflow,
            output: PathBuf::from(&args.output),
            jobs: args.jobs,
            env,
            verbose: args.verbose,
        })
    }
}
