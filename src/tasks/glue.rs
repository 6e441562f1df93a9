use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use namespace::LocationRecord;

use super::{env_string, path_str, TaskContext, TaskOutcome};

/// Advertises where this job's output lives, for later jobs to find by name.
#[derive(Debug, Clone, Deserialize)]
pub struct PassCalcLocs {
    pub name: String,
    /// Supports env_chk
    #[serde(default)]
    pub filesystem: Option<Value>,
    /// Defaults to the current directory
    #[serde(default)]
    pub path: Option<String>,
}

impl PassCalcLocs {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let filesystem = env_string(ctx.namespace, self.filesystem.as_ref(), "filesystem")?;
        let path = match (&self.path, &filesystem) {
            // paths on other hosts are taken as given:
            (Some(path), Some(_)) => path.clone(),
            (Some(path), None) => path_str(&ctx.cwd.join(path))?,
            (None, _) => path_str(&ctx.cwd)?,
        };
        let record = LocationRecord::new(self.name.as_str(), filesystem, path);
        log::info!("recording location {record:?}");
        Ok(TaskOutcome::directive(record.directive()))
    }
}

/// Creates a folder, optionally making it the working directory for later tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolder {
    pub folder_name: String,
    #[serde(default)]
    pub change_to: bool,
    /// Resolve `folder_name` against the current directory
    #[serde(default = "default_local")]
    pub local: bool,
}

fn default_local() -> bool {
    true
}

impl CreateFolder {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let new_dir = if self.local {
            ctx.cwd.join(&self.folder_name)
        } else {
            PathBuf::from(&self.folder_name)
        };
        if !ctx.fs.exists(&new_dir) {
            ctx.fs.create_dir(&new_dir)?;
        }
        if self.change_to {
            log::debug!("changing directory to {new_dir:?}");
            ctx.cwd = new_dir;
        }
        Ok(TaskOutcome::default())
    }
}
