use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use namespace::{Namespace, Target};

/// Context passed to tasks, and what they return
mod context;
pub use context::{ScopedDir, TaskContext, TaskOutcome};

/// Write input files
mod write_inputs;
pub use write_inputs::WriteInputs;

/// Run the simulation command, directly or supervised
mod run_calc;
pub use run_calc::{RunCorrected, RunDirect};

/// Record locations and create folders
mod glue;
pub use glue::{CreateFolder, PassCalcLocs};

/// Copy files from earlier locations into the current directory
mod stage;
pub use stage::{CopyFiles, CopyFilesFromCalcLoc};

/// Parse results and publish selected values
mod pass_result;
pub use pass_result::PassResult;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Must specify either calc_dir or calc_loc")]
    NoCopySource,
    #[error("Must specify from_dir")]
    NoFromDir,
    #[error("Must have a list of filenames")]
    NoFilenames,
    #[error("No input files to write")]
    NoInputFiles,
    #[error("Unknown job type \"{0}\"")]
    UnknownJobType(String),
    #[error("Parameter \"{0}\" must be {1}")]
    InvalidParam(&'static str, &'static str),
    #[error("Path is not valid UTF-8: {0}")]
    PathEncoding(String),
}

/// One unit of work within a job, as written in the workflow file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskSpec {
    WriteInputs(WriteInputs),
    RunDirect(RunDirect),
    RunCorrected(RunCorrected),
    PassCalcLocs(PassCalcLocs),
    CopyFilesFromCalcLoc(CopyFilesFromCalcLoc),
    CopyFiles(CopyFiles),
    CreateFolder(CreateFolder),
    PassResult(PassResult),
}

impl TaskSpec {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WriteInputs(_) => "write_inputs",
            Self::RunDirect(_) => "run_direct",
            Self::RunCorrected(_) => "run_corrected",
            Self::PassCalcLocs(_) => "pass_calc_locs",
            Self::CopyFilesFromCalcLoc(_) => "copy_files_from_calc_loc",
            Self::CopyFiles(_) => "copy_files",
            Self::CreateFolder(_) => "create_folder",
            Self::PassResult(_) => "pass_result",
        }
    }

    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        match self {
            Self::WriteInputs(t) => t.run(ctx),
            Self::RunDirect(t) => t.run(ctx),
            Self::RunCorrected(t) => t.run(ctx),
            Self::PassCalcLocs(t) => t.run(ctx),
            Self::CopyFilesFromCalcLoc(t) => t.run(ctx),
            Self::CopyFiles(t) => t.run(ctx),
            Self::CreateFolder(t) => t.run(ctx),
            Self::PassResult(t) => t.run(ctx),
        }
    }
}

/// A single file name or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileList {
    One(String),
    Many(Vec<String>),
}

impl FileList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

/// `calc_loc` parameter: a location name, or `true` for the most recent location.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocSelector {
    Name(String),
    Flag(bool),
}

impl LocSelector {
    /// `None` if the selector is switched off (`false` or an empty name).
    pub fn target(&self) -> Option<Target> {
        match self {
            Self::Name(name) if !name.is_empty() => Some(Target::Named(name.clone())),
            Self::Flag(true) => Some(Target::Latest),
            _ => None,
        }
    }
}

/// env_chk a parameter that must end up as a string (or be absent).
fn env_string(
    ns: &Namespace,
    value: Option<&Value>,
    param: &'static str,
) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match ns.env_chk(value)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(Error::InvalidParam(param, "a string").into()),
    }
}

fn path_str(path: &std::path::Path) -> Result<String, Error> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::PathEncoding(path.to_string_lossy().into_owned()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::TempDir;

    use crate::fs::Fs;

    /// A whitelisted output dir with one job dir inside it.
    pub struct Sandbox {
        pub _root: TempDir,
        pub fs: Fs,
        pub job: PathBuf,
    }

    impl Sandbox {
        pub fn new() -> Result<Self> {
            let root = tempfile::tempdir()?;
            let mut fs = Fs::new(root.path());
            fs.ensure_output_dir_exists(false)?;
            let job = fs.output_dir().join("job");
            fs.create_dir(&job)?;
            Ok(Self {
                _root: root,
                fs,
                job,
            })
        }

        /// Create another job dir next to the first.
        pub fn sibling(&self, name: &str) -> Result<PathBuf> {
            let dir = self.fs.output_dir().join(name);
            self.fs.create_dir(&dir)?;
            Ok(dir)
        }
    }
}
