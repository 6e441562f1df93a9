use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use namespace::{Directive, Namespace};

use crate::fs::Fs;

/// Everything a task gets to see while it runs.
pub struct TaskContext<'a> {
    /// Directory the task works in. Relative paths resolve against it.
    pub cwd: PathBuf,
    /// The namespace as of the start of the job. Read-only.
    pub namespace: &'a Namespace,
    pub fs: &'a mut Fs,
    /// Forward subprocess output to the terminal
    pub echo: bool,
}

impl<'a> TaskContext<'a> {
    pub fn new(cwd: &Path, namespace: &'a Namespace, fs: &'a mut Fs, echo: bool) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            namespace,
            fs,
            echo,
        }
    }
}

/// What a task hands back to the runner.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskOutcome {
    /// Namespace changes, applied in order once the job is done.
    pub directives: Vec<Directive>,
    /// Auxiliary output kept alongside the job.
    pub stored_data: Map<String, Value>,
}

impl TaskOutcome {
    pub fn directive(directive: Directive) -> Self {
        Self {
            directives: vec![directive],
            ..Default::default()
        }
    }

    pub fn stored(key: &str, value: Value) -> Self {
        let mut stored_data = Map::with_capacity(1);
        stored_data.insert(key.to_owned(), value);
        Self {
            stored_data,
            ..Default::default()
        }
    }

    /// Fold a later task's outcome into this one.
    pub fn merge(&mut self, other: TaskOutcome) {
        self.directives.extend(other.directives);
        self.stored_data.extend(other.stored_data);
    }
}

/// Changes a task's working directory for as long as it is alive,
/// restoring the previous one when dropped (including on early return or panic).
pub struct ScopedDir<'a> {
    cwd: &'a mut PathBuf,
    prev: PathBuf,
}

impl<'a> ScopedDir<'a> {
    pub fn enter(cwd: &'a mut PathBuf, dir: &Path) -> Self {
        let prev = cwd.clone();
        cwd.push(dir);
        log::trace!("entered {cwd:?}");
        Self { cwd, prev }
    }
}

impl Deref for ScopedDir<'_> {
    type Target = Path;
    fn deref(&self) -> &Path {
        self.cwd.as_path()
    }
}

impl Drop for ScopedDir<'_> {
    fn drop(&mut self) {
        std::mem::swap(&mut *self.cwd, &mut self.prev);
        log::trace!("restored {:?}", self.cwd);
    }
}
