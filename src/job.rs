use std::path::{Component, Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::fs::Fs;
use crate::tasks::TaskSpec;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Workflow has no jobs")]
    NoJobs,
    #[error("Job directory \"{0}\" must be a plain relative path")]
    InvalidJobDir(String),
    #[error("Duplicate job name \"{0}\"")]
    DuplicateJob(String),
    #[error("No job named \"{0}\"")]
    UnknownJob(String),
}

/// A workflow definition file: jobs run in order against one shared namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDef {
    pub name: String,
    /// Initial namespace contents
    #[serde(default)]
    pub namespace: Map<String, Value>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: String,
    /// Directory under the output dir; defaults to the job name
    #[serde(default)]
    pub dir: Option<String>,
    pub tasks: Vec<TaskSpec>,
}

impl Job {
    pub fn dir_name(&self) -> &str {
        self.dir.as_deref().unwrap_or(&self.name)
    }
}

impl WorkflowDef {
    /// Read and validate a workflow file.
    pub fn load(path: &Path, fs: &Fs) -> Result<Self> {
        let text = fs.read_to_string(path)?;
        let def: Self = serde_json::from_str(&text)
            .with_context(|| format!("while parsing workflow file {path:?}"))?;
        def.validate()?;
        Ok(def)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.jobs.is_empty() {
            return Err(Error::NoJobs);
        }
        let mut seen = util::HashSet::default();
        for job in &self.jobs {
            if !seen.insert(job.name.as_str()) {
                return Err(Error::DuplicateJob(job.name.clone()));
            }
            let dir = Path::new(job.dir_name());
            let plain = dir.components().all(|c| matches!(c, Component::Normal(_)));
            if !plain || dir.as_os_str().is_empty() {
                return Err(Error::InvalidJobDir(job.dir_name().to_owned()));
            }
        }
        Ok(())
    }

    /// The jobs to run, in workflow order. An empty selection means all of them.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Job>, Error> {
        if let Some(missing) = names.iter().find(|n| !self.jobs.iter().any(|j| &j.name == *n)) {
            return Err(Error::UnknownJob(missing.clone()));
        }
        Ok(self
            .jobs
            .iter()
            .filter(|job| names.is_empty() || names.contains(&job.name))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn def(jobs: Value) -> Result<WorkflowDef> {
        Ok(serde_json::from_value(json!({"name": "wf", "jobs": jobs}))?)
    }

    #[test]
    fn test_validate() -> Result<()> {
        let ok = def(json!([
            {"name": "relax", "tasks": []},
            {"name": "static", "dir": "runs/static",
             "tasks": [{"task": "create_folder", "folder_name": "x"}]},
        ]))?;
        ok.validate()?;
        assert_eq!("runs/static", ok.jobs[1].dir_name());

        assert!(matches!(def(json!([]))?.validate(), Err(Error::NoJobs)));
        let dup = def(json!([{"name": "a", "tasks": []}, {"name": "a", "tasks": []}]))?;
        assert!(matches!(dup.validate(), Err(Error::DuplicateJob(_))));
        for bad in ["../up", "/abs", ".", ""] {
            let wf = def(json!([{"name": "a", "dir": bad, "tasks": []}]))?;
            assert!(matches!(wf.validate(), Err(Error::InvalidJobDir(_))), "{bad}");
        }
        Ok(())
    }

    #[test]
    fn test_select_keeps_workflow_order() -> Result<()> {
        let wf = def(json!([
            {"name": "a", "tasks": []},
            {"name": "b", "tasks": []},
            {"name": "c", "tasks": []},
        ]))?;
        let names: Vec<_> = wf.select(&[])?.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], names);
        let picked = wf.select(&["c".to_owned(), "a".to_owned()])?;
        let names: Vec<_> = picked.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(vec!["a", "c"], names);
        assert!(matches!(wf.select(&["z".to_owned()]), Err(Error::UnknownJob(_))));
        Ok(())
    }
}
