use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{Error, TaskContext, TaskOutcome};

/// Writes input files for the simulation into the current directory.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteInputs {
    /// file name -> lines
    pub files: BTreeMap<String, Vec<String>>,
}

impl WriteInputs {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        if self.files.is_empty() {
            return Err(Error::NoInputFiles.into());
        }
        for (name, lines) in &self.files {
            let path = ctx.cwd.join(name);
            ctx.fs
                .write_file(&path, &join_lines(lines))
                .with_context(|| format!("while writing input file {name}"))?;
            log::info!("wrote {path:?}");
        }
        Ok(TaskOutcome::default())
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        if !line.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tasks::testing::Sandbox;
    use namespace::Namespace;
    use serde_json::json;

    #[test]
    fn test_write_files() -> Result<()> {
        let mut sb = Sandbox::new()?;
        let ns = Namespace::default();
        let task: WriteInputs = serde_json::from_value(json!({
            "files": {
                "control.in": ["xc pbe\n", "relax_geometry bfgs 1e-2"],
                "geometry.in": ["atom 0.0 0.0 0.0 Si\n"],
            }
        }))?;
        let mut ctx = TaskContext::new(&sb.job, &ns, &mut sb.fs, false);
        assert_eq!(TaskOutcome::default(), task.run(&mut ctx)?);
        assert_eq!(
            "xc pbe\nrelax_geometry bfgs 1e-2\n",
            std::fs::read_to_string(sb.job.join("control.in"))?
        );
        assert!(sb.job.join("geometry.in").exists());
        Ok(())
    }

    #[test]
    fn test_no_files_is_an_error() -> Result<()> {
        let mut sb = Sandbox::new()?;
        let ns = Namespace::default();
        let task = WriteInputs {
            files: BTreeMap::new(),
        };
        let mut ctx = TaskContext::new(&sb.job, &ns, &mut sb.fs, false);
        assert!(task.run(&mut ctx).is_err());
        Ok(())
    }
}
