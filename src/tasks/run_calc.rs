use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{env_string, Error, TaskContext, TaskOutcome};
use crate::exec::{handler_group, run_cmd, shell_cmd, MarkerValidator, Supervisor};

/// Runs a command directly, with no error handling.
#[derive(Debug, Clone, Deserialize)]
pub struct RunDirect {
    /// Supports env_chk
    pub cmd: Value,
    #[serde(default)]
    pub expand_vars: bool,
}

impl RunDirect {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let mut cmd = env_string(ctx.namespace, Some(&self.cmd), "cmd")?
            .ok_or(Error::InvalidParam("cmd", "a string"))?;
        if self.expand_vars {
            cmd = expand_vars(&cmd);
        }

        log::info!("Running command: {cmd}");
        let status = run_cmd(&mut shell_cmd(&cmd, &ctx.cwd), &ctx.cwd, ctx.fs, ctx.echo)?;
        let code = status.code();
        if status.success() {
            log::info!("Command {cmd} finished running with returncode: {code:?}");
        } else {
            log::warn!("Command {cmd} finished running with returncode: {code:?}");
        }
        Ok(TaskOutcome::stored("returncode", json!(code)))
    }
}

const NORMAL_JOB: &str = "normal";

/// Runs a command under the error-correcting supervisor.
#[derive(Debug, Clone, Deserialize)]
pub struct RunCorrected {
    /// Supports env_chk
    pub cmd: Value,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[serde(default = "default_handler_group")]
    pub handler_group: String,
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
    /// Supports env_chk
    #[serde(default)]
    pub scratch_dir: Option<Value>,
    #[serde(default = "default_gzip_output")]
    pub gzip_output: bool,
    /// If set, stdout must contain this string for the run to count as a success.
    #[serde(default)]
    pub completion_marker: Option<String>,
}

fn default_job_type() -> String {
    NORMAL_JOB.to_owned()
}

fn default_handler_group() -> String {
    "default".to_owned()
}

fn default_max_errors() -> usize {
    10
}

fn default_gzip_output() -> bool {
    true
}

impl RunCorrected {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let cmd = env_string(ctx.namespace, Some(&self.cmd), "cmd")?
            .ok_or(Error::InvalidParam("cmd", "a string"))?;
        let cmd = expand_vars(&cmd);

        if self.job_type != NORMAL_JOB {
            return Err(Error::UnknownJobType(self.job_type.clone()).into());
        }
        let handlers = handler_group(&self.handler_group)?;
        let scratch = env_string(ctx.namespace, self.scratch_dir.as_ref(), "scratch_dir")?
            .map(PathBuf::from);

        let mut supervisor = Supervisor::new(handlers, self.max_errors)
            .scratch_root(scratch)
            .gzip_output(self.gzip_output)
            .echo(ctx.echo);
        if let Some(marker) = &self.completion_marker {
            supervisor = supervisor.validator(Box::new(MarkerValidator::new(marker)));
        }

        let summary = supervisor
            .run(&self.job_type, &cmd, &ctx.cwd, ctx.fs)
            .with_context(|| format!("while running `{cmd}`"))?;
        log::info!(
            "`{cmd}` succeeded after {} run(s) and {} correction(s)",
            summary.runs,
            summary.corrections.len()
        );

        let path = ctx.fs.corrections_json(&ctx.cwd);
        if ctx.fs.exists(&path) {
            let stored: Value = serde_json::from_str(&ctx.fs.read_to_string(&path)?)?;
            return Ok(TaskOutcome::stored("corrections", stored));
        }
        Ok(TaskOutcome::default())
    }
}

/// Expand `$VAR` and `${VAR}` from the process environment.
/// Unknown variables are left as they are.
pub fn expand_vars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };
        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tasks::testing::Sandbox;
    use namespace::Namespace;

    #[test]
    fn test_expand_vars() {
        std::env::set_var("CALCFLOW_TEST_BIN", "/opt/sim");
        assert_eq!("/opt/sim/run -n 4", expand_vars("$CALCFLOW_TEST_BIN/run -n 4"));
        assert_eq!("/opt/sim.x", expand_vars("${CALCFLOW_TEST_BIN}.x"));
        assert_eq!("$CALCFLOW_UNSET_VAR x", expand_vars("$CALCFLOW_UNSET_VAR x"));
        assert_eq!("cost $ 5 ${open", expand_vars("cost $ 5 ${open"));
    }

    #[test]
    fn test_run_direct_env_chk() -> Result<()> {
        let mut sb = Sandbox::new()?;
        let mut ns = Namespace::default();
        ns.set_env("sim_cmd", json!("echo hello; exit 2"))?;
        let task: RunDirect = serde_json::from_value(json!({"cmd": ">>sim_cmd<<"}))?;
        let mut ctx = TaskContext::new(&sb.job, &ns, &mut sb.fs, false);
        let outcome = task.run(&mut ctx)?;
        assert_eq!(Some(&json!(2)), outcome.stored_data.get("returncode"));
        assert_eq!("hello\n", std::fs::read_to_string(sb.job.join("stdout.txt"))?);
        Ok(())
    }

    #[test]
    fn test_run_corrected_stores_summary() -> Result<()> {
        let mut sb = Sandbox::new()?;
        let ns = Namespace::default();
        let task: RunCorrected = serde_json::from_value(json!({
            "cmd": "echo 'Have a nice day'",
            "completion_marker": "nice day",
            "gzip_output": false,
        }))?;
        let mut ctx = TaskContext::new(&sb.job, &ns, &mut sb.fs, false);
        let outcome = task.run(&mut ctx)?;
        let stored = &outcome.stored_data["corrections"];
        assert_eq!(json!(1), stored[0]["runs"]);
        assert!(outcome.directives.is_empty());
        Ok(())
    }

    #[test]
    fn test_run_corrected_rejects_bad_config() -> Result<()> {
        let mut sb = Sandbox::new()?;
        let ns = Namespace::default();
        let mut ctx = TaskContext::new(&sb.job, &ns, &mut sb.fs, false);

        let task: RunCorrected =
            serde_json::from_value(json!({"cmd": "true", "job_type": "neb"}))?;
        let err = task.run(&mut ctx).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UnknownJobType(_))));

        let task: RunCorrected =
            serde_json::from_value(json!({"cmd": "true", "handler_group": "nope"}))?;
        assert!(task.run(&mut ctx).is_err());
        Ok(())
    }
}
