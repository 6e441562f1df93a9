use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::handlers::{Correction, ErrorHandler, Validator};
use super::run_cmd::{run_cmd, shell_cmd};
use super::Error;
use crate::fs::{list_dir, Fs, CORRECTIONS_JSON};

/// Record of one supervised job, written to `corrections.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub job: String,
    pub runs: usize,
    pub returncode: Option<i32>,
    pub corrections: Vec<Correction>,
    pub validator: Option<String>,
}

/// Runs a shell command, rerunning it after handler-driven corrections
/// until it succeeds, fails unrecoverably, or runs out of error budget.
pub struct Supervisor {
    handlers: Vec<Box<dyn ErrorHandler>>,
    validators: Vec<Box<dyn Validator>>,
    max_errors: usize,
    scratch_root: Option<PathBuf>,
    gzip_output: bool,
    echo: bool,
}

impl Supervisor {
    pub fn new(handlers: Vec<Box<dyn ErrorHandler>>, max_errors: usize) -> Self {
        Self {
            handlers,
            validators: Vec::with_capacity(0),
            max_errors,
            scratch_root: None,
            gzip_output: false,
            echo: false,
        }
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    pub fn gzip_output(mut self, gzip: bool) -> Self {
        self.gzip_output = gzip;
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Run `cmd` for the job `name` with `dir` as its home directory.
    /// `corrections.json` is written to `dir` whether or not the job succeeds.
    pub fn run(&mut self, name: &str, cmd: &str, dir: &Path, fs: &mut Fs) -> Result<RunSummary> {
        let mut summary = RunSummary {
            job: name.to_owned(),
            ..Default::default()
        };

        let outcome = match self.scratch_root.clone() {
            Some(root) => self.run_in_scratch(&root, cmd, dir, fs, &mut summary),
            None => self.supervise(cmd, dir, fs, &mut summary),
        };

        if summary.runs > 0 {
            let text = serde_json::to_string_pretty(&[&summary])?;
            fs.write_file(fs.corrections_json(dir), &text)
                .context("writing corrections summary")?;
        }
        outcome?;

        if self.gzip_output {
            gzip_dir(dir, fs)?;
        }
        Ok(summary)
    }

    fn run_in_scratch(
        &mut self,
        root: &Path,
        cmd: &str,
        dir: &Path,
        fs: &mut Fs,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("calcflow-")
            .tempdir_in(root)
            .with_context(|| format!("creating scratch dir in {root:?}"))?;
        let scratch_dir = scratch.path().to_path_buf();
        log::info!("running in scratch dir {scratch_dir:?}");
        fs.allow(&scratch_dir);

        let outcome = copy_entries(dir, &scratch_dir, fs)
            .and_then(|_| self.supervise(cmd, &scratch_dir, fs, summary));
        let copied_back = copy_entries(&scratch_dir, dir, fs).context("copying back from scratch");

        fs.disallow(&scratch_dir);
        outcome.and(copied_back)
    }

    fn supervise(
        &mut self,
        cmd: &str,
        run_dir: &Path,
        fs: &Fs,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut errors = 0;
        loop {
            summary.runs += 1;
            log::info!("run {} of `{cmd}`", summary.runs);
            let status = run_cmd(&mut shell_cmd(cmd, run_dir), run_dir, fs, self.echo)?;
            summary.returncode = status.code();

            let mut corrected = false;
            for handler in &mut self.handlers {
                if !handler.check(run_dir, fs)? {
                    continue;
                }
                errors += 1;
                if errors > self.max_errors {
                    return Err(Error::MaxErrorsReached(self.max_errors).into());
                }
                let correction = handler.correct(run_dir, fs)?;
                log::warn!(
                    "{} detected {:?}; rerunning",
                    correction.handler,
                    correction.errors
                );
                summary.corrections.push(correction);
                corrected = true;
            }
            if corrected {
                continue;
            }

            if !status.success() {
                return Err(Error::NonZeroExit(status.code()).into());
            }
            for validator in &self.validators {
                if validator.check(run_dir, fs)? {
                    summary.validator = Some(validator.name().to_owned());
                    return Err(Error::ValidationFailed(validator.name().to_owned()).into());
                }
            }
            return Ok(());
        }
    }
}

/// Copy every entry of `src` into `tgt`.
fn copy_entries(src: &Path, tgt: &Path, fs: &Fs) -> Result<()> {
    for name in list_dir(src)? {
        fs.copy(src.join(&name), tgt.join(&name))?;
    }
    Ok(())
}

/// Compress every regular file in `dir` except the corrections summary.
fn gzip_dir(dir: &Path, fs: &Fs) -> Result<()> {
    for name in list_dir(dir)? {
        let path = dir.join(&name);
        if name == CORRECTIONS_JSON || name.ends_with(".gz") || !path.is_file() {
            continue;
        }
        fs.gzip_file(&path)?;
    }
    Ok(())
}
