use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use util::PathEncodingError;

use super::{Error, FileAccess};
use crate::fs::Fs;

/// Uses the system `ssh` and `scp` binaries, so authentication is whatever
/// the user's ssh config provides.
pub struct RemoteFiles {
    host: String,
}

impl RemoteFiles {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_owned(),
        }
    }

    /// The remote side joins `args` into a shell command line, so each one is quoted.
    fn ssh(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("ssh");
        cmd.arg(&self.host).arg("--");
        cmd.args(args.iter().map(|arg| shell_quote(arg)));
        run(cmd)
    }

    fn remote_path(&self, path: &Path) -> Result<String> {
        let path = path.to_str().ok_or(PathEncodingError)?;
        Ok(format!("{}:{}", self.host, path))
    }
}

impl FileAccess for RemoteFiles {
    fn abspath(&self, path: &Path) -> Result<PathBuf> {
        let path = path.to_str().ok_or(PathEncodingError)?;
        let out = self.ssh(&["readlink", "-f", path])?;
        Ok(PathBuf::from(out.trim_end()))
    }

    fn listdir(&self, dir: &Path) -> Result<Vec<String>> {
        let dir = dir.to_str().ok_or(PathEncodingError)?;
        let out = self.ssh(&["ls", "-1A", dir])?;
        let mut names: Vec<String> = out.lines().map(str::to_owned).collect();
        names.sort_unstable();
        Ok(names)
    }

    fn copy(&self, src: &Path, tgt: &Path, fs: &Fs) -> Result<()> {
        fs.ensure_writable(tgt)?;
        let mut cmd = Command::new("scp");
        cmd.arg("-rpq").arg(self.remote_path(src)?).arg(tgt);
        run(cmd)?;
        Ok(())
    }
}

/// Single-quote `arg` for a POSIX shell.
fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Run `cmd` to completion, returning stdout; nonzero exit is an error.
fn run(mut cmd: Command) -> Result<String> {
    let printed = format!("{cmd:?}");
    log::debug!("running {printed}");
    let output = cmd
        .output()
        .with_context(|| format!("spawning {printed}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        return Err(Error::RemoteCommand(printed, stderr).into());
    }
    String::from_utf8(output.stdout).context("remote output is not valid UTF-8")
}
