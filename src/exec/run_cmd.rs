use std::fs::File;
use std::io::{self, stderr, stdout, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result};

use super::Error;
use crate::fs::Fs;

/// Build the shell command that runs `cmd` in `dir`.
pub fn shell_cmd(cmd: &str, dir: &Path) -> Command {
    let mut shell = Command::new("/usr/bin/env");
    shell.arg("bash").arg("-c").arg(cmd).current_dir(dir);
    shell
}

/// Run a subprocess, storing stdout and stderr in `run_dir`.
/// If `echo` is set, output is also forwarded to our own stdout and stderr.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(cmd: &mut Command, run_dir: &Path, fs: &Fs, echo: bool) -> Result<ExitStatus> {
    let out_file = fs
        .create_file(fs.stdout(run_dir))
        .context("creating stdout.txt file")?;
    let err_file = fs
        .create_file(fs.stderr(run_dir))
        .context("creating stderr.txt file")?;

    log::debug!("running {:?} in {run_dir:?}", cmd);
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| {
            format!(
                "failed to execute child process {:?} {:?}",
                cmd.get_program(),
                cmd.get_args(),
            )
        })?;

    let child_out = child.stdout.take().ok_or(Error::NoChildPipe("stdout"))?;
    let child_err = child.stderr.take().ok_or(Error::NoChildPipe("stderr"))?;

    let thread_out = thread::spawn(move || communicate(child_out, out_file, stdout(), echo));
    let thread_err = thread::spawn(move || communicate(child_err, err_file, stderr(), echo));

    thread_out
        .join()
        .map_err(|_| Error::OutputThreadPanicked("stdout"))?
        .context("communicating with child stdout")?;
    thread_err
        .join()
        .map_err(|_| Error::OutputThreadPanicked("stderr"))?
        .context("communicating with child stderr")?;

    let status = child.wait().context("waiting on child process")?;
    log::debug!("process finished with {status}");
    Ok(status)
}

fn communicate<R: Read, W: Write>(
    mut stream: R,
    mut file: File,
    mut output: W,
    echo: bool,
) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        file.write_all(buf)?;
        if echo {
            output.write_all(buf)?;
        }
    }

    Ok(())
}
