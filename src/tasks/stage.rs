use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use namespace::{LocationRecord, Namespace};

use super::{env_string, Error, FileList, LocSelector, TaskContext, TaskOutcome};
use crate::files::{file_client, FileAccess};
use crate::fs::Fs;

/// Stands in for "every file in the source directory".
pub const ALL_FILES: &str = "$ALL";

/// Which files to stage, and how to rename them.
#[derive(Debug, Default)]
pub struct StageRequest<'r> {
    /// `None` or an empty list means the whole listing minus `exclude_files`.
    pub files_to_copy: Option<&'r [String]>,
    pub exclude_files: &'r [String],
    pub name_prepend: &'r str,
    pub name_append: &'r str,
}

/// Copy the requested files from `from_dir` (as seen by `client`) into local `to_dir`.
/// Returns the destination paths, in copy order.
pub fn stage(
    client: &dyn FileAccess,
    from_dir: &Path,
    to_dir: &Path,
    req: &StageRequest<'_>,
    fs: &Fs,
) -> Result<Vec<PathBuf>> {
    let from_dir = client.abspath(from_dir)?;
    let names = select_files(client, &from_dir, req)?;
    log::debug!("staging {} files from {from_dir:?} to {to_dir:?}", names.len());

    let mut copied = Vec::with_capacity(names.len());
    for name in names {
        let src = from_dir.join(&name);
        let tgt = to_dir.join(format!("{}{}{}", req.name_prepend, name, req.name_append));
        client
            .copy(&src, &tgt, fs)
            .with_context(|| format!("while staging {name:?}"))?;
        copied.push(tgt);
    }
    Ok(copied)
}

fn select_files(
    client: &dyn FileAccess,
    from_dir: &Path,
    req: &StageRequest<'_>,
) -> Result<Vec<String>> {
    match req.files_to_copy {
        None | Some([]) => {
            let excluded: util::HashSet<&str> =
                req.exclude_files.iter().map(String::as_str).collect();
            let mut names = client.listdir(from_dir)?;
            names.retain(|name| !excluded.contains(name.as_str()));
            Ok(names)
        }
        Some(files) if files.iter().any(|f| f == ALL_FILES) => {
            if !req.exclude_files.is_empty() {
                log::warn!("exclude_files is ignored when copying {ALL_FILES}");
            }
            client.listdir(from_dir)
        }
        Some(files) => Ok(files.to_vec()),
    }
}

/// Look up a location record from the namespace's registry.
fn resolve_loc(ns: &Namespace, selector: Option<&LocSelector>) -> Result<Option<LocationRecord>> {
    let Some(target) = selector.and_then(LocSelector::target) else {
        return Ok(None);
    };
    let locations = ns.locations()?;
    let record = locations.resolve(&target)?;
    log::debug!("resolved {target:?} to {record:?}");
    Ok(Some(record.clone()))
}

/// Copy files from a previous location (or a plain directory) into the current directory.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyFilesFromCalcLoc {
    pub filenames: FileList,
    #[serde(default)]
    pub name_prepend: String,
    #[serde(default)]
    pub name_append: String,
    #[serde(default)]
    pub calc_dir: Option<String>,
    #[serde(default)]
    pub calc_loc: Option<LocSelector>,
}

impl CopyFilesFromCalcLoc {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let files = self.filenames.to_vec();
        if files.is_empty() {
            return Err(Error::NoFilenames.into());
        }

        let (client, from_dir) = if let Some(dir) = &self.calc_dir {
            (file_client(None, &ctx.cwd), PathBuf::from(dir))
        } else if let Some(record) = resolve_loc(ctx.namespace, self.calc_loc.as_ref())? {
            let client = file_client(record.filesystem.as_deref(), &ctx.cwd);
            (client, PathBuf::from(record.path))
        } else {
            return Err(Error::NoCopySource.into());
        };

        let req = StageRequest {
            files_to_copy: Some(&files),
            name_prepend: &self.name_prepend,
            name_append: &self.name_append,
            ..Default::default()
        };
        stage(client.as_ref(), &from_dir, &ctx.cwd, &req, ctx.fs)?;
        Ok(TaskOutcome::default())
    }
}

/// General-purpose file staging, with optional exclusions.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyFiles {
    #[serde(default)]
    pub from_dir: Option<String>,
    /// Defaults to the current directory
    #[serde(default)]
    pub to_dir: Option<String>,
    /// Supports env_chk; only used with `from_dir`
    #[serde(default)]
    pub filesystem: Option<Value>,
    #[serde(default)]
    pub files_to_copy: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_files: Vec<String>,
    #[serde(default)]
    pub calc_loc: Option<LocSelector>,
}

impl CopyFiles {
    pub fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutcome> {
        let (client, from_dir) = if let Some(dir) = &self.from_dir {
            let filesystem = env_string(ctx.namespace, self.filesystem.as_ref(), "filesystem")?;
            (file_client(filesystem.as_deref(), &ctx.cwd), PathBuf::from(dir))
        } else if let Some(record) = resolve_loc(ctx.namespace, self.calc_loc.as_ref())? {
            let client = file_client(record.filesystem.as_deref(), &ctx.cwd);
            (client, PathBuf::from(record.path))
        } else {
            return Err(Error::NoFromDir.into());
        };

        let to_dir = match &self.to_dir {
            Some(dir) => ctx.cwd.join(dir),
            None => ctx.cwd.clone(),
        };
        if !ctx.fs.exists(&to_dir) {
            ctx.fs.create_dir(&to_dir)?;
        }

        let req = StageRequest {
            files_to_copy: self.files_to_copy.as_deref(),
            exclude_files: &self.exclude_files,
            ..Default::default()
        };
        stage(client.as_ref(), &from_dir, &to_dir, &req, ctx.fs)?;
        Ok(TaskOutcome::default())
    }
}
