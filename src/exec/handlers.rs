use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Error;
use crate::fs::{Fs, STDERR_TXT, STDOUT_TXT};

/// What a handler found and what it did about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub handler: String,
    pub errors: Vec<String>,
    pub actions: Vec<Value>,
}

/// Detects a class of failure after a run and prepares the directory for a rerun.
pub trait ErrorHandler {
    fn name(&self) -> &str;

    /// True if the run in `dir` hit the error this handler knows about.
    fn check(&mut self, dir: &Path, fs: &Fs) -> Result<bool>;

    /// Fix things up so the job can be run again.
    fn correct(&mut self, dir: &Path, fs: &Fs) -> Result<Correction>;
}

/// Final check on a run that exited cleanly and triggered no handlers.
pub trait Validator {
    fn name(&self) -> &str;

    /// True if the run in `dir` is invalid.
    fn check(&self, dir: &Path, fs: &Fs) -> Result<bool>;
}

/// Handlers for a named group.
pub fn handler_group(name: &str) -> Result<Vec<Box<dyn ErrorHandler>>, Error> {
    match name {
        "default" => Ok(vec![Box::new(LogPatternHandler::crash())]),
        "no_handler" => Ok(Vec::with_capacity(0)),
        _ => Err(Error::UnknownHandlerGroup(name.to_owned())),
    }
}

const CRASH_PATTERNS: [&str; 4] = ["Segmentation fault", "SIGSEGV", "Killed", "Out of memory"];

/// Looks for known patterns in the run's logs.
/// On a match, the logs are moved aside (`stdout.txt` -> `stdout.txt.error1`, ...)
/// so the rerun starts clean and the evidence is kept.
pub struct LogPatternHandler {
    name: String,
    patterns: Vec<String>,
    found: Vec<String>,
    corrections: usize,
}

impl LogPatternHandler {
    pub fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            found: Vec::with_capacity(0),
            corrections: 0,
        }
    }

    /// Handler for common crash signatures.
    pub fn crash() -> Self {
        Self::new("CrashHandler", &CRASH_PATTERNS)
    }
}

impl ErrorHandler for LogPatternHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&mut self, dir: &Path, fs: &Fs) -> Result<bool> {
        self.found.clear();
        for log in [STDOUT_TXT, STDERR_TXT] {
            let path = dir.join(log);
            if !fs.exists(&path) {
                continue;
            }
            let text = fs.read_to_string(&path)?;
            for pattern in &self.patterns {
                if text.contains(pattern.as_str()) && !self.found.contains(pattern) {
                    self.found.push(pattern.clone());
                }
            }
        }
        Ok(!self.found.is_empty())
    }

    fn correct(&mut self, dir: &Path, fs: &Fs) -> Result<Correction> {
        self.corrections += 1;
        let mut actions = Vec::with_capacity(2);
        for log in [STDOUT_TXT, STDERR_TXT] {
            let path = dir.join(log);
            if fs.exists(&path) {
                let moved = format!("{log}.error{}", self.corrections);
                fs.rename(&path, dir.join(&moved))?;
                actions.push(json!({"action": "move", "file": log, "to": moved}));
            }
        }
        Ok(Correction {
            handler: self.name.clone(),
            errors: std::mem::take(&mut self.found),
            actions,
        })
    }
}

/// Requires `stdout.txt` to contain a marker string.
pub struct MarkerValidator {
    marker: String,
}

impl MarkerValidator {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_owned(),
        }
    }
}

impl Validator for MarkerValidator {
    fn name(&self) -> &str {
        "MarkerValidator"
    }

    fn check(&self, dir: &Path, fs: &Fs) -> Result<bool> {
        let path = fs.zpath(fs.stdout(dir));
        if !fs.exists(&path) {
            return Ok(true);
        }
        Ok(!fs.read_to_string(&path)?.contains(self.marker.as_str()))
    }
}
