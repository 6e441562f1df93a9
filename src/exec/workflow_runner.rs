use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use namespace::Namespace;

use crate::fs::Fs;
use crate::job::Job;
use crate::tasks::{TaskContext, TaskOutcome};
use crate::ui::Ui;

/// `WorkflowRunner` is the struct that actually runs a workflow.
///
/// Jobs run one after another, each in its own directory under the output dir.
/// The tasks of a job all see the namespace as it was when the job started;
/// the directives they return are applied once the whole job has succeeded,
/// in the order they were emitted. After every job, the namespace is written
/// to `namespace.json` in the output dir, and any stored data the tasks
/// returned goes to `stored_data.json` in the job dir.
pub struct WorkflowRunner {
    /// shared, run-scoped namespace
    namespace: Namespace,
    /// for whenever we need to create a path:
    pathbuf: PathBuf,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl WorkflowRunner {
    /// Create a new `WorkflowRunner`.
    pub fn new(namespace: Namespace, fs: Fs, ui: Ui) -> Self {
        Self {
            namespace,
            pathbuf: PathBuf::with_capacity(256),
            fs,
            ui,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn run(&mut self, jobs: &[&Job]) -> Result<()> {
        for job in jobs {
            self.ui.start_timer();
            let job_dir = self.fs.job_dir(job.dir_name(), &mut self.pathbuf).to_path_buf();
            eprintln!("{} {}\nin {job_dir:?}\n", "RUN".green(), job.name);

            if !self.fs.exists(&job_dir) {
                self.fs.create_dir(&job_dir)?;
            }
            let outcome = self
                .run_tasks(job, &job_dir)
                .with_context(|| format!("while running job \"{}\"", job.name))?;

            self.ui.verbose_progress("Applying namespace directives");
            self.namespace
                .apply_all(&outcome.directives)
                .with_context(|| format!("while applying directives from job \"{}\"", job.name))?;
            self.ui.done();

            if !outcome.stored_data.is_empty() {
                let stored = self.fs.stored_data_json(&job_dir, &mut self.pathbuf);
                let text = serde_json::to_string_pretty(&outcome.stored_data)?;
                self.fs
                    .write_file(stored, &text)
                    .context("while writing stored data")?;
            }
            self.save_namespace()?;

            self.ui.print_elapsed("Job execution");
            eprintln!("{} {}\n", "COMPLETED".green(), job.name);
        }
        eprintln!("{}\n", "Completed workflow.".green());

        Ok(())
    }

    fn run_tasks(&mut self, job: &Job, job_dir: &Path) -> Result<TaskOutcome> {
        let mut outcome = TaskOutcome::default();
        let mut ctx = TaskContext::new(job_dir, &self.namespace, &mut self.fs, self.ui.verbose);
        for (i, task) in job.tasks.iter().enumerate() {
            log::info!("job \"{}\": task {i} ({})", job.name, task.name());
            self.ui.verbose_msg(&format!(" - {}", task.name()));
            let task_outcome = task
                .run(&mut ctx)
                .with_context(|| format!("in task {i} ({})", task.name()))?;
            outcome.merge(task_outcome);
        }
        Ok(outcome)
    }

    fn save_namespace(&mut self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.namespace)?;
        let path = self.fs.namespace_json(&mut self.pathbuf);
        self.fs
            .write_file(path, &text)
            .context("while writing namespace file")
    }
}
