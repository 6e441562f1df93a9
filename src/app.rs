use anyhow::{Context, Result};
use colored::Colorize;

use namespace::Namespace;

use crate::exec::WorkflowRunner;
use crate::fs::Fs;
use crate::job::WorkflowDef;
use crate::settings::Settings;
use crate::ui::Ui;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let fs = Fs::new(&settings.output);
        let ui = Ui::new(&settings);
        Self { settings, fs, ui }
    }

    /// Run the selected jobs of the workflow in order.
    pub fn run(mut self) -> Result<()> {
        if self.settings.verbose > 0 {
            eprintln!("Using output directory {:?}", self.settings.output);
        }
        self.fs.ensure_output_dir_exists(self.settings.verbose > 0)?;

        let def = self.load_workflow()?;
        let jobs = def.select(&self.settings.jobs)?;
        let namespace = self.seed_namespace(&def)?;

        eprintln!(
            "\n{} {} ({} jobs).\n",
            "Starting workflow".magenta(),
            def.name,
            jobs.len()
        );
        let mut runner = WorkflowRunner::new(namespace, self.fs, self.ui);
        runner.run(&jobs).context("while running workflow")?;
        log::debug!("final namespace keys: {:?}", runner.namespace().as_map().keys());

        Ok(())
    }

    fn load_workflow(&self) -> Result<WorkflowDef> {
        self.ui
            .verbose_progress_debug("Reading workflow file", &self.settings.workflow);
        let def = WorkflowDef::load(&self.settings.workflow, &self.fs).with_context(|| {
            format!("while reading workflow file {:?}", self.settings.workflow)
        })?;
        self.ui.done();
        Ok(def)
    }

    /// Initial namespace from the workflow file, with `-e` entries added to its env table.
    fn seed_namespace(&self, def: &WorkflowDef) -> Result<Namespace> {
        let mut namespace = Namespace::from(def.namespace.clone());
        for (key, value) in &self.settings.env {
            log::debug!("setting env entry {key:?}");
            namespace.set_env(key, value.clone())?;
        }
        Ok(namespace)
    }
}
