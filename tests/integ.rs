use std::path::{Path, PathBuf};

use anyhow::Result;
use calcflow::{App, Args};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

fn stringify(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

fn basic_args(workflow: &Path, output: &Path) -> Args {
    Args {
        workflow: stringify(workflow),
        output: stringify(output),
        jobs: Vec::with_capacity(0),
        env: Vec::with_capacity(0),
        verbose: 1,
    }
}

/// Write `workflow` into a fresh temp dir; returns the dir and the workflow path.
fn setup(workflow: &Value) -> Result<(TempDir, PathBuf)> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    let dir = tempdir()?;
    let path = dir.path().join("workflow.json");
    std::fs::write(&path, serde_json::to_string_pretty(workflow)?)?;
    Ok((dir, path))
}

fn run(args: Args) -> Result<()> {
    let settings = args.try_into()?;
    App::new(settings).run()
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn two_jobs() -> Value {
    json!({
        "name": "relax-then-static",
        "namespace": {"project": "demo"},
        "jobs": [
            {
                "name": "relax",
                "tasks": [
                    {"task": "write_inputs", "files": {"INCAR": ["ENCUT = 520"]}},
                    {"task": "run_direct",
                     "cmd": "printf 'energy = -5.2\\nnsteps = 3\\n' > results.txt"},
                    {"task": "pass_calc_locs", "name": "relax"},
                    {"task": "pass_result",
                     "pass_dict": {"energy": ">>energy", "code": "demo"},
                     "parse_class": "parsers.KeyValueFile",
                     "parse_kwargs": {"filename": "results.txt"},
                     "mod_spec_key": "relax_result"},
                ],
            },
            {
                "name": "static",
                "dir": "runs/static",
                "tasks": [
                    {"task": "copy_files_from_calc_loc",
                     "filenames": ["results.txt", "INCAR"],
                     "name_prepend": "prev_", "name_append": ".orig",
                     "calc_loc": "relax"},
                    {"task": "run_corrected", "cmd": ">>show_cmd<<",
                     "completion_marker": "energy", "gzip_output": false},
                    {"task": "pass_calc_locs", "name": "static"},
                ],
            },
        ],
    })
}

#[test]
fn test_two_job_workflow() -> Result<()> {
    let (dir, workflow) = setup(&two_jobs())?;
    let output = dir.path().join("output");
    let mut args = basic_args(&workflow, &output);
    args.env = vec!["show_cmd=cat prev_results.txt.orig".to_owned()];
    run(args)?;

    let relax = output.join("relax");
    let static_dir = output.join("runs/static");
    assert_eq!("ENCUT = 520\n", std::fs::read_to_string(relax.join("INCAR"))?);
    assert_eq!(
        "energy = -5.2\nnsteps = 3\n",
        std::fs::read_to_string(static_dir.join("prev_results.txt.orig"))?
    );
    assert!(static_dir.join("prev_INCAR.orig").exists());
    assert!(std::fs::read_to_string(static_dir.join("stdout.txt"))?.contains("energy"));

    let ns = read_json(&output.join("namespace.json"))?;
    assert_eq!(json!("demo"), ns["project"]);
    assert_eq!(json!({"energy": -5.2, "code": "demo"}), ns["relax_result"]);
    let names: Vec<_> = ns["calc_locs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|loc| loc["name"].as_str().unwrap())
        .collect();
    assert_eq!(vec!["relax", "static"], names);
    assert_eq!(Value::Null, ns["calc_locs"][0]["filesystem"]);
    assert_eq!(
        json!(stringify(&relax.canonicalize()?)),
        ns["calc_locs"][0]["path"]
    );

    let stored = read_json(&relax.join("stored_data.json"))?;
    assert_eq!(json!(0), stored["returncode"]);
    let stored = read_json(&static_dir.join("stored_data.json"))?;
    assert_eq!(json!(1), stored["corrections"][0]["runs"]);
    Ok(())
}

#[test]
fn test_select_single_job() -> Result<()> {
    let (dir, workflow) = setup(&two_jobs())?;
    let output = dir.path().join("output");
    let mut args = basic_args(&workflow, &output);
    args.jobs = vec!["relax".to_owned()];
    run(args)?;

    assert!(output.join("relax/results.txt").exists());
    assert!(!output.join("runs/static").exists());
    let ns = read_json(&output.join("namespace.json"))?;
    assert_eq!(1, ns["calc_locs"].as_array().unwrap().len());
    Ok(())
}

#[test]
fn test_missing_location_fails_run() -> Result<()> {
    let workflow = json!({
        "name": "broken",
        "jobs": [
            {"name": "first", "tasks": [{"task": "pass_calc_locs", "name": "first"}]},
            {"name": "second", "tasks": [
                {"task": "copy_files_from_calc_loc", "filenames": "$ALL", "calc_loc": "relax"},
            ]},
        ],
    });
    let (dir, workflow) = setup(&workflow)?;
    let output = dir.path().join("output");
    let err = run(basic_args(&workflow, &output)).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("second"), "{msg}");
    assert!(msg.contains("relax"), "{msg}");

    // the first job's location was still recorded:
    let ns = read_json(&output.join("namespace.json"))?;
    assert_eq!(json!("first"), ns["calc_locs"][0]["name"]);
    Ok(())
}

#[test]
fn test_unresolved_env_key_fails() -> Result<()> {
    let (dir, workflow) = setup(&two_jobs())?;
    let output = dir.path().join("output");
    // no -e show_cmd=...:
    assert!(run(basic_args(&workflow, &output)).is_err());
    Ok(())
}
