use clap::{ArgAction, Parser};

const CMD_NAME: &str = "cf";
const DEFAULT_WORKFLOW: &str = "workflow.json";
const DEFAULT_OUTPUT: &str = "output";

/// Stores our command-line args format.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Workflow definition file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_WORKFLOW)]
    #[arg(env = "CALCFLOW_WORKFLOW")]
    pub workflow: String,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    #[arg(env = "CALCFLOW_OUTPUT")]
    pub output: String,

    /// Name of job to run (default: all jobs)
    #[arg(short, long = "job", value_name = "NAME")]
    pub jobs: Vec<String>,

    /// Run-scoped environment entry, read by ">>KEY<<" parameters
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Print additional info (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "cf", "-w", "wf.json", "-j", "relax", "-j", "static", "-e", "cluster=hpc", "-vv",
        ]);
        assert_eq!("wf.json", args.workflow);
        assert_eq!(vec!["relax", "static"], args.jobs);
        assert_eq!(vec!["cluster=hpc"], args.env);
        assert_eq!(2, args.verbose);
    }
}
