use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slotkv",
    about = "Fixed-capacity key-value store with snapshot persistence",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of slots (overrides config)
    #[arg(long, global = true)]
    pub capacity: Option<usize>,

    /// Snapshot file path (overrides config)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read store commands from stdin
    Shell(ShellArgs),
    /// Execute store commands from a script file
    Run(RunArgs),
    /// Print the contents of a snapshot file
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct ShellArgs {
    /// Flush a final snapshot when input ends
    #[arg(long)]
    pub persist_on_exit: bool,
}

#[derive(Args)]
pub struct RunArgs {
    pub script: PathBuf,
    #[arg(long)]
    pub persist_on_exit: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot to read (defaults to the configured snapshot path)
    pub snapshot: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shell() {
        let cli = Cli::try_parse_from(["slotkv", "shell"]).unwrap();
        if let Command::Shell(args) = cli.command {
            assert!(!args.persist_on_exit);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "slotkv", "run", "cmds.txt", "--capacity", "64", "--snapshot", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.capacity, Some(64));
        assert_eq!(cli.snapshot, Some(PathBuf::from("out.json")));
        if let Command::Run(args) = cli.command {
            assert_eq!(args.script, PathBuf::from("cmds.txt"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_inspect_default_path() {
        let cli = Cli::try_parse_from(["slotkv", "inspect"]).unwrap();
        if let Command::Inspect(args) = cli.command {
            assert!(args.snapshot.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_config_and_json_format() {
        let cli = Cli::try_parse_from([
            "slotkv", "-c", "slotkv.toml", "--format", "json", "inspect", "kvs.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("slotkv.toml")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["slotkv", "--verbose", "shell"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn run_requires_script() {
        assert!(Cli::try_parse_from(["slotkv", "run"]).is_err());
    }
}
