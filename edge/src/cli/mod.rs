mod matches;
mod routes;
mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;

use crate::CmdExecutor;

pub use matches::MatchOpts;
pub use routes::RoutesOpts;
pub use run::RunOpts;

#[derive(Debug, Parser)]
#[command(name = "edge", version, author, about, long_about = None)]
pub struct Opts {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, Subcommand)]
#[enum_dispatch(CmdExecutor)]
pub enum SubCommand {
    #[command(about = "List routes in registration order")]
    Routes(RoutesOpts),
    #[command(name = "match", about = "Show which route a request would hit")]
    Match(MatchOpts),
    #[command(about = "Dispatch one request to the worker and print its response")]
    Run(RunOpts),
}

/// Where the route table and the worker module live.
#[derive(Debug, Clone, Args)]
pub struct ProjectOpts {
    #[arg(short, long, default_value = "config.yml")]
    pub config: PathBuf,
    #[arg(long, default_value = "main.js")]
    pub code: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opts_should_parse_run() {
        let opts = Opts::parse_from([
            "edge", "run", "--config", "a.yml", "--code", "w.js", "POST", "/_ping", "--body", "hi",
        ]);
        let SubCommand::Run(run) = opts.cmd else {
            panic!("expected run");
        };
        assert_eq!(run.project.config, PathBuf::from("a.yml"));
        assert_eq!(run.project.code, PathBuf::from("w.js"));
        assert_eq!(run.method, "POST");
        assert_eq!(run.url, "/_ping");
        assert_eq!(run.body.as_deref(), Some("hi"));
    }

    #[test]
    fn opts_should_use_default_paths() {
        let opts = Opts::parse_from(["edge", "match", "GET", "/user/bob"]);
        let SubCommand::Match(m) = opts.cmd else {
            panic!("expected match");
        };
        assert_eq!(m.project.config, PathBuf::from("config.yml"));
        assert_eq!(m.project.code, PathBuf::from("main.js"));
        assert_eq!(m.url, "/user/bob");
    }
}
