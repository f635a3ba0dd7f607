use std::io;
use std::process;

use anyhow::Result;
use clap::CommandFactory;
use tracing::error;

use nodestrap::cli::{self, Commands};
use nodestrap::executor::RealCommandExecutor;

fn run(args: cli::Cli) -> Result<()> {
    match &args.command {
        Commands::Apply(opts) => {
            nodestrap::init_logging(opts.common.log_level)?;
            let executor = RealCommandExecutor {
                dry_run: opts.dry_run,
            };
            nodestrap::run_apply(opts, &executor)
        }
        Commands::Validate(opts) => {
            nodestrap::init_logging(opts.common.log_level)?;
            nodestrap::run_validate(opts)
        }
        Commands::Bootstrap(opts) => {
            nodestrap::init_logging(opts.common.log_level)?;
            for command in nodestrap::run_bootstrap(opts)? {
                println!("{}", command);
            }
            Ok(())
        }
        Commands::Conf(opts) => {
            nodestrap::init_logging(opts.log_level)?;
            nodestrap::run_conf(opts)
        }
        Commands::Completions(opts) => {
            let mut cmd = cli::Cli::command();
            clap_complete::generate(opts.shell, &mut cmd, env!("CARGO_PKG_NAME"), &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}
