use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use npm_release_check::commands::release::ReleaseArgs;
use npm_release_check::{error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "npm-release-check",
    version,
    about = "Create a draft GitHub release for an npm package version that is neither published nor released"
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    release: ReleaseArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                e.exit();
            }
            // Any other argument mistake is a usage error, same as a missing repository.
            let _ = e.print();
            return ExitCode::from(error::USAGE_FAILURE);
        }
    };

    telemetry::init(cli.verbose);

    let _span = tracing::info_span!("command", name = "release").entered();

    match cli.release.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                eprintln!("usage: npm-release-check [OPTIONS] <owner>/<repo>");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::from(error::RUNTIME_FAILURE)
            }
        }
    }
}
