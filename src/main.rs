// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, build the client, hand the selected
//   operation to the dispatcher.
// - Any error is fatal: it is printed to stderr and the process exits with
//   the code `HecateError::exit_code` assigns.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use hecate_cli::cli::{Cli, Selection};
use hecate_cli::dispatch::{InteractiveMode, ModeStrategy, ScriptedMode};
use hecate_cli::error::exit_codes;
use hecate_cli::ui::TerminalPrompter;
use hecate_cli::{Hecate, HecateError, Invocation};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(err) = run(cli) {
        let code = err
            .downcast_ref::<HecateError>()
            .map_or(exit_codes::GENERAL_ERROR, HecateError::exit_code);
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    let (op, options) = match cli.command.select() {
        Selection::Help(op) => {
            op.help();
            return Ok(());
        }
        Selection::Run(op, options) => (op, options),
    };

    let mut hecate = Hecate::new(&config)?;

    let mut strategy: Box<dyn ModeStrategy> = if cli.script {
        Box::new(ScriptedMode)
    } else {
        // If the rules cannot be fetched the policy stays unknown and the
        // prompt asks for credentials.
        if op.policy().is_some() && !hecate.auth().has_credentials() {
            if let Err(e) = hecate.load_auth_rules() {
                warn!(error = %e, "could not fetch auth rules");
            }
        }
        Box::new(InteractiveMode::new(TerminalPrompter).with_spinner(true))
    };

    hecate
        .run(strategy.as_mut(), op.as_ref(), Invocation::new(options))
        .with_context(|| format!("{} failed", op.name()))?;
    Ok(())
}
