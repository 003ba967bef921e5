// Copyright 2026 canvas-harvest contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use canvas_harvest::cli::{self, output, Overrides};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "canvas-harvest",
    about = "Sign in to a Canvas portal and download course files and lecture videos",
    version,
    after_help = "Credentials come from CANVAS_EMAIL / CANVAS_PASSWORD (or EMAIL / PASSWORD),\nread from the environment or a .env file.\nRun 'canvas-harvest' with no command to harvest everything."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and download every course's files and videos
    Run,
    /// Sign in and list the course links on the dashboard
    Courses,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var(output::ENV_JSON, "1");
    }
    if cli.quiet {
        std::env::set_var(output::ENV_QUIET, "1");
    }
    if cli.no_color {
        std::env::set_var(output::ENV_NO_COLOR, "1");
    }
    cli::init_tracing(cli.verbose, cli.quiet, cli.json);

    let result = match cli.command {
        // No subcommand → harvest everything
        None => cli::harvest_cmd::run(&cli.overrides).await,

        Some(Commands::Run) => cli::harvest_cmd::run(&cli.overrides).await,
        Some(Commands::Courses) => cli::courses_cmd::run(&cli.overrides).await,
        Some(Commands::Doctor) => cli::doctor::run(&cli.overrides).await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "canvas-harvest", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !output::is_quiet() && !output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
