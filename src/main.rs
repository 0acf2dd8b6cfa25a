use air::cli::aliases::{config_path_from_args, effective_aliases, expand_alias};
use air::cli::commands::{execute, CommandContext};
use air::cli::Cli;
use air::config::AirConfig;
use air::telemetry::{create_command_span, generate_correlation_id, init_telemetry};
use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::Instrument;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // .env must be in place before the AIR__* variables are read
    AirConfig::load_env_file()?;

    let args: Vec<OsString> = std::env::args_os().collect();
    let config = AirConfig::load(config_path_from_args(&args).as_deref())?;
    let args = expand_alias(args, &effective_aliases(&config.aliases));
    let cli = Cli::parse_from(args);

    init_telemetry(&config.observability, cli.verbose)?;

    let correlation_id = generate_correlation_id();
    let span = create_command_span(
        cli.command.name(),
        cli.command.explicit_ticket(),
        &correlation_id,
    );

    tokio::runtime::Runtime::new()?.block_on(
        async {
            let ctx = CommandContext::new(&config)?;
            let mut stdout = std::io::stdout().lock();
            execute(&ctx, &cli.command, &mut stdout).await
        }
        .instrument(span),
    )
}
