use crate::config::ObservabilityConfig;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Environment variable that overrides every other log-level setting
pub const LOG_ENV_VAR: &str = "AIR_LOG";

/// Initialize structured logging on stderr
///
/// Stdout carries command output only, so that listings and completion
/// helpers stay pipeable.
pub fn init_telemetry(settings: &ObservabilityConfig, verbosity: u8) -> Result<()> {
    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(level_for(&settings.log_level, verbosity))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("telemetry initialized");
    Ok(())
}

/// Effective level: each `-v` raises the configured level by one step.
pub fn level_for(configured: &str, verbosity: u8) -> &'static str {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    let base = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(configured.trim()))
        .unwrap_or(1);
    LEVELS[(base + verbosity as usize).min(LEVELS.len() - 1)]
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span every subcommand runs inside
pub fn create_command_span(
    command: &str,
    ticket: Option<&str>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "air_command",
        command = command,
        ticket = ticket,
        correlation.id = correlation_id,
    )
}
