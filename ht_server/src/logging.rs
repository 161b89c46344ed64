//! Structured logging configuration.
//!
//! Logs go to stderr so stdout carries only the JSON event stream.

use holdem_table::table::TableResponse;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Levels come from `RUST_LOG`; records from the `log` facade used by the
/// table crate are forwarded as well.
///
/// # Example
///
/// ```no_run
/// use ht_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log the outcome of a console command
///
/// # Arguments
///
/// * `player` - Player the command was issued for
/// * `command` - Command name
/// * `response` - Table response
pub fn log_table_response(player: &str, command: &str, response: &TableResponse) {
    match response.error_message() {
        None => tracing::debug!(player = player, command = command, "Command accepted"),
        Some(reason) => tracing::warn!(
            player = player,
            command = command,
            reason = reason.as_str(),
            "Command rejected"
        ),
    }
}
