// Screen Registration Wizard
// Main library entry point

pub mod api;
pub mod models;
pub mod tui;
pub mod utils;
pub mod wizard;

use log::{error, info};
use std::path::Path;
use utils::settings::{LoggingSettings, Settings};

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(
    logging: &LoggingSettings,
    with_stdout: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("screen-wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("screen-wizard-{}.txt", timestamp));

    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (never while the TUI owns the terminal)
    let mut dispatch = fern::Dispatch::new().level(logging.level_filter());

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Load settings or exit with a message; nothing useful can run without them.
fn load_settings_or_exit(config_path: Option<&Path>) -> Settings {
    match Settings::load(config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Screen wizard: invalid configuration: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Print the effective configuration (token masked) and exit.
pub fn print_config(config_path: Option<&Path>) {
    let settings = load_settings_or_exit(config_path);
    match settings.to_toml() {
        Ok(rendered) => print!("{}", rendered),
        Err(e) => {
            eprintln!("Screen wizard: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Interactive terminal wizard.
pub fn run_tui(config_path: Option<&Path>) {
    let settings = load_settings_or_exit(config_path);

    // Initialize logging (no stdout to avoid corrupting the TUI)
    if let Err(e) = init_logging(&settings.logging, false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Screen wizard starting at {}",
        chrono::Utc::now()
    );
    info!(
        "[PHASE: initialization] [STEP: deployment_folder] Deployment folder: {:?}",
        utils::path_resolver::resolve_deployment_folder().ok()
    );

    if let Err(e) = tui::run(&settings) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Screen wizard error: {}", e);
        std::process::exit(1);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame for a step and exits.
pub fn run_tui_smoke(config_path: Option<&Path>, target: Option<String>) {
    let settings = load_settings_or_exit(config_path);

    if let Err(e) = init_logging(&settings.logging, settings.logging.stdout) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] TUI smoke starting at {}",
        chrono::Utc::now()
    );

    let target = target.as_deref().unwrap_or("info");
    if let Err(e) = tui::smoke(&settings, target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Screen wizard error: {}", e);
        std::process::exit(1);
    }
}
