//! Shared plumbing for the email drivers.

use anyhow::{Context, Result};
use log::LevelFilter;
use plantmail::{AcsMailer, Delivery, EmailSettings, MailError, Notifier};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Set up logging based on `-v` count
pub fn init_logging(verbosity: u8) -> Result<()> {
    let log_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("initializing logger")
}

/// Build a notifier from `.env` and the process environment.
pub fn notifier_from_env() -> Result<Notifier<AcsMailer>, MailError> {
    let settings = EmailSettings::load()?;
    Ok(Notifier::from_settings(&settings))
}

/// Log the outcome of a send. Failures are reported, never propagated.
pub fn report(outcome: Result<Delivery, MailError>) {
    match outcome {
        Ok(Delivery::Sent(receipt)) => log::info!("Sent email {}", receipt),
        Ok(Delivery::Suppressed) => log::debug!("email suppressed"),
        Err(e) => log::error!("Exception: {}", e),
    }
}
