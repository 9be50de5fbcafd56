//! Logger and logging macros
//!
//! For the macros to properly compile, the calling crate must add a dependency to
//! crate log (ie. `log.workspace = true`).

use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
use log::LevelFilter;
use log4rs::{Config, config::Root};

mod appender;
mod consts;
mod logger;

pub use logger::LogError;

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Installs the process-wide logger.
///
/// `filters` uses the `RUST_LOG` syntax and is applied after the environment variable.
/// When `log_dir` is set, all records also go to a rolling log file, and warnings and
/// errors additionally to a dedicated error log.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let mut appenders = vec![appender::AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(appender::AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(appender::AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names = appenders.iter().map(|x| x.name).collect::<Vec<_>>();

    let loggers = logger::Builder::new()
        .root_level(LevelFilter::Info)
        .parse_env(DEFAULT_LOGGER_ENV)
        .parse_expression(filters)
        .build();

    let config = Config::builder()
        .appenders(appenders.into_iter().map(|x| x.appender()))
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))
        .map_err(|err| LogError::Config(err.to_string()))?;

    log4rs::init_config(config).map_err(|err| LogError::Config(err.to_string()))?;
    Ok(())
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => {
        log::trace!($($t)*);
    };
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        log::debug!($($t)*);
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        log::info!($($t)*);
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        log::warn!($($t)*);
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        log::error!($($t)*);
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appenders_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().to_str().unwrap();
        assert!(appender::AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME).is_ok());
        assert!(dir.path().join(LOG_FILE_NAME).exists());
    }
}
