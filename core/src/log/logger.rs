use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::BTreeMap, env, mem, str::FromStr};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("Logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("Log appender error: {0}")]
    Appender(String),

    #[error("Logger configuration error: {0}")]
    Config(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
    pub appenders: Vec<&'static str>,
}

impl LoggerSpec {
    pub fn new(name: String, level: LevelFilter, appenders: Vec<&'static str>) -> Self {
        Self { name, level, appenders }
    }

    pub fn logger(&self) -> Logger {
        Logger::builder().appenders(self.appenders.iter().map(|x| x.to_string())).build(self.name.clone(), self.level)
    }
}

pub(super) struct Loggers {
    loggers: Vec<LoggerSpec>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn specs(&self) -> &[LoggerSpec] {
        &self.loggers
    }

    pub fn items(&self) -> impl Iterator<Item = Logger> + '_ {
        self.loggers.iter().map(|x| x.logger())
    }
}

/// Collects per-module levels from expressions such as `info,progtoken_assembler=trace`.
///
/// Later expressions override earlier ones, so the environment is parsed first
/// and the command line last.
pub(super) struct Builder {
    appenders: Vec<&'static str>,
    loggers: BTreeMap<String, (Vec<&'static str>, LevelFilter)>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { appenders: vec![], loggers: BTreeMap::new(), root_level: None }
    }

    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()) {
            if spec.is_empty() {
                continue;
            }
            match Self::parse_spec(spec) {
                Ok((Some(name), level)) => {
                    self.logger(name.to_string(), level);
                }
                Ok((None, level)) => {
                    self.root_level(level);
                }
                // the logger is not up yet, so stderr is the only channel
                Err(err) => eprintln!("Ignoring invalid logging spec '{}'", err),
            }
        }
        self
    }

    fn parse_spec(spec: &str) -> Result<(Option<&str>, LevelFilter), LogError> {
        let mut parts = spec.split('=');
        match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
            // a lone level names the root level, a lone name enables everything for that module
            (Some(part0), None, None) => match part0.parse() {
                Ok(level) => Ok((None, level)),
                Err(_) => Ok((Some(part0), LevelFilter::max())),
            },
            (Some(part0), Some(""), None) => Ok((Some(part0), LevelFilter::max())),
            (Some(part0), Some(part1), None) => match part1.parse() {
                Ok(level) => Ok((Some(part0), level)),
                Err(_) => Err(LogError::ParseLoggerSpecError(part1.to_string())),
            },
            _ => Err(LogError::ParseLoggerSpecError(spec.to_string())),
        }
    }

    pub fn appenders(&mut self, appenders: impl Iterator<Item = &'static str>) -> &mut Self {
        self.appenders = appenders.collect();
        self
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level.replace(root_level);
        self
    }

    pub fn logger(&mut self, name: String, level: LevelFilter) -> &mut Self {
        self.loggers.insert(name, (self.appenders.clone(), level));
        self
    }

    pub fn build(&mut self) -> Loggers {
        let loggers_map = mem::take(&mut self.loggers);
        let loggers =
            loggers_map.into_iter().map(|(name, (appenders, level))| LoggerSpec::new(name, level, appenders)).collect::<Vec<_>>();
        Loggers { loggers, root_level: self.root_level.take().unwrap_or(LevelFilter::Error) }
    }
}

impl FromStr for Builder {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = Self::new();
        builder.parse_expression(s);
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_module_levels() {
        let loggers = Builder::from_str("warn, progtoken_assembler=trace ,progtoken_plutus").unwrap().build();
        assert_eq!(loggers.root_level(), LevelFilter::Warn);
        let specs = loggers.specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "progtoken_assembler");
        assert_eq!(specs[0].level, LevelFilter::Trace);
        assert_eq!(specs[1].name, "progtoken_plutus");
        assert_eq!(specs[1].level, LevelFilter::max());
    }

    #[test]
    fn test_invalid_specs_are_skipped() {
        let loggers = Builder::from_str("a=b=c,progtoken_ledger=loud,debug").unwrap().build();
        assert_eq!(loggers.root_level(), LevelFilter::Debug);
        assert!(loggers.specs().is_empty());
    }

    #[test]
    fn test_later_expressions_override() {
        let mut builder = Builder::new();
        builder.root_level(LevelFilter::Info).parse_expression("progtoken_cli=debug").parse_expression("progtoken_cli=error");
        let loggers = builder.build();
        assert_eq!(loggers.root_level(), LevelFilter::Info);
        assert_eq!(loggers.specs()[0].level, LevelFilter::Error);
    }

    #[test]
    fn test_default_root_level() {
        assert_eq!(Builder::new().build().root_level(), LevelFilter::Error);
    }
}
