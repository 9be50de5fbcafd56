use clap::{Arg, ArgAction, Command, arg};
use progtoken_addresses::Network;
use progtoken_assembler::BootstrapCatalog;
use progtoken_assembler::settings::DEFAULT_INDEXER_TIMEOUT;
use progtoken_ledger::ProtocolParameters;
use serde::Deserialize;
use std::{ffi::OsString, fs};
use toml::from_str;

/// One of the assembler's operations, with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Register { request: String, version: Option<String> },
    Mint { request: String, version: Option<String> },
    Transfer { sender: String, policy: String, asset: String, to: Vec<String>, version: Option<String> },
    Discover { address: String },
    Versions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Args {
    // NOTE: it is best if property names match config file fields
    pub network: Network,
    pub blueprint: String,
    pub bootstraps: Option<String>,
    pub substandards: String,
    pub snapshot: Option<String>,
    pub default_tx_hash: Option<String>,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    pub logdir: Option<String>,
    /// Seconds
    pub indexer_timeout: u64,
    pub async_threads: usize,
    pub protocol_parameters: ProtocolParameters,
    #[serde(skip)]
    pub command: Option<Cmd>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            network: Network::default(),
            blueprint: "plutus.json".to_string(),
            bootstraps: None,
            substandards: "substandards".to_string(),
            snapshot: None,
            default_tx_hash: None,
            log_level: "info".into(),
            logdir: None,
            indexer_timeout: DEFAULT_INDEXER_TIMEOUT.as_secs(),
            async_threads: num_cpus::get(),
            protocol_parameters: ProtocolParameters::default(),
            command: None,
        }
    }
}

impl Args {
    /// Bootstrap file, by default `protocol-bootstraps-<network>.json`.
    pub fn bootstraps_path(&self) -> String {
        self.bootstraps.clone().unwrap_or_else(|| BootstrapCatalog::file_name(self.network))
    }
}

fn version_arg() -> Arg {
    Arg::new("protocol-version")
        .long("version")
        .value_name("TX_HASH")
        .require_equals(true)
        .help("Protocol version, the hash of its bootstrap transaction (default: the active version).")
}

pub fn cli() -> Command {
    let defaults: Args = Default::default();

    #[allow(clippy::let_and_return)]
    let cmd = Command::new("progtoken")
        .about(format!("{} v{}", env!("CARGO_PKG_DESCRIPTION"), env!("CARGO_PKG_VERSION")))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(arg!(-C --configfile <CONFIG_FILE> "Path of config file."))
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .env("PROGTOKEN_NETWORK")
                .value_name("NETWORK")
                .require_equals(true)
                .value_parser(clap::value_parser!(Network))
                .help(format!("Cardano network {{mainnet, preprod, preview}} (default: {}).", defaults.network)),
        )
        .arg(arg!(--blueprint <BLUEPRINT> "Path of the protocol blueprint (default: plutus.json)."))
        .arg(arg!(--bootstraps <BOOTSTRAPS> "Path of the bootstrap file (default: protocol-bootstraps-<network>.json)."))
        .arg(arg!(--substandards <DIR> "Directory of substandard blueprints (default: substandards)."))
        .arg(arg!(--snapshot <SNAPSHOT> "Path of a JSON UTxO snapshot served as the indexer."))
        .arg(arg!(--"default-tx-hash" <TX_HASH> "Protocol version used when a request names none."))
        .arg(
            Arg::new("log_level")
                .short('d')
                .long("loglevel")
                .env("PROGTOKEN_LOG_LEVEL")
                .value_name("LEVEL")
                .default_value("info")
                .require_equals(true)
                .help("Logging level for all subsystems {off, error, warn, info, debug, trace}\n-- You may also specify <subsystem>=<level>,<subsystem2>=<level>,... to set the log level for individual subsystems.".to_string()),
        )
        .arg(arg!(--logdir <LOG_DIR> "Directory to log output."))
        .arg(
            Arg::new("indexer-timeout")
                .long("indexer-timeout")
                .value_name("SECONDS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Bound on every indexer query (default: {}).", defaults.indexer_timeout)),
        )
        .arg(
            Arg::new("async_threads")
                .short('t')
                .long("async-threads")
                .env("PROGTOKEN_ASYNC_THREADS")
                .value_name("async_threads")
                .require_equals(true)
                .value_parser(clap::value_parser!(usize))
                .help(format!("Specify number of async threads (default: {}).", defaults.async_threads)),
        )
        .subcommand(
            Command::new("register")
                .about("Register a new token policy and mint its first supply")
                .arg(arg!(--request <REQUEST> "Register request, as JSON or a path to a JSON file.").required(true))
                .arg(version_arg()),
        )
        .subcommand(
            Command::new("mint")
                .about("Mint more supply of a registered token")
                .arg(arg!(--request <REQUEST> "Mint request, as JSON or a path to a JSON file.").required(true))
                .arg(version_arg()),
        )
        .subcommand(
            Command::new("transfer")
                .about("Transfer programmable tokens")
                .arg(arg!(--sender <ADDRESS> "Sender's base address.").required(true))
                .arg(arg!(--policy <POLICY_ID> "Policy id, hex.").required(true))
                .arg(arg!(--asset <ASSET_NAME> "Asset name, hex.").required(true))
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ADDRESS=QUANTITY")
                        .action(ArgAction::Append)
                        .required(true)
                        .help("Recipient and quantity, may be repeated."),
                )
                .arg(version_arg()),
        )
        .subcommand(
            Command::new("discover")
                .about("List the programmable tokens held by a wallet")
                .arg(arg!(--address <ADDRESS> "Wallet base address.").required(true)),
        )
        .subcommand(Command::new("versions").about("List the known protocol versions"));

    cmd
}

pub fn parse_args() -> Args {
    match Args::parse(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    }
}

impl Args {
    pub fn parse<I, T>(itr: I) -> Result<Args, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m: clap::ArgMatches = cli().try_get_matches_from(itr)?;
        let mut defaults: Args = Default::default();

        if let Some(config_file) = m.get_one::<String>("configfile") {
            let config_str = fs::read_to_string(config_file)?;
            defaults = from_str(&config_str).map_err(|toml_error| {
                clap::Error::raw(
                    clap::error::ErrorKind::ValueValidation,
                    format!("failed parsing config file, reason: {}", toml_error.message()),
                )
            })?;
        }

        let args = Args {
            network: arg_match_unwrap_or::<Network>(&m, "network", defaults.network),
            blueprint: arg_match_unwrap_or::<String>(&m, "blueprint", defaults.blueprint),
            bootstraps: m.get_one::<String>("bootstraps").cloned().or(defaults.bootstraps),
            substandards: arg_match_unwrap_or::<String>(&m, "substandards", defaults.substandards),
            snapshot: m.get_one::<String>("snapshot").cloned().or(defaults.snapshot),
            default_tx_hash: m.get_one::<String>("default-tx-hash").cloned().or(defaults.default_tx_hash),
            log_level: arg_match_unwrap_or::<String>(&m, "log_level", defaults.log_level),
            logdir: m.get_one::<String>("logdir").cloned().or(defaults.logdir),
            indexer_timeout: arg_match_unwrap_or::<u64>(&m, "indexer-timeout", defaults.indexer_timeout),
            async_threads: arg_match_unwrap_or::<usize>(&m, "async_threads", defaults.async_threads),
            protocol_parameters: defaults.protocol_parameters,
            command: m.subcommand().map(|(name, sub)| command(name, sub)),
        };

        Ok(args)
    }
}

fn command(name: &str, m: &clap::ArgMatches) -> Cmd {
    let string = |id: &str| m.get_one::<String>(id).cloned().unwrap_or_default();
    let version = || m.get_one::<String>("protocol-version").cloned();
    match name {
        "register" => Cmd::Register { request: string("request"), version: version() },
        "mint" => Cmd::Mint { request: string("request"), version: version() },
        "transfer" => Cmd::Transfer {
            sender: string("sender"),
            policy: string("policy"),
            asset: string("asset"),
            to: arg_match_many_unwrap_or::<String>(m, "to", Vec::new()),
            version: version(),
        },
        "discover" => Cmd::Discover { address: string("address") },
        _ => Cmd::Versions,
    }
}

use clap::parser::ValueSource::DefaultValue;
use std::marker::{Send, Sync};
fn arg_match_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: T) -> T {
    m.get_one::<T>(arg_id).cloned().filter(|_| m.value_source(arg_id) != Some(DefaultValue)).unwrap_or(default)
}

fn arg_match_many_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: Vec<T>) -> Vec<T> {
    match m.get_many::<T>(arg_id) {
        Some(val_ref) => val_ref.cloned().collect(),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::parse(["progtoken", "versions"]).unwrap();
        assert_eq!(args.network, Network::Preprod);
        assert_eq!(args.bootstraps_path(), "protocol-bootstraps-preprod.json");
        assert_eq!(args.log_level, "info");
        assert_eq!(args.indexer_timeout, 10);
        assert_eq!(args.command, Some(Cmd::Versions));
    }

    #[test]
    fn test_transfer_command() {
        let args = Args::parse([
            "progtoken",
            "--network=preview",
            "transfer",
            "--sender",
            "addr_test1qsender",
            "--policy",
            "aa",
            "--asset",
            "74",
            "--to",
            "addr_test1qbob=5",
            "--to",
            "addr_test1qcarol=7",
            "--version=10",
        ])
        .unwrap();
        assert_eq!(args.network, Network::Preview);
        assert_eq!(args.bootstraps_path(), "protocol-bootstraps-preview.json");
        assert_eq!(
            args.command,
            Some(Cmd::Transfer {
                sender: "addr_test1qsender".to_string(),
                policy: "aa".to_string(),
                asset: "74".to_string(),
                to: vec!["addr_test1qbob=5".to_string(), "addr_test1qcarol=7".to_string()],
                version: Some("10".to_string()),
            })
        );
        assert!(Args::parse(["progtoken"]).is_err());
        assert!(Args::parse(["progtoken", "register"]).is_err());
    }

    #[test]
    fn test_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            network = "mainnet"
            blueprint = "deploy/plutus.json"
            loglevel = "debug"
            indexer-timeout = 3

            [protocol-parameters]
            min-fee-a = 45
            "#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::parse(["progtoken", "-C", &path, "versions"]).unwrap();
        assert_eq!(args.network, Network::Mainnet);
        assert_eq!(args.blueprint, "deploy/plutus.json");
        assert_eq!(args.log_level, "debug");
        assert_eq!(args.indexer_timeout, 3);
        assert_eq!(args.protocol_parameters.min_fee_a, 45);

        // command line flags override the file
        let args = Args::parse(["progtoken", "-C", &path, "--loglevel=trace", "--network=preview", "versions"]).unwrap();
        assert_eq!(args.log_level, "trace");
        assert_eq!(args.network, Network::Preview);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "unknown-field = 1").unwrap();
        assert!(Args::parse(["progtoken", "-C", file.path().to_str().unwrap(), "versions"]).is_err());
    }
}
