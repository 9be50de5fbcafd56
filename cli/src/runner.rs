use crate::args::{Args, Cmd};
use crate::error::Error;
use progtoken_addresses::{Address, Network};
use progtoken_assembler::protocol::PROTOCOL_TITLES;
use progtoken_assembler::request::{validate_address, validate_asset_name, validate_quantity, validate_version};
use progtoken_assembler::{
    Assembler, AssemblerSettings, BootstrapCatalog, MintTokenRequest, RegisterTokenRequest, ScriptCache, SubstandardCatalog,
    TransferRequest,
};
use progtoken_core::{info, warn};
use progtoken_hashes::PolicyId;
use progtoken_index_core::{DynIndexer, MemoryIndexer};
use progtoken_plutus::BlueprintRegistry;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Loads the blueprint, catalogs and indexer named by `args` into an assembler.
pub fn assembler(args: &Args) -> Result<Assembler, Error> {
    let blueprint = Arc::new(BlueprintRegistry::load(&args.blueprint, &PROTOCOL_TITLES)?);
    info!("Loaded {} protocol validators from {}", blueprint.len(), args.blueprint);

    let default_version = validate_version(args.default_tx_hash.as_deref())?;
    let bootstraps = Arc::new(BootstrapCatalog::load(args.bootstraps_path(), default_version.as_ref())?);
    let substandards = Arc::new(SubstandardCatalog::load(&args.substandards)?);

    let indexer: DynIndexer = match args.snapshot.as_deref() {
        Some(snapshot) => Arc::new(MemoryIndexer::load(snapshot)?),
        None => {
            warn!("No UTxO snapshot configured, the indexer starts empty");
            Arc::new(MemoryIndexer::new())
        }
    };

    let settings = AssemblerSettings::new(args.network)
        .with_indexer_timeout(Duration::from_secs(args.indexer_timeout))
        .with_protocol_parameters(args.protocol_parameters.clone());
    Ok(Assembler::new(settings, blueprint, bootstraps, substandards, Arc::new(ScriptCache::new()), indexer)?)
}

/// Runs `command`, returning its JSON result.
pub async fn run(assembler: &Assembler, command: &Cmd) -> Result<Value, Error> {
    let network = assembler.settings().network;
    match command {
        Cmd::Register { request, version } => {
            let mut request: RegisterTokenRequest = read_request(request)?;
            if version.is_some() {
                request.version.clone_from(version);
            }
            Ok(serde_json::to_value(assembler.register(&request).await?)?)
        }
        Cmd::Mint { request, version } => {
            let mut request: MintTokenRequest = read_request(request)?;
            if version.is_some() {
                request.version.clone_from(version);
            }
            Ok(serde_json::to_value(assembler.mint(&request).await?)?)
        }
        Cmd::Transfer { sender, policy, asset, to, version } => {
            let request = TransferRequest {
                sender: validate_address(sender, network)?,
                policy_id: policy.parse::<PolicyId>().map_err(|_| Error::Argument(format!("malformed policy id {policy}")))?,
                asset_name: validate_asset_name(asset)?,
                recipients: to.iter().map(|recipient| parse_recipient(recipient, network)).collect::<Result<_, _>>()?,
                version: validate_version(version.as_deref())?,
            };
            Ok(serde_json::to_value(assembler.transfer(&request).await?)?)
        }
        Cmd::Discover { address } => {
            let tokens = assembler.discover_tokens(&validate_address(address, network)?).await?;
            Ok(serde_json::to_value(tokens)?)
        }
        Cmd::Versions => {
            let bootstraps = assembler.bootstraps();
            Ok(json!({ "active": bootstraps.active().tx_hash, "versions": bootstraps.all() }))
        }
    }
}

/// Parses `<address>=<quantity>`.
pub fn parse_recipient(recipient: &str, network: Network) -> Result<(Address, u64), Error> {
    let (address, quantity) =
        recipient.rsplit_once('=').ok_or_else(|| Error::Argument(format!("expected <address>=<quantity>, got {recipient}")))?;
    Ok((validate_address(address, network)?, validate_quantity(quantity)?))
}

/// Reads a request given inline as JSON or as the path of a JSON file.
fn read_request<T: DeserializeOwned>(request: &str) -> Result<T, Error> {
    let trimmed = request.trim_start();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let json = std::fs::read_to_string(request).map_err(|source| Error::RequestIo { path: request.to_string(), source })?;
    Ok(serde_json::from_str(&json)?)
}
