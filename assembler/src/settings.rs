use progtoken_addresses::Network;
use progtoken_ledger::ProtocolParameters;
use std::time::Duration;

pub const DEFAULT_INDEXER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct AssemblerSettings {
    pub network: Network,
    /// Bound on every indexer query
    pub indexer_timeout: Duration,
    pub protocol_parameters: ProtocolParameters,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self { network: Network::default(), indexer_timeout: DEFAULT_INDEXER_TIMEOUT, protocol_parameters: ProtocolParameters::default() }
    }
}

impl AssemblerSettings {
    pub fn new(network: Network) -> Self {
        Self { network, ..Self::default() }
    }

    pub fn with_indexer_timeout(mut self, timeout: Duration) -> Self {
        self.indexer_timeout = timeout;
        self
    }

    pub fn with_protocol_parameters(mut self, params: ProtocolParameters) -> Self {
        self.protocol_parameters = params;
        self
    }
}
