use super::StatelessDetector;
use crate::config::{self, AgentConfig};
use async_trait::async_trait;
use ethernity_core::{utils, Error, Finding, FindingSeverity, FindingType, Result, TransactionEvent};
use ethers::types::Address;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const AGENT_TYPE: &str = "address-watch";
const ALERT_SUFFIX: &str = "ADDRESS-WATCH";

#[derive(Debug, Deserialize)]
struct WatchSettings {
    #[serde(default)]
    contracts: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WatchEntry {
    name: String,
    address: Option<String>,
    watch: WatchClassification,
}

#[derive(Debug, Deserialize)]
struct WatchClassification {
    #[serde(rename = "type")]
    finding_type: FindingType,
    severity: FindingSeverity,
}

#[derive(Debug)]
struct WatchedAddress {
    name: String,
    address: Address,
    classification: WatchClassification,
}

fn watched_addresses(config: &AgentConfig) -> Result<Vec<WatchedAddress>> {
    let settings: WatchSettings = config.settings()?;
    if settings.contracts.is_empty() {
        return Err(Error::ConfigError(
            "É preciso informar ao menos um endereço para monitorar".to_string(),
        ));
    }

    config::ordered_entries::<WatchEntry>(&settings.contracts)?
        .into_iter()
        .map(|(key, entry)| {
            Ok(WatchedAddress {
                address: config::parse_address(&key, entry.address.as_deref())?,
                name: entry.name,
                classification: entry.watch,
            })
        })
        .collect()
}

/// Lista já interpretada junto das configurações de onde veio
#[derive(Debug)]
struct WatchList {
    settings: Map<String, Value>,
    addresses: Arc<Vec<WatchedAddress>>,
}

/// Alerta sempre que um endereço monitorado participa de uma transação
///
/// O estado de cada instância continua sendo a própria configuração. As listas de
/// endereços interpretadas ficam em cache por nome de instância e só são refeitas
/// quando as configurações mudam.
#[derive(Debug, Default)]
pub struct AddressWatch {
    lists: RwLock<HashMap<String, WatchList>>,
}

impl AddressWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantidade de instâncias com lista em cache
    pub fn cached_instances(&self) -> usize {
        self.lists.read().len()
    }

    fn addresses_for(&self, config: &AgentConfig) -> Result<Arc<Vec<WatchedAddress>>> {
        if let Some(list) = self.lists.read().get(&config.name) {
            if list.settings == config.settings {
                return Ok(Arc::clone(&list.addresses));
            }
        }

        let addresses = Arc::new(watched_addresses(config)?);
        self.lists.write().insert(
            config.name.clone(),
            WatchList {
                settings: config.settings.clone(),
                addresses: Arc::clone(&addresses),
            },
        );
        Ok(addresses)
    }
}

#[async_trait]
impl StatelessDetector for AddressWatch {
    fn agent_type(&self) -> &str {
        AGENT_TYPE
    }

    fn handles_transactions(&self) -> bool {
        true
    }

    fn validate(&self, config: &AgentConfig) -> Result<()> {
        config.validate_identity()?;
        self.addresses_for(config).map(|_| ())
    }

    async fn handle_transaction(&self, config: &AgentConfig, tx: &TransactionEvent) -> Result<Vec<Finding>> {
        let findings = self
            .addresses_for(config)?
            .iter()
            .filter(|watched| tx.involves(&watched.address))
            .map(|watched| {
                let address = utils::format_address(&watched.address);
                Finding::new(
                    format!("{} Address Watch", config.protocol_name),
                    format!("Endereço {} ({}) participou de uma transação", address, watched.name),
                    config.alert_id(ALERT_SUFFIX),
                    watched.classification.finding_type,
                    watched.classification.severity,
                    config.protocol_name.clone(),
                )
                .with_metadata("address", address)
                .with_metadata("name", watched.name.clone())
            })
            .collect();

        Ok(findings)
    }
}
