/*!
 * Ethernity Types
 *
 * Tipos comuns usados em toda a workspace Ethernity
 */

use crate::error::{Error, Result};
use ethers::abi::{Event, RawLog, Token};
use ethers::types::{Address, Log, H256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Alias para hash de transação
pub type TransactionHash = H256;

/// Classificação de um alerta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingType {
    Unknown,
    Exploit,
    Suspicious,
    Degraded,
    Info,
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingType::Unknown => write!(f, "Unknown"),
            FindingType::Exploit => write!(f, "Exploit"),
            FindingType::Suspicious => write!(f, "Suspicious"),
            FindingType::Degraded => write!(f, "Degraded"),
            FindingType::Info => write!(f, "Info"),
        }
    }
}

/// Severidade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FindingSeverity {
    Unknown,
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingSeverity::Unknown => write!(f, "Unknown"),
            FindingSeverity::Info => write!(f, "Info"),
            FindingSeverity::Low => write!(f, "Low"),
            FindingSeverity::Medium => write!(f, "Medium"),
            FindingSeverity::High => write!(f, "High"),
            FindingSeverity::Critical => write!(f, "Critical"),
        }
    }
}

/// Valor de metadado de um alerta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(serde_json::Number),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Number(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{}", s),
            MetadataValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

/// Alerta estruturado produzido por um detector.
///
/// Não há API de mutação: depois de montado com `with_metadata` o alerta
/// só é lido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    name: String,
    description: String,
    alert_id: String,
    #[serde(rename = "type")]
    finding_type: FindingType,
    severity: FindingSeverity,
    protocol: String,
    metadata: BTreeMap<String, MetadataValue>,
}

impl Finding {
    /// Cria um novo alerta sem metadados
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        alert_id: impl Into<String>,
        finding_type: FindingType,
        severity: FindingSeverity,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            alert_id: alert_id.into(),
            finding_type,
            severity,
            protocol: protocol.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Acrescenta um metadado durante a construção
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn alert_id(&self) -> &str {
        &self.alert_id
    }

    pub fn finding_type(&self) -> FindingType {
        self.finding_type
    }

    pub fn severity(&self) -> FindingSeverity {
        self.severity
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    /// Atalho para metadados textuais
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }
}

/// Log já decodificado de acordo com a ABI do contrato emissor
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub address: Address,
    /// Nome do evento, ex.: `ProposalCreated`
    pub name: String,
    /// Assinatura canônica, ex.: `ProposalCanceled(uint256)`
    pub signature: String,
    pub log_index: u64,
    pub args: Vec<(String, Token)>,
}

impl DecodedLog {
    /// Monta um log decodificado a partir da definição do evento e dos valores dos parâmetros
    pub fn from_event(event: &Event, address: Address, log_index: u64, values: Vec<Token>) -> Self {
        let args = event
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .zip(values)
            .collect();
        Self {
            address,
            name: event.name.clone(),
            signature: crate::utils::event_signature(event),
            log_index,
            args,
        }
    }

    /// Decodifica um log bruto usando a definição do evento
    pub fn decode(event: &Event, log: &Log) -> Result<Self> {
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        let parsed = event
            .parse_log(raw)
            .map_err(|e| Error::DecodeError(format!("Falha ao decodificar log {}: {}", event.name, e)))?;

        Ok(Self {
            address: log.address,
            name: event.name.clone(),
            signature: crate::utils::event_signature(event),
            log_index: log.log_index.map(|i| i.as_u64()).unwrap_or_default(),
            args: parsed.params.into_iter().map(|p| (p.name, p.value)).collect(),
        })
    }

    /// Obtém um argumento pelo nome
    pub fn arg(&self, name: &str) -> Option<&Token> {
        self.args
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value)
    }
}

/// Evento de transação entregue pelo runtime hospedeiro
#[derive(Debug, Clone, Default)]
pub struct TransactionEvent {
    pub hash: TransactionHash,
    pub block_number: u64,
    /// Endereços envolvidos na transação
    pub addresses: HashSet<Address>,
    pub logs: Vec<DecodedLog>,
}

impl TransactionEvent {
    pub fn new(hash: TransactionHash, block_number: u64) -> Self {
        Self {
            hash,
            block_number,
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.insert(address);
        self
    }

    pub fn with_log(mut self, log: DecodedLog) -> Self {
        self.addresses.insert(log.address);
        self.logs.push(log);
        self
    }

    /// Verifica se o endereço participou da transação
    pub fn involves(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Filtra os logs emitidos por `address` cuja assinatura esteja em `signatures`,
    /// preservando a ordem original dos logs.
    pub fn filter_log<S: AsRef<str>>(&self, signatures: &[S], address: Address) -> Vec<&DecodedLog> {
        self.logs
            .iter()
            .filter(|log| log.address == address)
            .filter(|log| signatures.iter().any(|sig| sig.as_ref() == log.signature))
            .collect()
    }
}

/// Evento de bloco entregue pelo runtime hospedeiro
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEvent {
    pub number: u64,
    pub hash: H256,
    pub timestamp: u64,
}

impl BlockEvent {
    pub fn new(number: u64, hash: H256, timestamp: u64) -> Self {
        Self { number, hash, timestamp }
    }
}
