use ethernity_core::{utils, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Política de agregação quando um detector falha durante um evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Qualquer falha invalida a chamada inteira
    #[default]
    FailFast,
    /// Falhas são isoladas por detector e reportadas junto dos alertas parciais
    Isolate,
}

/// Parâmetros de execução do orquestrador
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Entrada de detector como aparece no arquivo de configuração
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    pub agent_type: String,
    pub name: String,
    /// Demais chaves (contratos, limites) específicas de cada detector
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// Configuração raiz do monitoramento
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelConfig {
    pub developer_abbreviation: String,
    pub protocol_name: String,
    pub protocol_abbreviation: String,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl SentinelConfig {
    /// Deserializa a configuração a partir de JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Falha ao deserializar configuração: {}", e)))
    }

    /// Combina a identidade do protocolo com cada entrada de detector
    pub fn agent_configs(&self) -> Vec<AgentConfig> {
        self.agents
            .iter()
            .map(|agent| AgentConfig {
                developer_abbreviation: self.developer_abbreviation.clone(),
                protocol_name: self.protocol_name.clone(),
                protocol_abbreviation: self.protocol_abbreviation.clone(),
                agent_type: agent.agent_type.clone(),
                name: agent.name.clone(),
                settings: agent.settings.clone(),
            })
            .collect()
    }
}

/// Configuração completa de uma instância de detector.
///
/// Imutável depois de montada; cada detector lê suas próprias chaves via [`AgentConfig::settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub developer_abbreviation: String,
    pub protocol_name: String,
    pub protocol_abbreviation: String,
    pub agent_type: String,
    pub name: String,
    pub settings: Map<String, Value>,
}

impl AgentConfig {
    /// Deserializa as configurações específicas do detector
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.settings.clone())).map_err(|e| {
            Error::ConfigError(format!("Configuração inválida para '{}': {}", self.name, e))
        })
    }

    /// Identificador de alerta para este protocolo
    pub fn alert_id(&self, suffix: &str) -> String {
        utils::alert_id(&self.developer_abbreviation, &self.protocol_abbreviation, suffix)
    }

    /// Valida os campos de identidade comuns a todos os detectores
    pub fn validate_identity(&self) -> Result<()> {
        if !utils::is_filled(&self.developer_abbreviation) {
            return Err(Error::ConfigError("developerAbbreviation obrigatório".to_string()));
        }
        if !utils::is_filled(&self.protocol_name) {
            return Err(Error::ConfigError("protocolName obrigatório".to_string()));
        }
        if !utils::is_filled(&self.protocol_abbreviation) {
            return Err(Error::ConfigError("protocolAbbreviation obrigatório".to_string()));
        }
        Ok(())
    }
}

/// Deserializa as entradas de um objeto JSON preservando a ordem da configuração
pub fn ordered_entries<T: DeserializeOwned>(map: &Map<String, Value>) -> Result<Vec<(String, T)>> {
    map.iter()
        .map(|(key, value)| {
            let entry = serde_json::from_value(value.clone()).map_err(|e| {
                Error::ConfigError(format!("Entrada inválida para '{}': {}", key, e))
            })?;
            Ok((key.clone(), entry))
        })
        .collect()
}

/// Converte o endereço configurado, rejeitando valores vazios ou malformados
pub fn parse_address(name: &str, address: Option<&str>) -> Result<ethers::types::Address> {
    let address = address
        .filter(|a| utils::is_filled(a))
        .ok_or_else(|| Error::ConfigError(format!("Nenhum endereço configurado para '{}'", name)))?;
    utils::hex_to_address(address)
        .ok_or_else(|| Error::ConfigError(format!("Endereço inválido para '{}': {}", name, address)))
}
