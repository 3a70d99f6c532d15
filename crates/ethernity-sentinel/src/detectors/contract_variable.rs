use super::{Capabilities, Detector};
use crate::abi::AbiRegistry;
use crate::config::{self, AgentConfig};
use crate::rolling_window::RollingWindow;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use ethernity_core::traits::ContractReader;
use ethernity_core::{utils, BlockEvent, Error, Finding, FindingSeverity, FindingType, Result};
use ethers::abi::{Function, Token};
use ethers::types::{Address, I256};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const AGENT_TYPE: &str = "contract-variable-monitor";
const ALERT_SUFFIX: &str = "CONTRACT-VARIABLE";
const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;
/// Casas decimais exibidas nos metadados de percentual
const PERCENT_DISPLAY_SCALE: i64 = 18;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorSettings {
    #[serde(default)]
    contracts: Map<String, Value>,
    call_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractEntry {
    address: Option<String>,
    abi_file: Option<String>,
    #[serde(default)]
    variables: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableEntry {
    #[serde(rename = "type")]
    finding_type: FindingType,
    severity: FindingSeverity,
    upper_threshold_percent: Option<BigDecimal>,
    lower_threshold_percent: Option<BigDecimal>,
    num_data_points: usize,
    min_num_elements: Option<usize>,
}

/// Lado do limite ultrapassado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdPosition {
    Upper,
    Lower,
}

impl ThresholdPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdPosition::Upper => "upper",
            ThresholdPosition::Lower => "lower",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ThresholdPosition::Upper => "superior",
            ThresholdPosition::Lower => "inferior",
        }
    }
}

/// Resultado de uma avaliação que ultrapassou o limite configurado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCrossing {
    pub position: ThresholdPosition,
    pub limit: BigDecimal,
    pub percent: BigDecimal,
}

/// Variável de contrato acompanhada a cada bloco
#[derive(Debug, Clone)]
pub struct MonitoredVariable {
    pub name: String,
    pub contract_name: String,
    pub contract: Address,
    pub finding_type: FindingType,
    pub severity: FindingSeverity,
    pub upper_threshold_percent: Option<BigDecimal>,
    pub lower_threshold_percent: Option<BigDecimal>,
    pub min_num_elements: usize,
    getter: Function,
    window: RollingWindow,
}

impl MonitoredVariable {
    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Avalia `value` contra a janela atual e em seguida registra a amostra
    pub fn observe(&mut self, value: BigDecimal) -> Option<ThresholdCrossing> {
        let crossing = self.evaluate(&value);
        self.window.add_element(value);
        crossing
    }

    /// Compara `value` com a média da janela, sem alterá-la
    pub fn evaluate(&self, value: &BigDecimal) -> Option<ThresholdCrossing> {
        if self.window.len() < self.min_num_elements {
            return None;
        }

        let average = match self.window.average() {
            Ok(average) => average,
            Err(e) => {
                debug!(variable = %self.name, error = %e, "média indisponível");
                return None;
            }
        };

        // percentual indefinido com média zero
        if average.is_zero() {
            return None;
        }

        let (position, limit, diff) = if *value > average {
            (
                ThresholdPosition::Upper,
                self.upper_threshold_percent.as_ref()?,
                value - &average,
            )
        } else if *value < average {
            (
                ThresholdPosition::Lower,
                self.lower_threshold_percent.as_ref()?,
                &average - value,
            )
        } else {
            return None;
        };

        let percent = diff / &average * BigDecimal::from(100u64);

        (percent > *limit).then(|| ThresholdCrossing {
            position,
            limit: limit.clone(),
            percent,
        })
    }
}

/// Estado do monitor: variáveis na ordem da configuração
#[derive(Debug)]
pub struct ContractVariableState {
    config: AgentConfig,
    call_timeout: Duration,
    variables: Vec<MonitoredVariable>,
}

impl ContractVariableState {
    pub fn variables(&self) -> &[MonitoredVariable] {
        &self.variables
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

/// Monitor de variáveis de contrato baseado em média móvel.
///
/// A cada bloco lê o valor atual de cada variável e compara o desvio percentual
/// em relação à média das últimas amostras com os limites superior e inferior.
pub struct ContractVariableMonitor {
    reader: Arc<dyn ContractReader>,
    abis: Arc<AbiRegistry>,
}

impl ContractVariableMonitor {
    pub fn new(reader: Arc<dyn ContractReader>, abis: Arc<AbiRegistry>) -> Self {
        Self { reader, abis }
    }

    fn build_variables(&self, config: &AgentConfig, settings: &MonitorSettings) -> Result<Vec<MonitoredVariable>> {
        if settings.contracts.is_empty() {
            return Err(Error::ConfigError(format!(
                "Nenhum contrato configurado para '{}'",
                config.name
            )));
        }

        let mut variables = Vec::new();
        for (contract_name, entry) in config::ordered_entries::<ContractEntry>(&settings.contracts)? {
            let contract = config::parse_address(&contract_name, entry.address.as_deref())?;
            let abi_file = entry.abi_file.as_deref().ok_or_else(|| {
                Error::ConfigError(format!("Nenhum arquivo de ABI configurado para '{}'", contract_name))
            })?;
            let abi = self.abis.get(abi_file)?;

            for (name, variable) in config::ordered_entries::<VariableEntry>(&entry.variables)? {
                let getter = abi.function(&name).map_err(|_| {
                    Error::ConfigError(format!("ABI '{}' não possui a função '{}'", abi_file, name))
                })?;
                if !getter.inputs.is_empty() {
                    return Err(Error::ConfigError(format!(
                        "A função '{}' de '{}' exige argumentos",
                        name, contract_name
                    )));
                }

                variables.push(build_variable(&contract_name, contract, name, getter.clone(), variable)?);
            }
        }

        if variables.is_empty() {
            return Err(Error::ConfigError(format!(
                "Nenhuma variável configurada para '{}'",
                config.name
            )));
        }

        Ok(variables)
    }
}

fn build_variable(
    contract_name: &str,
    contract: Address,
    name: String,
    getter: Function,
    entry: VariableEntry,
) -> Result<MonitoredVariable> {
    if entry.upper_threshold_percent.is_none() && entry.lower_threshold_percent.is_none() {
        return Err(Error::ConfigError(format!(
            "A variável '{}' precisa de upperThresholdPercent ou lowerThresholdPercent",
            name
        )));
    }
    let negative = [&entry.upper_threshold_percent, &entry.lower_threshold_percent]
        .into_iter()
        .flatten()
        .any(|limit| *limit < BigDecimal::zero());
    if negative {
        return Err(Error::ConfigError(format!("Limites negativos para '{}'", name)));
    }

    let capacity = NonZeroUsize::new(entry.num_data_points).ok_or_else(|| {
        Error::ConfigError(format!("numDataPoints deve ser maior que zero para '{}'", name))
    })?;
    let min_num_elements = entry.min_num_elements.unwrap_or(capacity.get());
    if min_num_elements == 0 || min_num_elements > capacity.get() {
        return Err(Error::ConfigError(format!(
            "minNumElements de '{}' deve estar entre 1 e {}",
            name, capacity
        )));
    }

    Ok(MonitoredVariable {
        name,
        contract_name: contract_name.to_string(),
        contract,
        finding_type: entry.finding_type,
        severity: entry.severity,
        upper_threshold_percent: entry.upper_threshold_percent,
        lower_threshold_percent: entry.lower_threshold_percent,
        min_num_elements,
        getter,
        window: RollingWindow::new(capacity),
    })
}

/// Converte a saída de um getter numérico para decimal sem perda de precisão
pub fn token_to_decimal(token: &Token) -> Result<BigDecimal> {
    let text = match token {
        Token::Uint(value) => value.to_string(),
        Token::Int(value) => I256::from_raw(*value).to_string(),
        other => {
            return Err(Error::DecodeError(format!("Valor não numérico: {:?}", other)));
        }
    };
    BigDecimal::from_str(&text)
        .map_err(|e| Error::DecodeError(format!("Valor {} não representável: {}", text, e)))
}

/// Texto decimal sem zeros à direita nem expoente, como aparece nos metadados
pub fn decimal_text(value: &BigDecimal) -> String {
    let normalized = value.round(PERCENT_DISPLAY_SCALE).normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale < 0 {
        normalized.with_scale(0).to_string()
    } else {
        normalized.to_string()
    }
}

async fn read_value(reader: &dyn ContractReader, variable: &MonitoredVariable, timeout: Duration) -> Result<BigDecimal> {
    let outputs = tokio::time::timeout(timeout, reader.call(variable.contract, &variable.getter, &[]))
        .await
        .map_err(|_| {
            Error::TimeoutError(format!(
                "Leitura de '{}' excedeu {} ms",
                variable.name,
                timeout.as_millis()
            ))
        })??;

    let token = outputs
        .first()
        .ok_or_else(|| Error::DecodeError(format!("Leitura de '{}' sem retorno", variable.name)))?;
    token_to_decimal(token)
}

fn variable_finding(config: &AgentConfig, variable: &MonitoredVariable, crossing: &ThresholdCrossing) -> Finding {
    let limit = decimal_text(&crossing.limit);
    Finding::new(
        format!("{} Contract Variable", config.protocol_name),
        format!(
            "O valor da variável {} no contrato {} ultrapassou o limite {} de {} por cento",
            variable.name,
            variable.contract_name,
            crossing.position.label(),
            limit
        ),
        config.alert_id(ALERT_SUFFIX),
        variable.finding_type,
        variable.severity,
        config.protocol_name.clone(),
    )
    .with_metadata("contractName", variable.contract_name.as_str())
    .with_metadata("contractAddress", utils::format_address(&variable.contract))
    .with_metadata("variableName", variable.name.as_str())
    .with_metadata("thresholdPosition", crossing.position.as_str())
    .with_metadata("thresholdPercentLimit", limit)
    .with_metadata("actualPercentChange", decimal_text(&crossing.percent))
}

#[async_trait]
impl Detector for ContractVariableMonitor {
    type State = ContractVariableState;

    fn agent_type(&self) -> &str {
        AGENT_TYPE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none().with_initialize().with_blocks()
    }

    async fn initialize(&self, config: AgentConfig) -> Result<ContractVariableState> {
        config.validate_identity()?;
        let settings: MonitorSettings = config.settings()?;
        let variables = self.build_variables(&config, &settings)?;
        let call_timeout = Duration::from_millis(settings.call_timeout_ms.unwrap_or(DEFAULT_CALL_TIMEOUT_MS));

        info!(
            agent = %config.name,
            variables = variables.len(),
            "monitor de variáveis inicializado"
        );

        Ok(ContractVariableState {
            config,
            call_timeout,
            variables,
        })
    }

    async fn handle_block(&self, state: &mut ContractVariableState, block: &BlockEvent) -> Result<Vec<Finding>> {
        let reader = self.reader.as_ref();
        let timeout = state.call_timeout;
        let config = &state.config;
        let block_number = block.number;

        let evaluations = state.variables.iter_mut().map(move |variable| async move {
            let value = match read_value(reader, variable, timeout).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        block = block_number,
                        variable = %variable.name,
                        contract = %variable.contract_name,
                        error = %e,
                        "leitura descartada neste bloco"
                    );
                    return None;
                }
            };

            let crossing = variable.observe(value)?;
            debug!(
                block = block_number,
                variable = %variable.name,
                position = crossing.position.as_str(),
                percent = %crossing.percent,
                "limite ultrapassado"
            );
            Some(variable_finding(config, variable, &crossing))
        });

        Ok(join_all(evaluations).await.into_iter().flatten().collect())
    }
}
