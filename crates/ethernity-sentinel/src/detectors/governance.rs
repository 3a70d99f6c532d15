use super::{Capabilities, Detector};
use crate::abi::{self, AbiRegistry};
use crate::config::{self, AgentConfig};
use async_trait::async_trait;
use ethernity_core::{
    utils, DecodedLog, Error, Finding, FindingSeverity, FindingType, Result, TransactionEvent,
};
use ethers::abi::Token;
use ethers::types::{Address, U256};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const AGENT_TYPE: &str = "governance";

/// Eventos que toda ABI de governança precisa declarar
pub const MINIMUM_EVENTS: [&str; 4] = [
    "ProposalCreated",
    "VoteCast",
    "ProposalCanceled",
    "ProposalExecuted",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GovernanceSettings {
    #[serde(default)]
    contracts: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractEntry {
    address: Option<String>,
    governance: Option<GovernanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GovernanceEntry {
    abi_file: Option<String>,
}

/// Proposta completa extraída de `ProposalCreated`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proposal_id: String,
    pub proposer: String,
    pub targets: String,
    pub values: String,
    pub signatures: String,
    pub calldatas: String,
    pub start_block: String,
    pub end_block: String,
    pub description: String,
}

/// Voto extraído de `VoteCast`/`VoteCastWithParams`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: String,
    pub proposal_id: String,
    pub support: U256,
    pub weight: String,
    pub reason: String,
}

impl Vote {
    /// Trecho da descrição correspondente ao código `support`
    pub fn support_phrase(&self) -> String {
        let code = (self.support <= U256::from(u8::MAX)).then(|| self.support.low_u64());
        match code {
            Some(0) => "contra a proposta".to_string(),
            Some(1) => "a favor da proposta".to_string(),
            Some(2) => "com abstenção na proposta".to_string(),
            _ => format!("com suporte desconhecido \"{}\" para a proposta", self.support),
        }
    }
}

/// Classificação fechada dos logs de um contrato de governança
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceEvent {
    ProposalCreated(Proposal),
    VoteCast(Vote),
    ProposalCanceled { proposal_id: String },
    ProposalExecuted { proposal_id: String },
    ProposalQueued { proposal_id: String, eta: String },
    QuorumNumeratorUpdated { old: String, new: String },
    TimelockChange { old: String, new: String },
    VotingDelaySet { old: String, new: String },
    VotingPeriodSet { old: String, new: String },
    ProposalThresholdSet { old: String, new: String },
    /// Evento fora da taxonomia; não gera alerta
    Unrecognized(String),
}

fn arg<'a>(log: &'a DecodedLog, names: &[&str]) -> Result<&'a Token> {
    names
        .iter()
        .find_map(|name| log.arg(name))
        .ok_or_else(|| {
            Error::DecodeError(format!("Log {} sem o argumento {}", log.name, names.join("/")))
        })
}

fn arg_text(log: &DecodedLog, names: &[&str]) -> Result<String> {
    arg(log, names).map(utils::format_token)
}

fn arg_uint(log: &DecodedLog, names: &[&str]) -> Result<U256> {
    match arg(log, names)? {
        Token::Uint(value) => Ok(*value),
        other => Err(Error::DecodeError(format!(
            "Argumento {} de {} não é inteiro: {:?}",
            names.join("/"),
            log.name,
            other
        ))),
    }
}

impl GovernanceEvent {
    /// Classifica o log estritamente pelo nome do evento
    pub fn classify(log: &DecodedLog) -> Result<Self> {
        let event = match log.name.as_str() {
            "ProposalCreated" => GovernanceEvent::ProposalCreated(Proposal {
                proposal_id: arg_text(log, &["proposalId"])?,
                proposer: arg_text(log, &["proposer"])?,
                targets: arg_text(log, &["targets"])?,
                values: arg_text(log, &["values"])?,
                signatures: arg_text(log, &["signatures"])?,
                calldatas: arg_text(log, &["calldatas"])?,
                start_block: arg_text(log, &["startBlock", "voteStart"])?,
                end_block: arg_text(log, &["endBlock", "voteEnd"])?,
                description: arg_text(log, &["description"])?,
            }),
            "VoteCast" | "VoteCastWithParams" => GovernanceEvent::VoteCast(Vote {
                voter: arg_text(log, &["voter"])?,
                proposal_id: arg_text(log, &["proposalId"])?,
                support: arg_uint(log, &["support"])?,
                weight: arg_text(log, &["weight"])?,
                reason: arg_text(log, &["reason"])?,
            }),
            "ProposalCanceled" => GovernanceEvent::ProposalCanceled {
                proposal_id: arg_text(log, &["proposalId"])?,
            },
            "ProposalExecuted" => GovernanceEvent::ProposalExecuted {
                proposal_id: arg_text(log, &["proposalId"])?,
            },
            "ProposalQueued" => GovernanceEvent::ProposalQueued {
                proposal_id: arg_text(log, &["proposalId"])?,
                eta: arg_text(log, &["eta", "etaSeconds"])?,
            },
            "QuorumNumeratorUpdated" => GovernanceEvent::QuorumNumeratorUpdated {
                old: arg_text(log, &["oldQuorumNumerator"])?,
                new: arg_text(log, &["newQuorumNumerator"])?,
            },
            "TimelockChange" => GovernanceEvent::TimelockChange {
                old: arg_text(log, &["oldTimelock"])?,
                new: arg_text(log, &["newTimelock"])?,
            },
            "VotingDelaySet" => GovernanceEvent::VotingDelaySet {
                old: arg_text(log, &["oldVotingDelay"])?,
                new: arg_text(log, &["newVotingDelay"])?,
            },
            "VotingPeriodSet" => GovernanceEvent::VotingPeriodSet {
                old: arg_text(log, &["oldVotingPeriod"])?,
                new: arg_text(log, &["newVotingPeriod"])?,
            },
            "ProposalThresholdSet" => GovernanceEvent::ProposalThresholdSet {
                old: arg_text(log, &["oldProposalThreshold"])?,
                new: arg_text(log, &["newProposalThreshold"])?,
            },
            other => GovernanceEvent::Unrecognized(other.to_string()),
        };
        Ok(event)
    }

    /// Constrói o alerta correspondente; `None` apenas para eventos não reconhecidos
    pub fn finding(&self, address: Address, config: &AgentConfig) -> Option<Finding> {
        let address = utils::format_address(&address);
        let protocol = &config.protocol_name;

        let finding = match self {
            GovernanceEvent::ProposalCreated(proposal) => info_finding(
                config,
                format!("{} Governance Proposal Created", protocol),
                format!("Proposta de governança {} foi criada", proposal.proposal_id),
                "PROPOSAL-CREATED",
            )
            .with_metadata("address", address)
            .with_metadata("proposalId", proposal.proposal_id.as_str())
            .with_metadata("proposer", proposal.proposer.as_str())
            .with_metadata("targets", proposal.targets.as_str())
            .with_metadata("values", proposal.values.as_str())
            .with_metadata("signatures", proposal.signatures.as_str())
            .with_metadata("calldatas", proposal.calldatas.as_str())
            .with_metadata("startBlock", proposal.start_block.as_str())
            .with_metadata("endBlock", proposal.end_block.as_str())
            .with_metadata("description", proposal.description.as_str()),
            GovernanceEvent::VoteCast(vote) => info_finding(
                config,
                format!("{} Governance Proposal Vote Cast", protocol),
                format!(
                    "Voto registrado com peso {} {} {}",
                    vote.weight,
                    vote.support_phrase(),
                    vote.proposal_id
                ),
                "VOTE-CAST",
            )
            .with_metadata("address", address)
            .with_metadata("voter", vote.voter.as_str())
            .with_metadata("proposalId", vote.proposal_id.as_str())
            .with_metadata("support", vote.support.to_string())
            .with_metadata("weight", vote.weight.as_str())
            .with_metadata("reason", vote.reason.as_str()),
            GovernanceEvent::ProposalCanceled { proposal_id } => lifecycle_finding(
                config,
                &address,
                proposal_id,
                "Canceled",
                "cancelada",
                "canceled",
            ),
            GovernanceEvent::ProposalExecuted { proposal_id } => lifecycle_finding(
                config,
                &address,
                proposal_id,
                "Executed",
                "executada",
                "executed",
            ),
            GovernanceEvent::ProposalQueued { proposal_id, eta } => lifecycle_finding(
                config,
                &address,
                proposal_id,
                "Queued",
                "enfileirada",
                "queued",
            )
            .with_metadata("eta", eta.as_str()),
            GovernanceEvent::QuorumNumeratorUpdated { old, new } => change_finding(
                config,
                &address,
                "Quorum Numerator Updated",
                format!("Numerador de quorum alterado de {} para {}", old, new),
                "GOVERNANCE-QUORUM-NUMERATOR-UPDATED",
                [("oldNumerator", old), ("newNumerator", new)],
            ),
            GovernanceEvent::TimelockChange { old, new } => change_finding(
                config,
                &address,
                "Timelock Address Change",
                format!("Endereço do timelock alterado de {} para {}", old, new),
                "GOVERNANCE-TIMELOCK-ADDRESS-CHANGED",
                [("oldTimelockAddress", old), ("newTimelockAddress", new)],
            ),
            GovernanceEvent::VotingDelaySet { old, new } => change_finding(
                config,
                &address,
                "Voting Delay Set",
                format!("Atraso de votação alterado de {} para {}", old, new),
                "GOVERNANCE-VOTING-DELAY-SET",
                [("oldVotingDelay", old), ("newVotingDelay", new)],
            ),
            GovernanceEvent::VotingPeriodSet { old, new } => change_finding(
                config,
                &address,
                "Voting Period Set",
                format!("Período de votação alterado de {} para {}", old, new),
                "GOVERNANCE-VOTING-PERIOD-SET",
                [("oldVotingPeriod", old), ("newVotingPeriod", new)],
            ),
            GovernanceEvent::ProposalThresholdSet { old, new } => change_finding(
                config,
                &address,
                "Proposal Threshold Set",
                format!("Limite de proposta alterado de {} para {}", old, new),
                "GOVERNANCE-PROPOSAL-THRESHOLD-SET",
                [("oldThreshold", old), ("newThreshold", new)],
            ),
            GovernanceEvent::Unrecognized(_) => return None,
        };

        Some(finding)
    }
}

fn info_finding(config: &AgentConfig, name: String, description: String, suffix: &str) -> Finding {
    Finding::new(
        name,
        description,
        config.alert_id(suffix),
        FindingType::Info,
        FindingSeverity::Info,
        config.protocol_name.clone(),
    )
}

fn lifecycle_finding(
    config: &AgentConfig,
    address: &str,
    proposal_id: &str,
    title: &str,
    verb: &str,
    state: &str,
) -> Finding {
    info_finding(
        config,
        format!("{} Governance Proposal {}", config.protocol_name, title),
        format!("Proposta de governança {} foi {}", proposal_id, verb),
        &format!("GOVERNANCE-PROPOSAL-{}", state.to_uppercase()),
    )
    .with_metadata("address", address)
    .with_metadata("proposalId", proposal_id)
    .with_metadata("state", state)
}

fn change_finding(
    config: &AgentConfig,
    address: &str,
    title: &str,
    description: String,
    suffix: &str,
    values: [(&str, &String); 2],
) -> Finding {
    let [(old_key, old), (new_key, new)] = values;
    info_finding(
        config,
        format!("{} Governance {}", config.protocol_name, title),
        description,
        suffix,
    )
    .with_metadata("address", address)
    .with_metadata(old_key, old.as_str())
    .with_metadata(new_key, new.as_str())
}

/// Contrato de governança e as assinaturas de evento reconhecidas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedContract {
    pub name: String,
    pub address: Address,
    pub event_signatures: Vec<String>,
}

#[derive(Debug)]
pub struct GovernanceState {
    config: AgentConfig,
    contracts: Vec<WatchedContract>,
}

impl GovernanceState {
    pub fn contracts(&self) -> &[WatchedContract] {
        &self.contracts
    }
}

/// Acompanha o ciclo de vida de propostas e mudanças de parâmetros de governança
pub struct GovernanceDetector {
    abis: Arc<AbiRegistry>,
}

impl GovernanceDetector {
    pub fn new(abis: Arc<AbiRegistry>) -> Self {
        Self { abis }
    }

    fn watched_contracts(&self, config: &AgentConfig) -> Result<Vec<WatchedContract>> {
        let settings: GovernanceSettings = config.settings()?;
        if settings.contracts.is_empty() {
            return Err(Error::ConfigError(format!(
                "Nenhum contrato configurado para '{}'",
                config.name
            )));
        }

        let mut contracts = Vec::with_capacity(settings.contracts.len());
        for (name, value) in &settings.contracts {
            let is_empty_object = value.as_object().map_or(true, |entry| entry.is_empty());
            if is_empty_object {
                return Err(Error::ConfigError(format!(
                    "Contrato '{}' sem configuração",
                    name
                )));
            }
            let entry: ContractEntry = serde_json::from_value(value.clone()).map_err(|e| {
                Error::ConfigError(format!("Entrada inválida para '{}': {}", name, e))
            })?;

            let address = config::parse_address(name, entry.address.as_deref())?;
            let abi_file = entry
                .governance
                .and_then(|g| g.abi_file)
                .ok_or_else(|| {
                    Error::ConfigError(format!("Nenhum arquivo de ABI configurado para '{}'", name))
                })?;
            let abi = self.abis.get(&abi_file)?;
            abi::require_events(abi, &MINIMUM_EVENTS)?;

            contracts.push(WatchedContract {
                name: name.clone(),
                address,
                event_signatures: abi::event_signatures(abi),
            });
        }

        Ok(contracts)
    }
}

#[async_trait]
impl Detector for GovernanceDetector {
    type State = GovernanceState;

    fn agent_type(&self) -> &str {
        AGENT_TYPE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none().with_initialize().with_transactions()
    }

    async fn initialize(&self, config: AgentConfig) -> Result<GovernanceState> {
        config.validate_identity()?;
        let contracts = self.watched_contracts(&config)?;

        info!(
            agent = %config.name,
            contracts = contracts.len(),
            "detector de governança inicializado"
        );

        Ok(GovernanceState { config, contracts })
    }

    async fn handle_transaction(&self, state: &mut GovernanceState, tx: &TransactionEvent) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for contract in &state.contracts {
            for log in tx.filter_log(&contract.event_signatures, contract.address) {
                let event = match GovernanceEvent::classify(log) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(
                            tx = ?tx.hash,
                            contract = %contract.name,
                            event = %log.name,
                            error = %e,
                            "log de governança ignorado"
                        );
                        continue;
                    }
                };

                match event.finding(contract.address, &state.config) {
                    Some(finding) => findings.push(finding),
                    None => debug!(event = %log.name, "evento fora da taxonomia de governança"),
                }
            }
        }

        Ok(findings)
    }
}
