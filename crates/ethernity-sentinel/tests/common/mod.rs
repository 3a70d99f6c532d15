#![allow(dead_code)]

use async_trait::async_trait;
use ethernity_core::traits::ContractReader;
use ethernity_core::{DecodedLog, Error, Result};
use ethernity_sentinel::{AbiRegistry, AgentConfig};
use ethers::abi::{parse_abi, Abi, Function, Token};
use ethers::types::{Address, U256};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

pub const GOVERNOR: &str = "0x00000000000000000000000000000000000000aa";
pub const SECOND_GOVERNOR: &str = "0x00000000000000000000000000000000000000bb";
pub const TOKEN: &str = "0x00000000000000000000000000000000000000cc";
pub const WATCHED: &str = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";

pub fn addr(hex: &str) -> Address {
    ethernity_core::utils::hex_to_address(hex).expect("endereço de teste válido")
}

pub fn governor_abi() -> Abi {
    parse_abi(&[
        "event ProposalCreated(uint256 proposalId, address proposer, address[] targets, uint256[] values, string[] signatures, bytes[] calldatas, uint256 startBlock, uint256 endBlock, string description)",
        "event VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 weight, string reason)",
        "event ProposalCanceled(uint256 proposalId)",
        "event ProposalExecuted(uint256 proposalId)",
        "event ProposalQueued(uint256 proposalId, uint256 eta)",
        "event QuorumNumeratorUpdated(uint256 oldQuorumNumerator, uint256 newQuorumNumerator)",
        "event TimelockChange(address oldTimelock, address newTimelock)",
        "event VotingDelaySet(uint256 oldVotingDelay, uint256 newVotingDelay)",
        "event VotingPeriodSet(uint256 oldVotingPeriod, uint256 newVotingPeriod)",
        "event ProposalThresholdSet(uint256 oldProposalThreshold, uint256 newProposalThreshold)",
        "event DelegateChanged(address indexed delegator, address indexed fromDelegate, address indexed toDelegate)",
    ])
    .expect("ABI de governança válida")
}

/// ABI de governança sem `ProposalExecuted`
pub fn incomplete_governor_abi() -> Abi {
    parse_abi(&[
        "event ProposalCreated(uint256 proposalId, address proposer, address[] targets, uint256[] values, string[] signatures, bytes[] calldatas, uint256 startBlock, uint256 endBlock, string description)",
        "event VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 weight, string reason)",
        "event ProposalCanceled(uint256 proposalId)",
    ])
    .expect("ABI parcial válida")
}

pub fn token_abi() -> Abi {
    parse_abi(&[
        "function totalSupply() external view returns (uint256)",
        "function price() external view returns (int256)",
        "function reserve() external view returns (uint256)",
        "function balanceOf(address owner) external view returns (uint256)",
        "event Transfer(address indexed from, address indexed to, uint256 value)",
    ])
    .expect("ABI de token válida")
}

pub fn registry() -> Arc<AbiRegistry> {
    Arc::new(
        AbiRegistry::new()
            .with_abi("governor", governor_abi())
            .with_abi("governor-incomplete", incomplete_governor_abi())
            .with_abi("token", token_abi()),
    )
}

pub fn agent(agent_type: &str, name: &str, settings: Value) -> AgentConfig {
    AgentConfig {
        developer_abbreviation: "DEVTEST".to_string(),
        protocol_name: "PROTOTEST".to_string(),
        protocol_abbreviation: "PT".to_string(),
        agent_type: agent_type.to_string(),
        name: name.to_string(),
        settings: settings.as_object().cloned().unwrap_or_default(),
    }
}

/// Monta um log decodificado para o evento `name` da ABI de governança
pub fn governor_log(address: &str, log_index: u64, name: &str, values: Vec<Token>) -> DecodedLog {
    let abi = governor_abi();
    let event = abi.event(name).expect("evento presente na ABI");
    DecodedLog::from_event(event, addr(address), log_index, values)
}

pub fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

pub fn proposal_created(address: &str, log_index: u64, proposal_id: u64) -> DecodedLog {
    governor_log(
        address,
        log_index,
        "ProposalCreated",
        vec![
            uint(proposal_id),
            Token::Address(addr(WATCHED)),
            Token::Array(vec![Token::Address(addr(TOKEN))]),
            Token::Array(vec![uint(0)]),
            Token::Array(vec![Token::String("transfer(address,uint256)".to_string())]),
            Token::Array(vec![Token::Bytes(vec![0xde, 0xad])]),
            uint(100),
            uint(200),
            Token::String("Aumentar o quorum".to_string()),
        ],
    )
}

#[derive(Debug, Clone)]
pub enum MockResponse {
    Value(Token),
    Fail,
    Hang,
}

/// Leitor de contratos com respostas enfileiradas por função
#[derive(Default)]
pub struct MockReader {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, function: &str, delay: Duration) -> Self {
        self.delays.insert(function.to_string(), delay);
        self
    }

    pub fn push(&self, function: &str, response: MockResponse) {
        self.responses
            .lock()
            .entry(function.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn push_values(&self, function: &str, values: &[u64]) {
        for value in values {
            self.push(function, MockResponse::Value(uint(*value)));
        }
    }

    /// Enfileira valores `uint256` em notação decimal, para além do alcance de `u64`
    pub fn push_decimals(&self, function: &str, values: &[&str]) {
        for value in values {
            let value = U256::from_dec_str(value).expect("uint256 decimal válido");
            self.push(function, MockResponse::Value(Token::Uint(value)));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn call(&self, _contract: Address, function: &Function, _args: &[Token]) -> Result<Vec<Token>> {
        if let Some(delay) = self.delays.get(&function.name) {
            tokio::time::sleep(*delay).await;
        }

        self.calls.lock().push(function.name.clone());
        let response = self
            .responses
            .lock()
            .get_mut(&function.name)
            .and_then(|queue| queue.pop_front());

        match response {
            Some(MockResponse::Value(token)) => Ok(vec![token]),
            Some(MockResponse::Fail) => Err(Error::RpcError("execution reverted".to_string())),
            Some(MockResponse::Hang) => std::future::pending::<Result<Vec<Token>>>().await,
            None => Err(Error::NotFound(format!("sem resposta para {}", function.name))),
        }
    }
}
