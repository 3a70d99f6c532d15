use crate::config::AgentConfig;
use async_trait::async_trait;
use ethernity_core::{BlockEvent, Finding, Result, TransactionEvent};

pub mod address_watch;
pub mod contract_variable;
pub mod governance;

pub use address_watch::AddressWatch;
pub use contract_variable::ContractVariableMonitor;
pub use governance::GovernanceDetector;

/// Capacidades declaradas por um detector no momento do registro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub initialize: bool,
    pub transaction: bool,
    pub block: bool,
}

impl Capabilities {
    pub const fn none() -> Self {
        Self {
            initialize: false,
            transaction: false,
            block: false,
        }
    }

    pub const fn with_initialize(mut self) -> Self {
        self.initialize = true;
        self
    }

    pub const fn with_transactions(mut self) -> Self {
        self.transaction = true;
        self
    }

    pub const fn with_blocks(mut self) -> Self {
        self.block = true;
        self
    }

    /// Um detector sem nenhum handler nunca produziria alertas
    pub fn has_handler(&self) -> bool {
        self.transaction || self.block
    }
}

/// Unidade de monitoramento com estado próprio.
///
/// O estado é criado por `initialize` e só é alterado pelos handlers do próprio
/// detector; o orquestrador garante no máximo uma chamada em andamento por instância.
#[async_trait]
pub trait Detector: Send + Sync + 'static {
    type State: Send + 'static;

    /// Identificador usado em `agentType` na configuração
    fn agent_type(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Valida a configuração e constrói o estado da instância
    async fn initialize(&self, config: AgentConfig) -> Result<Self::State>;

    async fn handle_transaction(
        &self,
        _state: &mut Self::State,
        _tx: &TransactionEvent,
    ) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }

    async fn handle_block(&self, _state: &mut Self::State, _block: &BlockEvent) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }
}

/// Detector sem estado além da própria configuração
#[async_trait]
pub trait StatelessDetector: Send + Sync + 'static {
    fn agent_type(&self) -> &str;

    fn handles_transactions(&self) -> bool {
        false
    }

    fn handles_blocks(&self) -> bool {
        false
    }

    /// Verificação opcional executada uma única vez, antes do primeiro evento
    fn validate(&self, _config: &AgentConfig) -> Result<()> {
        Ok(())
    }

    async fn handle_transaction(&self, _config: &AgentConfig, _tx: &TransactionEvent) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }

    async fn handle_block(&self, _config: &AgentConfig, _block: &BlockEvent) -> Result<Vec<Finding>> {
        Ok(Vec::new())
    }
}

/// Adapta um [`StatelessDetector`]: o estado da instância é a configuração, sem alterações.
pub struct PassThrough<D>(pub D);

#[async_trait]
impl<D: StatelessDetector> Detector for PassThrough<D> {
    type State = AgentConfig;

    fn agent_type(&self) -> &str {
        self.0.agent_type()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            initialize: false,
            transaction: self.0.handles_transactions(),
            block: self.0.handles_blocks(),
        }
    }

    async fn initialize(&self, config: AgentConfig) -> Result<AgentConfig> {
        self.0.validate(&config)?;
        Ok(config)
    }

    async fn handle_transaction(&self, state: &mut AgentConfig, tx: &TransactionEvent) -> Result<Vec<Finding>> {
        self.0.handle_transaction(state, tx).await
    }

    async fn handle_block(&self, state: &mut AgentConfig, block: &BlockEvent) -> Result<Vec<Finding>> {
        self.0.handle_block(state, block).await
    }
}
