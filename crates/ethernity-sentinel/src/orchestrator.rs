use crate::config::{AgentConfig, FailurePolicy, SentinelConfig};
use crate::detectors::{Capabilities, Detector};
use async_trait::async_trait;
use ethernity_core::{BlockEvent, Error, Finding, Result, TransactionEvent};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Detector com o tipo de estado apagado, como fica guardado no registro
#[async_trait]
trait DetectorModule: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    async fn instantiate(&self, config: AgentConfig) -> Result<Box<dyn DetectorInstance>>;
}

/// Instância inicializada: o detector e o estado que só ele altera
#[async_trait]
trait DetectorInstance: Send {
    async fn on_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Finding>>;

    async fn on_block(&mut self, block: &BlockEvent) -> Result<Vec<Finding>>;
}

struct Module<D> {
    detector: Arc<D>,
    capabilities: Capabilities,
}

#[async_trait]
impl<D: Detector> DetectorModule for Module<D> {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn instantiate(&self, config: AgentConfig) -> Result<Box<dyn DetectorInstance>> {
        let state = self.detector.initialize(config).await?;
        Ok(Box::new(Instance {
            detector: Arc::clone(&self.detector),
            state,
        }))
    }
}

struct Instance<D: Detector> {
    detector: Arc<D>,
    state: D::State,
}

#[async_trait]
impl<D: Detector> DetectorInstance for Instance<D> {
    async fn on_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Finding>> {
        self.detector.handle_transaction(&mut self.state, tx).await
    }

    async fn on_block(&mut self, block: &BlockEvent) -> Result<Vec<Finding>> {
        self.detector.handle_block(&mut self.state, block).await
    }
}

/// Detectores disponíveis, indexados por `agentType`.
///
/// As capacidades de cada detector são lidas uma única vez, no registro.
#[derive(Default)]
pub struct DetectorRegistry {
    modules: HashMap<String, Arc<dyn DetectorModule>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um detector
    pub fn register<D: Detector>(&mut self, detector: D) -> Result<&mut Self> {
        let agent_type = detector.agent_type().to_string();
        let capabilities = detector.capabilities();
        if !capabilities.has_handler() {
            return Err(Error::ConfigError(format!(
                "Detector '{}' não declara nenhum handler",
                agent_type
            )));
        }
        if self.modules.contains_key(&agent_type) {
            return Err(Error::ConfigError(format!(
                "Detector '{}' registrado mais de uma vez",
                agent_type
            )));
        }

        debug!(agent_type = %agent_type, "detector registrado");
        let module = Module {
            detector: Arc::new(detector),
            capabilities,
        };
        self.modules.insert(agent_type, Arc::new(module));
        Ok(self)
    }

    pub fn with<D: Detector>(mut self, detector: D) -> Result<Self> {
        self.register(detector)?;
        Ok(self)
    }

    pub fn contains(&self, agent_type: &str) -> bool {
        self.modules.contains_key(agent_type)
    }

    pub fn capabilities(&self, agent_type: &str) -> Option<Capabilities> {
        self.modules.get(agent_type).map(|module| module.capabilities())
    }

    fn resolve(&self, agent_type: &str) -> Result<&Arc<dyn DetectorModule>> {
        self.modules
            .get(agent_type)
            .ok_or_else(|| Error::ConfigError(format!("Tipo de detector desconhecido: {}", agent_type)))
    }
}

/// Tipo de evento despachado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Transaction,
    Block,
}

#[derive(Clone, Copy)]
enum EventRef<'a> {
    Transaction(&'a TransactionEvent),
    Block(&'a BlockEvent),
}

impl EventRef<'_> {
    fn kind(&self) -> EventKind {
        match self {
            EventRef::Transaction(_) => EventKind::Transaction,
            EventRef::Block(_) => EventKind::Block,
        }
    }
}

struct DetectorSlot {
    agent_type: String,
    name: String,
    capabilities: Capabilities,
    instance: Mutex<Box<dyn DetectorInstance>>,
}

impl DetectorSlot {
    fn supports(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Transaction => self.capabilities.transaction,
            EventKind::Block => self.capabilities.block,
        }
    }
}

/// Falha de uma instância registrada quando a política é [`FailurePolicy::Isolate`]
#[derive(Debug)]
pub struct DetectorFailure {
    pub agent_type: String,
    pub name: String,
    pub error: Error,
}

/// Resultado agregado de um evento
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Alertas na ordem de registro dos detectores
    pub findings: Vec<Finding>,
    pub failures: Vec<DetectorFailure>,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orquestrador de detectores.
///
/// Mantém as instâncias na ordem da configuração, despacha cada evento para
/// todas elas de forma concorrente e concatena os alertas sempre na mesma ordem,
/// independente de qual instância termina primeiro.
pub struct Orchestrator {
    slots: Vec<DetectorSlot>,
    policy: FailurePolicy,
}

impl Orchestrator {
    /// Inicializa todas as instâncias configuradas.
    ///
    /// Se qualquer inicialização falhar nenhum orquestrador é devolvido.
    pub async fn initialize(registry: &DetectorRegistry, config: &SentinelConfig) -> Result<Self> {
        let pending = config.agent_configs().into_iter().map(move |agent| async move {
            let module = registry.resolve(&agent.agent_type)?;
            let capabilities = module.capabilities();
            let agent_type = agent.agent_type.clone();
            let name = agent.name.clone();

            if !capabilities.initialize {
                debug!(agent_type = %agent_type, name = %name, "sem initialize, estado é a própria configuração");
            }

            let instance = module.instantiate(agent).await.map_err(|e| Error::DetectorFailed {
                agent_type: agent_type.clone(),
                name: name.clone(),
                source: Box::new(e),
            })?;

            Ok::<_, Error>(DetectorSlot {
                agent_type,
                name,
                capabilities,
                instance: Mutex::new(instance),
            })
        });

        let slots = join_all(pending).await.into_iter().collect::<Result<Vec<_>>>()?;
        info!(detectors = slots.len(), "orquestrador inicializado");

        Ok(Self {
            slots,
            policy: config.runtime.failure_policy,
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Quantidade de instâncias ativas
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pares (tipo, nome) na ordem de registro
    pub fn detectors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots
            .iter()
            .map(|slot| (slot.agent_type.as_str(), slot.name.as_str()))
    }

    /// Despacha uma transação para todas as instâncias com handler de transação
    pub async fn handle_transaction(&self, tx: &TransactionEvent) -> Result<DispatchOutcome> {
        self.dispatch(EventRef::Transaction(tx)).await
    }

    /// Despacha um bloco para todas as instâncias com handler de bloco
    pub async fn handle_block(&self, block: &BlockEvent) -> Result<DispatchOutcome> {
        self.dispatch(EventRef::Block(block)).await
    }

    async fn dispatch(&self, event: EventRef<'_>) -> Result<DispatchOutcome> {
        let kind = event.kind();
        let tasks = self
            .slots
            .iter()
            .filter(|slot| slot.supports(kind))
            .map(move |slot| async move {
                // serializa as chamadas de uma mesma instância
                let mut instance = slot.instance.lock().await;
                let result = match event {
                    EventRef::Transaction(tx) => instance.on_transaction(tx).await,
                    EventRef::Block(block) => instance.on_block(block).await,
                };
                (slot, result)
            });

        let mut outcome = DispatchOutcome::default();
        for (slot, result) in join_all(tasks).await {
            match result {
                Ok(findings) => outcome.findings.extend(findings),
                Err(error) => {
                    warn!(
                        agent_type = %slot.agent_type,
                        name = %slot.name,
                        event = ?kind,
                        error = %error,
                        "detector falhou"
                    );
                    match self.policy {
                        FailurePolicy::FailFast => {
                            return Err(Error::DetectorFailed {
                                agent_type: slot.agent_type.clone(),
                                name: slot.name.clone(),
                                source: Box::new(error),
                            });
                        }
                        FailurePolicy::Isolate => outcome.failures.push(DetectorFailure {
                            agent_type: slot.agent_type.clone(),
                            name: slot.name.clone(),
                            error,
                        }),
                    }
                }
            }
        }

        debug!(
            event = ?kind,
            findings = outcome.findings.len(),
            failures = outcome.failures.len(),
            "evento despachado"
        );
        Ok(outcome)
    }
}
