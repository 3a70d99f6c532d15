/*!
 * Ethernity Sentinel
 *
 * Orquestração de detectores on-chain. Cada detector recebe eventos de
 * transação e de bloco e produz alertas estruturados; o orquestrador inicializa
 * as instâncias configuradas, despacha os eventos de forma concorrente e agrega
 * os alertas em ordem determinística.
 */

pub mod abi;
pub mod config;
pub mod detectors;
pub mod logger;
pub mod orchestrator;
pub mod reader;
pub mod rolling_window;

// Re-exportações públicas
pub use abi::AbiRegistry;
pub use config::{AgentConfig, AgentSpec, FailurePolicy, RuntimeConfig, SentinelConfig};
pub use detectors::{
    AddressWatch, Capabilities, ContractVariableMonitor, Detector, GovernanceDetector, PassThrough,
    StatelessDetector,
};
pub use orchestrator::{DetectorFailure, DetectorRegistry, DispatchOutcome, EventKind, Orchestrator};
pub use reader::EthersContractReader;
pub use rolling_window::RollingWindow;
